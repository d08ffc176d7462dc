use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use super::chacha::ChaChaCodec;

/// Payload format version passed to codecs when encrypting quizzes
pub const PAYLOAD_VERSION: &str = "v1";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CipherError {
    #[error("Missing cipher secret for {0}")]
    MissingSecret(CodecKind),

    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed")]
    DecryptionFailed,
}

/// Codec selected once at startup from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum CodecKind {
    #[strum(serialize = "none")]
    Noop,
    #[strum(serialize = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

/// Pluggable encryption for outbound quiz payloads
pub trait EncryptionCodec: Send + Sync {
    /// Cipher identifiers a room may request
    fn supported(&self) -> &[&'static str];

    fn supports(&self, mode: &str) -> bool {
        self.supported().contains(&mode)
    }

    /// Encrypts `plaintext` for the room identified by `key_context`
    fn encrypt(
        &self,
        version: &str,
        plaintext: &str,
        key_context: &str,
    ) -> Result<serde_json::Value, CipherError>;
}

/// Fallback codec: supports no cipher and passes payloads through
pub struct NoopCodec;

impl EncryptionCodec for NoopCodec {
    fn supported(&self) -> &[&'static str] {
        &[]
    }

    fn encrypt(
        &self,
        _version: &str,
        plaintext: &str,
        _key_context: &str,
    ) -> Result<serde_json::Value, CipherError> {
        Ok(serde_json::Value::String(plaintext.to_string()))
    }
}

pub fn build_codec(
    kind: CodecKind,
    secret: Option<&str>,
) -> Result<Arc<dyn EncryptionCodec>, CipherError> {
    match kind {
        CodecKind::Noop => Ok(Arc::new(NoopCodec)),
        CodecKind::ChaCha20Poly1305 => {
            let secret = secret
                .filter(|s| !s.is_empty())
                .ok_or(CipherError::MissingSecret(kind))?;
            Ok(Arc::new(ChaChaCodec::new(secret.as_bytes())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_codec_kind_parses_config_names() {
        assert_eq!(CodecKind::from_str("none").unwrap(), CodecKind::Noop);
        assert_eq!(
            CodecKind::from_str("chacha20-poly1305").unwrap(),
            CodecKind::ChaCha20Poly1305
        );
        assert!(CodecKind::from_str("rot13").is_err());
    }

    #[test]
    fn test_noop_supports_nothing() {
        let codec = NoopCodec;
        assert!(!codec.supports("chacha20-poly1305"));
        assert_eq!(
            codec.encrypt(PAYLOAD_VERSION, "{}", "room").unwrap(),
            serde_json::Value::String("{}".to_string())
        );
    }

    #[test]
    fn test_build_codec_requires_secret() {
        assert!(build_codec(CodecKind::Noop, None).is_ok());
        assert_eq!(
            build_codec(CodecKind::ChaCha20Poly1305, Some("")).err(),
            Some(CipherError::MissingSecret(CodecKind::ChaCha20Poly1305))
        );

        let codec = build_codec(CodecKind::ChaCha20Poly1305, Some("secret")).unwrap();
        assert!(codec.supports("chacha20-poly1305"));
    }
}
