//! ChaCha20-Poly1305 codec for quiz payloads

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use serde_json::json;
use sha2::Sha256;

use super::codec::{CipherError, EncryptionCodec};

const CIPHER_ID: &str = "chacha20-poly1305";
const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const KDF_SALT: &[u8] = b"livequiz-room-key";

/// Encrypts payloads under a per-room key derived from a master secret
pub struct ChaChaCodec {
    secret: Vec<u8>,
}

impl ChaChaCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    fn room_key(&self, key_context: &str) -> Result<[u8; KEY_SIZE], CipherError> {
        let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), &self.secret);
        let mut key = [0u8; KEY_SIZE];
        hk.expand(key_context.as_bytes(), &mut key)
            .map_err(|_| CipherError::KeyDerivation)?;
        Ok(key)
    }

    /// Reverses `encrypt`; clients hold the same derivation
    pub fn decrypt(
        &self,
        envelope: &serde_json::Value,
        key_context: &str,
    ) -> Result<Vec<u8>, CipherError> {
        let field = |name: &str| {
            envelope
                .get(name)
                .and_then(|v| v.as_str())
                .ok_or(CipherError::DecryptionFailed)
        };
        let version = field("v")?;
        let nonce = hex::decode(field("nonce")?).map_err(|_| CipherError::DecryptionFailed)?;
        let ciphertext = hex::decode(field("ct")?).map_err(|_| CipherError::DecryptionFailed)?;
        if nonce.len() != NONCE_SIZE {
            return Err(CipherError::DecryptionFailed);
        }

        let key = self.room_key(key_context)?;
        let cipher =
            ChaCha20Poly1305::new_from_slice(&key).map_err(|_| CipherError::KeyDerivation)?;
        cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: version.as_bytes(),
                },
            )
            .map_err(|_| CipherError::DecryptionFailed)
    }
}

impl EncryptionCodec for ChaChaCodec {
    fn supported(&self) -> &[&'static str] {
        &[CIPHER_ID]
    }

    fn encrypt(
        &self,
        version: &str,
        plaintext: &str,
        key_context: &str,
    ) -> Result<serde_json::Value, CipherError> {
        let key = self.room_key(key_context)?;
        let cipher =
            ChaCha20Poly1305::new_from_slice(&key).map_err(|_| CipherError::KeyDerivation)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce);

        // The version is bound as associated data so it cannot be swapped in transit
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: version.as_bytes(),
                },
            )
            .map_err(|_| CipherError::EncryptionFailed)?;

        Ok(json!({
            "v": version,
            "alg": CIPHER_ID,
            "nonce": hex::encode(nonce),
            "ct": hex::encode(ciphertext),
        }))
    }
}
