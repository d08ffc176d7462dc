// Public API - what other modules can use
pub use chacha::ChaChaCodec;
pub use codec::{build_codec, CipherError, CodecKind, EncryptionCodec, NoopCodec, PAYLOAD_VERSION};

// Internal modules
mod chacha;
mod codec;
