//! WireGuard key pairs

use base64::prelude::*;
use rand::rngs::OsRng;
use tracing::debug;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{Error, Result};

/// Length of a decoded Curve25519 key.
pub const KEY_LEN: usize = 32;

/// A base64 private/public key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private: String,
    pub public: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("private", &"[redacted]")
            .field("public", &self.public)
            .finish()
    }
}

/// Source of new key pairs.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Result<KeyPair>;
}

/// X25519 key generation from the OS random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct X25519Generator;

impl KeyGenerator for X25519Generator {
    fn generate(&self) -> Result<KeyPair> {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        debug!("generated x25519 key pair");
        Ok(KeyPair {
            private: BASE64_STANDARD.encode(secret.to_bytes()),
            public: BASE64_STANDARD.encode(public.as_bytes()),
        })
    }
}

/// True when `key` is standard base64 of exactly 32 bytes.
pub fn is_valid_key(key: &str) -> bool {
    decode_key(key).is_some()
}

/// Public key belonging to a base64 private key.
pub fn derive_public_key(private_key: &str) -> Result<String> {
    let bytes = decode_key(private_key)
        .ok_or_else(|| Error::validation("private key is not base64 of 32 bytes"))?;
    let secret = StaticSecret::from(bytes);
    Ok(BASE64_STANDARD.encode(PublicKey::from(&secret).as_bytes()))
}

fn decode_key(key: &str) -> Option<[u8; KEY_LEN]> {
    let decoded = BASE64_STANDARD.decode(key.trim()).ok()?;
    decoded.try_into().ok()
}
