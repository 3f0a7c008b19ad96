//! Ed25519 keys used for wallet message signing.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{WalletError, WalletResult};

/// An Ed25519 keypair. The secret seed is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    /// 32-byte secret seed.
    secret: [u8; 32],
    /// 32-byte public key (not secret, skip zeroize).
    #[zeroize(skip)]
    pub public_key: [u8; 32],
    /// Internal signing key; the seed above holds the same secret and is
    /// the one that gets zeroized.
    #[zeroize(skip)]
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a random keypair from the OS RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Build a keypair from a 32-byte secret seed.
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&secret))
    }

    /// Build a keypair from a byte slice; must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() != 32 {
            return Err(WalletError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut secret = [0u8; 32];
        secret.copy_from_slice(bytes);
        Ok(Self::from_secret(secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let secret = signing_key.to_bytes();
        let public_key = signing_key.verifying_key().to_bytes();
        Self {
            secret,
            public_key,
            signing_key,
        }
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex_fmt(&self.public_key))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn hex_fmt(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
