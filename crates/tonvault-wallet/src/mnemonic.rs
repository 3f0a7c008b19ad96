//! TON mnemonic phrases and key derivation.
//!
//! TON mnemonics use the BIP39 English wordlist but not the BIP39 checksum:
//! validity is defined by an HMAC/PBKDF2 check (the first entropy byte must
//! be zero), and the signing key is the first half of a PBKDF2-HMAC-SHA512
//! seed with the "TON default seed" salt.

use bip39::Language;
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::Sha512;

use crate::error::{WalletError, WalletResult};
use crate::keys::KeyPair;

/// PBKDF2 iterations for seed derivation.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt prefix for seed derivation.
const TON_SEED_SALT: &str = "TON default seed";

/// Salt for mnemonic validation.
const MNEMONIC_SALT: &str = "TON seed version";

/// A 24-word recovery phrase.
#[derive(Clone)]
pub struct Mnemonic {
    words: Vec<String>,
}

impl Mnemonic {
    /// Generate a random mnemonic that passes TON validation.
    ///
    /// Re-rolls until the basic-seed check passes (1 in 256 phrases do).
    pub fn generate() -> Self {
        loop {
            let mnemonic = Self::generate_unchecked();
            if mnemonic.is_valid_ton_mnemonic() {
                return mnemonic;
            }
        }
    }

    /// Generate random words without the TON validity check.
    pub fn generate_unchecked() -> Self {
        let wordlist = Language::English.words_by_prefix("");
        let mut rng = OsRng;
        let words = (0..24)
            .map(|_| wordlist[rng.gen_range(0..wordlist.len())].to_string())
            .collect();
        Self { words }
    }

    /// Parse a phrase, checking word count and wordlist membership.
    pub fn from_phrase(phrase: &str) -> WalletResult<Self> {
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        if words.len() != 24 {
            return Err(WalletError::WrongWordCount(words.len()));
        }
        for word in &words {
            let in_list = Language::English
                .words_by_prefix(word)
                .iter()
                .any(|candidate| *candidate == word);
            if !in_list {
                return Err(WalletError::InvalidWord(word.clone()));
            }
        }

        Ok(Self { words })
    }

    /// Parse a phrase and require the TON basic-seed check to pass.
    pub fn from_phrase_validated(phrase: &str) -> WalletResult<Self> {
        let mnemonic = Self::from_phrase(phrase)?;
        if !mnemonic.is_valid_ton_mnemonic() {
            return Err(WalletError::InvalidMnemonic(
                "mnemonic fails TON seed validation".to_string(),
            ));
        }
        Ok(mnemonic)
    }

    /// The words of this mnemonic.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Join back into a phrase.
    pub fn to_phrase(&self) -> String {
        self.words.join(" ")
    }

    /// Derive the 64-byte seed with PBKDF2-HMAC-SHA512.
    pub fn to_seed(&self, password: &str) -> [u8; 64] {
        let phrase = self.to_phrase();
        let salt = format!("{TON_SEED_SALT}{password}");

        let mut seed = [0u8; 64];
        pbkdf2::<Hmac<Sha512>>(
            phrase.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ITERATIONS,
            &mut seed,
        )
        .expect("output length is fixed");
        seed
    }

    /// Derive the signing keypair (no password).
    pub fn to_keypair(&self) -> KeyPair {
        self.to_keypair_with_password("")
    }

    /// Derive the signing keypair with a passphrase.
    pub fn to_keypair_with_password(&self, password: &str) -> KeyPair {
        let seed = self.to_seed(password);
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&seed[..32]);
        KeyPair::from_secret(secret)
    }

    /// TON basic-seed validation: the first byte of the PBKDF2 entropy with
    /// the "TON seed version" salt must be zero.
    pub fn is_valid_ton_mnemonic(&self) -> bool {
        let phrase = self.to_phrase();
        let mut entropy = [0u8; 64];

        pbkdf2::<Hmac<Sha512>>(
            phrase.as_bytes(),
            MNEMONIC_SALT.as_bytes(),
            PBKDF2_ITERATIONS / 256,
            &mut entropy,
        )
        .expect("output length is fixed");

        entropy[0] == 0
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &"[REDACTED]")
            .finish()
    }
}
