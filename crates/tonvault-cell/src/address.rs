//! TON address handling.
//!
//! Two textual forms exist:
//!
//! - raw: `workchain:hex` (e.g. `0:abc1...`), carries no flags;
//! - user-friendly: 48-character base64 of tag + workchain + account id +
//!   CRC16, where the tag byte encodes the bounceable and testnet flags.
//!
//! The flags matter to the transfer layer: the bounce default for a recipient
//! depends on whether the literal address was written in the non-bounceable
//! form, so parsing keeps them instead of discarding the tag.

use crate::{crc16_xmodem, CellError, CellResult};

/// Tag byte of a bounceable user-friendly address.
const TAG_BOUNCEABLE: u8 = 0x11;
/// Tag byte of a non-bounceable user-friendly address.
const TAG_NON_BOUNCEABLE: u8 = 0x51;
/// Testnet-only bit, OR-ed into the tag.
const TAG_TESTNET: u8 = 0x80;

/// An internal TON address plus the display flags of the form it was
/// parsed from.
///
/// Equality and hashing cover only the on-chain identity (workchain and
/// account id); the flags describe how the address was written, not where
/// it points.
#[derive(Debug, Clone)]
pub struct TonAddress {
    /// Workchain id (-1 masterchain, 0 basechain).
    pub workchain: i32,
    /// 256-bit account id.
    pub hash_part: [u8; 32],
    /// False when parsed from the non-bounceable user-friendly form.
    pub bounceable: bool,
    /// True when parsed from a testnet-flagged user-friendly form.
    pub testnet: bool,
}

impl TonAddress {
    /// Create an address with default display flags (bounceable, mainnet).
    pub fn new(workchain: i32, hash_part: [u8; 32]) -> Self {
        TonAddress {
            workchain,
            hash_part,
            bounceable: true,
            testnet: false,
        }
    }

    /// Parse either textual form.
    pub fn parse(s: &str) -> CellResult<Self> {
        let s = s.trim();
        if let Some(colon) = s.find(':') {
            return Self::parse_raw(&s[..colon], &s[colon + 1..]);
        }
        if s.len() == 48 {
            return Self::parse_user_friendly(s);
        }
        Err(CellError::InvalidAddress(format!(
            "unrecognized address format: {s}"
        )))
    }

    fn parse_raw(workchain: &str, hash: &str) -> CellResult<Self> {
        let workchain: i32 = workchain
            .parse()
            .map_err(|_| CellError::InvalidAddress(format!("bad workchain: {workchain}")))?;

        if hash.len() != 64 {
            return Err(CellError::InvalidAddress(format!(
                "account id must be 64 hex characters, got {}",
                hash.len()
            )));
        }
        let bytes = hex::decode(hash)
            .map_err(|e| CellError::InvalidAddress(format!("bad account id hex: {e}")))?;
        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&bytes);

        Ok(TonAddress::new(workchain, hash_part))
    }

    fn parse_user_friendly(s: &str) -> CellResult<Self> {
        // Accept both URL-safe and standard alphabets.
        let normalized: String = s
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect();

        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            &normalized,
        )
        .map_err(|e| CellError::InvalidBase64(e.to_string()))?;

        if bytes.len() != 36 {
            return Err(CellError::InvalidAddress(format!(
                "user-friendly address must be 36 bytes, got {}",
                bytes.len()
            )));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        let actual = crc16_xmodem(&bytes[0..34]);
        if expected != actual {
            return Err(CellError::InvalidAddress(format!(
                "CRC16 mismatch: expected {expected:04x}, got {actual:04x}"
            )));
        }

        let tag = bytes[0];
        let testnet = tag & TAG_TESTNET != 0;
        let bounceable = match tag & !TAG_TESTNET {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(CellError::InvalidAddress(format!(
                    "unknown address tag 0x{other:02x}"
                )))
            }
        };

        let workchain = bytes[1] as i8 as i32;
        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&bytes[2..34]);

        Ok(TonAddress {
            workchain,
            hash_part,
            bounceable,
            testnet,
        })
    }

    /// Raw `workchain:hex` form. This is the key used for account lookups.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// User-friendly base64 form (URL-safe alphabet, no padding).
    pub fn to_user_friendly(&self, bounceable: bool) -> String {
        let mut data = Vec::with_capacity(36);
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if self.testnet {
            tag |= TAG_TESTNET;
        }
        data.push(tag);
        data.push(self.workchain as i8 as u8);
        data.extend_from_slice(&self.hash_part);
        let crc = crc16_xmodem(&data);
        data.extend_from_slice(&crc.to_be_bytes());

        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, data)
    }

    /// True for masterchain addresses.
    pub fn is_masterchain(&self) -> bool {
        self.workchain == -1
    }

    /// Return a copy with the given display flags.
    pub fn with_flags(mut self, bounceable: bool, testnet: bool) -> Self {
        self.bounceable = bounceable;
        self.testnet = testnet;
        self
    }
}

impl PartialEq for TonAddress {
    fn eq(&self, other: &Self) -> bool {
        self.workchain == other.workchain && self.hash_part == other.hash_part
    }
}

impl Eq for TonAddress {}

impl std::hash::Hash for TonAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.workchain.hash(state);
        self.hash_part.hash(state);
    }
}

impl std::fmt::Display for TonAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl std::str::FromStr for TonAddress {
    type Err = CellError;

    fn from_str(s: &str) -> CellResult<Self> {
        Self::parse(s)
    }
}
