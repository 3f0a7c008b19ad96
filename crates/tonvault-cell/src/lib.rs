//! TON cell and Bag of Cells (BoC) primitives for tonvault.
//!
//! Everything the transfer layer sends to the chain is a tree of cells:
//! up to 1023 bits of data plus up to 4 references per cell. This crate
//! provides the ordinary-cell subset a wallet needs:
//!
//! - [`Cell`] / [`CellBuilder`]: construction and repr-hashing
//! - [`BagOfCells`]: the standard serialization format (base64 helpers)
//! - [`TonAddress`]: raw and user-friendly address forms, keeping the
//!   bounceable/testnet flags of the user-friendly encoding
//! - [`payload`]: text comment payload cells
//!
//! Exotic cells (pruned branches, Merkle proofs, libraries) never appear in
//! wallet external messages and are rejected on deserialization.

use sha2::{Digest, Sha256};
use thiserror::Error;

mod address;
mod boc;
mod builder;
mod cell;
pub mod payload;

pub use address::TonAddress;
pub use boc::BagOfCells;
pub use builder::CellBuilder;
pub use cell::Cell;

/// Errors that can occur during cell or BoC operations.
#[derive(Debug, Error)]
pub enum CellError {
    /// The cell data exceeds the maximum of 1023 bits.
    #[error("cell data too long: {0} bits (max {MAX_CELL_BITS})")]
    DataTooLong(usize),

    /// The cell has too many references (max 4).
    #[error("too many cell references: {0} (max {MAX_CELL_REFS})")]
    TooManyRefs(usize),

    /// Integer wider than the requested bit width.
    #[error("invalid bit length: {0}")]
    InvalidBitLength(usize),

    /// Malformed BoC data.
    #[error("invalid BoC: {0}")]
    InvalidBoc(String),

    /// BoC contains an exotic cell, which this layer does not handle.
    #[error("exotic cell (type {0}) not supported")]
    ExoticCell(u8),

    /// CRC32-C checksum mismatch in a BoC.
    #[error("CRC32 mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// Ran out of input while parsing.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Expected a single root cell.
    #[error("expected single root, found {0}")]
    NotSingleRoot(usize),

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid base64 encoding.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
}

/// Result type for cell operations.
pub type CellResult<T> = Result<T, CellError>;

/// Maximum number of data bits in a cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can hold.
pub const MAX_CELL_REFS: usize = 4;

/// Magic number of the generic BoC format.
pub const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Compute SHA256 of the input.
pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// CRC32-C (Castagnoli), used as the BoC trailer checksum.
pub(crate) fn crc32c(data: &[u8]) -> u32 {
    const CRC32C: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);
    CRC32C.checksum(data)
}

/// CRC16-XMODEM, used by the user-friendly address encoding.
pub(crate) fn crc16_xmodem(data: &[u8]) -> u16 {
    const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);
    CRC16.checksum(data)
}
