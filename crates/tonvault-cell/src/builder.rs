//! Builder for constructing cells bit by bit.

use std::sync::Arc;

use crate::{Cell, CellError, CellResult, TonAddress, MAX_CELL_BITS, MAX_CELL_REFS};

/// Builder for [`Cell`]s.
///
/// # Example
///
/// ```
/// use tonvault_cell::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_coins(1_000_000_000).unwrap();
/// let cell = builder.build().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        CellBuilder {
            data: Vec::with_capacity(128),
            bit_len: 0,
            references: Vec::new(),
        }
    }

    /// Store a single bit.
    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        if self.bit_len >= MAX_CELL_BITS {
            return Err(CellError::DataTooLong(self.bit_len + 1));
        }

        let byte_index = self.bit_len / 8;
        if byte_index >= self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte_index] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Store a slice of bits.
    pub fn store_bits(&mut self, bits: &[bool]) -> CellResult<&mut Self> {
        for &bit in bits {
            self.store_bit(bit)?;
        }
        Ok(self)
    }

    /// Store an unsigned integer of the given bit width, big-endian.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        if self.bit_len + bits > MAX_CELL_BITS {
            return Err(CellError::DataTooLong(self.bit_len + bits));
        }
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1)?;
        }
        Ok(self)
    }

    /// Store a signed integer (two's complement, big-endian).
    pub fn store_int(&mut self, value: i64, bits: usize) -> CellResult<&mut Self> {
        self.store_uint(value as u64 & mask(bits), bits)
    }

    /// Store an unsigned 8-bit integer.
    pub fn store_u8(&mut self, value: u8) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 8)
    }

    /// Store an unsigned 32-bit integer.
    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 32)
    }

    /// Store an unsigned 64-bit integer.
    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_uint(value, 64)
    }

    /// Store a signed 32-bit integer.
    pub fn store_i32(&mut self, value: i32) -> CellResult<&mut Self> {
        self.store_int(value as i64, 32)
    }

    /// Store raw bytes.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        for &byte in bytes {
            self.store_u8(byte)?;
        }
        Ok(self)
    }

    /// Store a nanoton amount as VarUInteger 16: a 4-bit byte count followed
    /// by the value in that many big-endian bytes.
    pub fn store_coins(&mut self, nanotons: u128) -> CellResult<&mut Self> {
        if nanotons == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = ((128 - nanotons.leading_zeros() as usize) + 7) / 8;
        if byte_len > 15 {
            return Err(CellError::DataTooLong(byte_len * 8 + 4));
        }

        self.store_uint(byte_len as u64, 4)?;
        for i in (0..byte_len).rev() {
            self.store_u8((nanotons >> (i * 8)) as u8)?;
        }
        Ok(self)
    }

    /// Store an internal address as addr_std$10 (no anycast).
    pub fn store_address(&mut self, addr: &TonAddress) -> CellResult<&mut Self> {
        self.store_uint(0b10, 2)?;
        self.store_bit(false)?; // no anycast
        self.store_int(addr.workchain as i64, 8)?;
        self.store_bytes(&addr.hash_part)
    }

    /// Store addr_none$00.
    pub fn store_address_none(&mut self) -> CellResult<&mut Self> {
        self.store_uint(0b00, 2)
    }

    /// Store a reference to a child cell.
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(self.references.len() + 1));
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Number of data bits stored so far.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Bits still available.
    pub fn bits_left(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    /// References still available.
    pub fn refs_left(&self) -> usize {
        MAX_CELL_REFS - self.references.len()
    }

    /// Finalize into a cell.
    pub fn build(self) -> CellResult<Cell> {
        Ok(Cell::new(self.data, self.bit_len, self.references))
    }
}

fn mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_bits() {
        let mut b = CellBuilder::new();
        b.store_bit(true).unwrap();
        b.store_bit(false).unwrap();
        b.store_bit(true).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 3);
        assert_eq!(cell.data(), &[0b1010_0000]);
    }

    #[test]
    fn test_store_u32_bytes() {
        let mut b = CellBuilder::new();
        b.store_u32(0x1234_5678).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.data(), &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_store_negative_int() {
        let mut b = CellBuilder::new();
        b.store_int(-1, 8).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.data(), &[0xFF]);
    }

    #[test]
    fn test_store_coins_zero() {
        let mut b = CellBuilder::new();
        b.store_coins(0).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 4);
        assert_eq!(cell.data(), &[0x00]);
    }

    #[test]
    fn test_store_coins_one_ton() {
        // 1_000_000_000 = 0x3B9ACA00, 4 bytes: nibble 4 then the value.
        let mut b = CellBuilder::new();
        b.store_coins(1_000_000_000).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 4 + 32);
        assert_eq!(cell.data(), &[0x43, 0xB9, 0xAC, 0xA0, 0x00]);
    }

    #[test]
    fn test_store_address_roundtrip_bits() {
        let addr = TonAddress::new(0, [0xAB; 32]);
        let mut b = CellBuilder::new();
        b.store_address(&addr).unwrap();
        let cell = b.build().unwrap();
        // 2 tag bits + 1 anycast + 8 workchain + 256 hash
        assert_eq!(cell.bit_len(), 267);
        assert_eq!(cell.get_bit(0), Some(true));
        assert_eq!(cell.get_bit(1), Some(false));
        assert_eq!(cell.get_bit(2), Some(false));
    }

    #[test]
    fn test_ref_limit() {
        let inner = Arc::new(CellBuilder::new().build().unwrap());
        let mut b = CellBuilder::new();
        for _ in 0..4 {
            b.store_ref(inner.clone()).unwrap();
        }
        assert!(b.store_ref(inner).is_err());
    }

    #[test]
    fn test_bit_limit() {
        let mut b = CellBuilder::new();
        for _ in 0..127 {
            b.store_u8(0xFF).unwrap();
        }
        for _ in 0..7 {
            b.store_bit(true).unwrap();
        }
        assert_eq!(b.bits_left(), 0);
        assert!(b.store_bit(true).is_err());
    }
}
