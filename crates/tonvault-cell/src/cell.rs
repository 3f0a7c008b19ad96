//! Ordinary TON cells with pre-computed repr hashes.

use std::sync::Arc;

use crate::{sha256, MAX_CELL_BITS, MAX_CELL_REFS};

/// Hash size in bytes.
pub const HASH_BYTES: usize = 32;

/// An ordinary TON cell: up to 1023 bits of data and up to 4 references.
///
/// Cells are immutable once built; the repr hash and depth are computed at
/// construction time. The hash identifies the cell together with its whole
/// subtree, which is what wallet contracts sign.
#[derive(Debug, Clone)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
    hash: [u8; HASH_BYTES],
    depth: u16,
}

impl Cell {
    /// Called by `CellBuilder::build()`; inputs are already validated.
    pub(crate) fn new(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Self {
        debug_assert!(bit_len <= MAX_CELL_BITS);
        debug_assert!(references.len() <= MAX_CELL_REFS);

        let depth = references
            .iter()
            .map(|r| r.depth.saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut cell = Cell {
            data,
            bit_len,
            references,
            hash: [0u8; HASH_BYTES],
            depth,
        };
        cell.hash = sha256(&cell.representation());
        cell
    }

    /// An empty cell.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, Vec::new())
    }

    /// The repr hash of this cell (SHA256 over the standard representation).
    pub fn hash(&self) -> [u8; HASH_BYTES] {
        self.hash
    }

    /// Tree depth: 0 for leaves, 1 + max child depth otherwise.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Raw data bytes (the final byte may be partial).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of data bits.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Child references.
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Number of child references.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Read a single data bit. Returns `None` past the end.
    pub fn get_bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        let byte = self.data[index / 8];
        Some((byte >> (7 - index % 8)) & 1 == 1)
    }

    /// Descriptor bytes (d1, d2) of the serialized form.
    ///
    /// d1 = refs_count (ordinary, level 0); d2 = ceil(bits/8) + floor(bits/8).
    pub fn descriptors(&self) -> (u8, u8) {
        let d1 = self.references.len() as u8;
        let d2 = ((self.bit_len + 7) / 8 + self.bit_len / 8) as u8;
        (d1, d2)
    }

    /// Data bytes with the completion tag applied.
    ///
    /// When the bit length is not byte-aligned, the bit after the last data
    /// bit is set to 1 and the remainder is zero.
    pub fn data_with_completion_tag(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = out.last_mut() {
                *last |= 1 << (7 - rem);
            }
        }
        out
    }

    /// The standard representation hashed to produce the repr hash:
    /// descriptors, completion-tagged data, child depths, child hashes.
    fn representation(&self) -> Vec<u8> {
        let mut repr =
            Vec::with_capacity(2 + self.data.len() + self.references.len() * (2 + HASH_BYTES));

        let (d1, d2) = self.descriptors();
        repr.push(d1);
        repr.push(d2);
        repr.extend_from_slice(&self.data_with_completion_tag());

        for r in &self.references {
            repr.extend_from_slice(&r.depth.to_be_bytes());
        }
        for r in &self.references {
            repr.extend_from_slice(&r.hash);
        }

        repr
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}
