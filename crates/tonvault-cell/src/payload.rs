//! Message payload helpers.

use std::sync::Arc;

use crate::{Cell, CellBuilder, CellResult};

/// Op code of a plain text comment payload.
const COMMENT_OP: u32 = 0;

/// Bytes of text that fit in the first comment cell after the 32-bit op.
const FIRST_CELL_CAPACITY: usize = 123;

/// Bytes of text that fit in each continuation cell.
const NEXT_CELL_CAPACITY: usize = 127;

/// Build a text comment payload cell (op 0 followed by UTF-8 bytes).
///
/// Long comments continue into a chain of child cells, one reference per
/// cell, in the standard snake format.
pub fn comment(text: &str) -> CellResult<Cell> {
    let bytes = text.as_bytes();
    let (head, rest) = bytes.split_at(bytes.len().min(FIRST_CELL_CAPACITY));

    let mut builder = CellBuilder::new();
    builder.store_u32(COMMENT_OP)?;
    builder.store_bytes(head)?;
    if !rest.is_empty() {
        builder.store_ref(Arc::new(snake_tail(rest)?))?;
    }
    builder.build()
}

fn snake_tail(bytes: &[u8]) -> CellResult<Cell> {
    let (head, rest) = bytes.split_at(bytes.len().min(NEXT_CELL_CAPACITY));

    let mut builder = CellBuilder::new();
    builder.store_bytes(head)?;
    if !rest.is_empty() {
        builder.store_ref(Arc::new(snake_tail(rest)?))?;
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_comment() {
        let cell = comment("Hello TON").unwrap();
        assert_eq!(cell.bit_len(), 32 + 9 * 8);
        assert_eq!(cell.reference_count(), 0);
        assert_eq!(&cell.data()[0..4], &[0, 0, 0, 0]);
        assert_eq!(&cell.data()[4..], b"Hello TON");
    }

    #[test]
    fn test_empty_comment() {
        let cell = comment("").unwrap();
        assert_eq!(cell.bit_len(), 32);
        assert_eq!(cell.reference_count(), 0);
    }

    #[test]
    fn test_long_comment_snakes() {
        let text = "x".repeat(400);
        let cell = comment(&text).unwrap();
        assert_eq!(cell.reference_count(), 1);

        // Walk the chain and reassemble.
        let mut collected = cell.data()[4..].to_vec();
        let mut node = cell.references().first().cloned();
        while let Some(cell) = node {
            collected.extend_from_slice(cell.data());
            node = cell.references().first().cloned();
        }
        assert_eq!(collected, text.as_bytes());
    }

    #[test]
    fn test_boundary_comment_fits_single_cell() {
        let text = "y".repeat(123);
        let cell = comment(&text).unwrap();
        assert_eq!(cell.reference_count(), 0);
        assert_eq!(cell.bit_len(), 32 + 123 * 8);
    }
}
