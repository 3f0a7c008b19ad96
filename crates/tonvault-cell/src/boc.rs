//! Bag of Cells serialization.
//!
//! Only the generic format (`0xb5ee9c72`) is produced and accepted, which is
//! what wallet tooling and the HTTP APIs exchange. Cells are emitted
//! parents-first so every reference points to a higher index.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{crc32c, Cell, CellError, CellResult, BOC_GENERIC_MAGIC, MAX_CELL_REFS};

/// A serialized collection of cells with shared-subtree deduplication.
#[derive(Debug, Clone)]
pub struct BagOfCells {
    roots: Vec<Arc<Cell>>,
}

impl BagOfCells {
    /// Create a BoC with the given roots.
    pub fn new(roots: Vec<Arc<Cell>>) -> Self {
        BagOfCells { roots }
    }

    /// Create a BoC with a single root.
    pub fn from_root(root: Cell) -> Self {
        BagOfCells {
            roots: vec![Arc::new(root)],
        }
    }

    /// All root cells.
    pub fn roots(&self) -> &[Arc<Cell>] {
        &self.roots
    }

    /// The single root, or an error when there is not exactly one.
    pub fn single_root(&self) -> CellResult<&Arc<Cell>> {
        if self.roots.len() != 1 {
            return Err(CellError::NotSingleRoot(self.roots.len()));
        }
        Ok(&self.roots[0])
    }

    /// Serialize with a CRC32-C trailer.
    pub fn serialize(&self) -> CellResult<Vec<u8>> {
        if self.roots.is_empty() {
            return Err(CellError::InvalidBoc("no root cells".to_string()));
        }

        let cells = self.collect_cells();
        let index: HashMap<[u8; 32], usize> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.hash(), i))
            .collect();

        let size_bytes = bytes_needed(cells.len());
        let mut cell_data: Vec<Vec<u8>> = Vec::with_capacity(cells.len());
        let mut total_size = 0usize;
        for cell in &cells {
            let mut out = Vec::new();
            let (d1, d2) = cell.descriptors();
            out.push(d1);
            out.push(d2);
            out.extend_from_slice(&cell.data_with_completion_tag());
            for r in cell.references() {
                // Present by construction of `index`.
                let idx = index[&r.hash()];
                write_uint(&mut out, idx as u64, size_bytes);
            }
            total_size += out.len();
            cell_data.push(out);
        }

        let off_bytes = bytes_needed(total_size);

        let mut result = Vec::new();
        result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());
        // flags: has_crc (bit 6) | size_bytes (bits 2-0)
        result.push(0x40 | size_bytes as u8);
        result.push(off_bytes as u8);
        write_uint(&mut result, cells.len() as u64, size_bytes);
        write_uint(&mut result, self.roots.len() as u64, size_bytes);
        write_uint(&mut result, 0, size_bytes); // absent count
        write_uint(&mut result, total_size as u64, off_bytes);
        for root in &self.roots {
            write_uint(&mut result, index[&root.hash()] as u64, size_bytes);
        }
        for data in cell_data {
            result.extend_from_slice(&data);
        }

        let crc = crc32c(&result);
        result.extend_from_slice(&crc.to_le_bytes());
        Ok(result)
    }

    /// Serialize to a base64 string, the form the HTTP APIs accept.
    pub fn serialize_to_base64(&self) -> CellResult<String> {
        let bytes = self.serialize()?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            bytes,
        ))
    }

    /// Deserialize a generic-format BoC.
    pub fn deserialize(data: &[u8]) -> CellResult<Self> {
        if data.len() < 7 {
            return Err(CellError::UnexpectedEof);
        }

        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != BOC_GENERIC_MAGIC {
            return Err(CellError::InvalidBoc(format!(
                "unknown magic 0x{magic:08x}"
            )));
        }

        let flags = data[4];
        let has_idx = flags & 0x80 != 0;
        let has_crc = flags & 0x40 != 0;
        let size_bytes = (flags & 0x07) as usize;
        let off_bytes = data[5] as usize;
        if size_bytes == 0 || size_bytes > 8 || off_bytes == 0 || off_bytes > 8 {
            return Err(CellError::InvalidBoc("bad size parameters".to_string()));
        }

        let end = if has_crc {
            if data.len() < 11 {
                return Err(CellError::UnexpectedEof);
            }
            let body_end = data.len() - 4;
            let expected = u32::from_le_bytes([
                data[body_end],
                data[body_end + 1],
                data[body_end + 2],
                data[body_end + 3],
            ]);
            let actual = crc32c(&data[..body_end]);
            if expected != actual {
                return Err(CellError::CrcMismatch { expected, actual });
            }
            body_end
        } else {
            data.len()
        };

        let mut offset = 6;
        let cell_count = read_uint(data, &mut offset, size_bytes)? as usize;
        let root_count = read_uint(data, &mut offset, size_bytes)? as usize;
        let _absent = read_uint(data, &mut offset, size_bytes)?;
        let total_size = read_uint(data, &mut offset, off_bytes)? as usize;

        let mut root_indices = Vec::with_capacity(root_count);
        for _ in 0..root_count {
            root_indices.push(read_uint(data, &mut offset, size_bytes)? as usize);
        }

        if has_idx {
            offset = offset
                .checked_add(cell_count * off_bytes)
                .ok_or(CellError::UnexpectedEof)?;
        }

        let data_end = offset
            .checked_add(total_size)
            .ok_or(CellError::UnexpectedEof)?;
        if data_end > end {
            return Err(CellError::UnexpectedEof);
        }
        let cells_data = &data[offset..data_end];

        let cells = parse_cells(cells_data, cell_count, size_bytes)?;

        let roots = root_indices
            .iter()
            .map(|&idx| {
                cells
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| CellError::InvalidBoc(format!("root index {idx} out of range")))
            })
            .collect::<CellResult<Vec<_>>>()?;

        Ok(BagOfCells { roots })
    }

    /// Deserialize from a base64 string.
    pub fn deserialize_from_base64(b64: &str) -> CellResult<Self> {
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            b64.trim(),
        )
        .map_err(|e| CellError::InvalidBase64(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// All cells, parents before children, shared subtrees stored once.
    fn collect_cells(&self) -> Vec<Arc<Cell>> {
        let mut post_order: Vec<Arc<Cell>> = Vec::new();
        let mut seen: HashMap<[u8; 32], ()> = HashMap::new();

        fn visit(
            cell: &Arc<Cell>,
            out: &mut Vec<Arc<Cell>>,
            seen: &mut HashMap<[u8; 32], ()>,
        ) {
            if seen.contains_key(&cell.hash()) {
                return;
            }
            for r in cell.references() {
                visit(r, out, seen);
            }
            seen.insert(cell.hash(), ());
            out.push(cell.clone());
        }

        for root in &self.roots {
            visit(root, &mut post_order, &mut seen);
        }

        // Post-order puts every cell after its descendants; reversing yields
        // the forward-reference order the generic format requires.
        post_order.reverse();
        post_order
    }
}

/// Parse serialized cells; references must point to higher indices.
fn parse_cells(data: &[u8], cell_count: usize, size_bytes: usize) -> CellResult<Vec<Arc<Cell>>> {
    struct RawCell {
        data: Vec<u8>,
        bit_len: usize,
        ref_indices: Vec<usize>,
    }

    let mut raw: Vec<RawCell> = Vec::with_capacity(cell_count);
    let mut offset = 0usize;

    for i in 0..cell_count {
        if offset + 2 > data.len() {
            return Err(CellError::UnexpectedEof);
        }
        let d1 = data[offset];
        let d2 = data[offset + 1];
        offset += 2;

        let refs_count = (d1 & 0x07) as usize;
        if refs_count > MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(refs_count));
        }
        if d1 & 0x08 != 0 {
            let cell_type = data.get(offset).copied().unwrap_or(0);
            return Err(CellError::ExoticCell(cell_type));
        }

        let byte_len = (d2 as usize + 1) / 2;
        if offset + byte_len > data.len() {
            return Err(CellError::UnexpectedEof);
        }
        let mut cell_bytes = data[offset..offset + byte_len].to_vec();
        offset += byte_len;

        // Even d2: byte-aligned; odd d2: strip the completion tag.
        let bit_len = if d2 % 2 == 0 {
            (d2 as usize) * 4
        } else {
            let last = *cell_bytes
                .last()
                .ok_or(CellError::UnexpectedEof)?;
            let tag_pos = last.trailing_zeros() as usize;
            if tag_pos >= 8 {
                return Err(CellError::InvalidBoc("empty completion tag".to_string()));
            }
            if let Some(b) = cell_bytes.last_mut() {
                *b &= !(1 << tag_pos);
            }
            byte_len * 8 - tag_pos - 1
        };

        let mut ref_indices = Vec::with_capacity(refs_count);
        for _ in 0..refs_count {
            let idx = read_uint(data, &mut offset, size_bytes)? as usize;
            if idx <= i || idx >= cell_count {
                return Err(CellError::InvalidBoc(format!(
                    "reference {idx} from cell {i} is not forward"
                )));
            }
            ref_indices.push(idx);
        }

        raw.push(RawCell {
            data: cell_bytes,
            bit_len,
            ref_indices,
        });
    }

    // Build back-to-front so references are always resolved.
    let mut cells: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for i in (0..cell_count).rev() {
        let rc = &raw[i];
        let refs = rc
            .ref_indices
            .iter()
            .map(|&idx| {
                cells[idx]
                    .clone()
                    .ok_or_else(|| CellError::InvalidBoc(format!("unresolved reference {idx}")))
            })
            .collect::<CellResult<Vec<_>>>()?;
        cells[i] = Some(Arc::new(Cell::new(rc.data.clone(), rc.bit_len, refs)));
    }

    Ok(cells.into_iter().flatten().collect())
}

fn bytes_needed(value: usize) -> usize {
    let mut n = 1;
    let mut v = value >> 8;
    while v > 0 {
        n += 1;
        v >>= 8;
    }
    n
}

fn write_uint(out: &mut Vec<u8>, value: u64, bytes: usize) {
    for i in (0..bytes).rev() {
        out.push((value >> (i * 8)) as u8);
    }
}

fn read_uint(data: &[u8], offset: &mut usize, bytes: usize) -> CellResult<u64> {
    if *offset + bytes > data.len() {
        return Err(CellError::UnexpectedEof);
    }
    let mut value = 0u64;
    for _ in 0..bytes {
        value = (value << 8) | data[*offset] as u64;
        *offset += 1;
    }
    Ok(value)
}
