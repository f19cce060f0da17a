//! Result grid persistence in NumPy `.npy` format (version 1.0, `<f8`, C order).

use crate::domain::error::SweeptraderError;
use crate::domain::sweep::ResultGrid;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const MAGIC: &[u8] = b"\x93NUMPY";
const VERSION: [u8; 2] = [1, 0];
/// Magic, version and the u16 header length.
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;
const ALIGNMENT: usize = 64;

/// Header dictionary, space padded and newline terminated so that the data
/// starts on a 64-byte boundary.
pub fn npy_header(shape: &[usize]) -> Vec<u8> {
    let shape_str = match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter().map(usize::to_string).collect::<Vec<_>>().join(", ")
        ),
    };
    let mut dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': {shape_str}, }}");
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    dict.push_str(&" ".repeat(padding));
    dict.push('\n');

    let mut header = Vec::with_capacity(PREAMBLE_LEN + dict.len());
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&VERSION);
    header.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header
}

pub fn write_npy<W: Write>(mut writer: W, grid: &ResultGrid) -> Result<(), SweeptraderError> {
    writer.write_all(&npy_header(&grid.shape()))?;
    for value in &grid.values {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_npy(path: &Path, grid: &ResultGrid) -> Result<(), SweeptraderError> {
    let file = File::create(path)?;
    write_npy(BufWriter::new(file), grid)?;
    info!(path = %path.display(), cells = grid.len(), "result grid saved");
    Ok(())
}
