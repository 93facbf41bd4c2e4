// SPDX-License-Identifier: GPL-3.0-only

//! Plain-text dumps of position fields for offline inspection

use super::field::FilterPosField;
use crate::errors::ExposureResult;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One line per texel: `[   x    y]  px, py`
pub fn write_positions<W: Write>(field: &FilterPosField, mut writer: W) -> ExposureResult<()> {
    for y in 0..field.height {
        for x in 0..field.width {
            let pos = field.get(x, y);
            writeln!(writer, "[{:4} {:4}]  {:6.2}, {:6.2}", x, y, pos[0], pos[1])?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn save_positions(field: &FilterPosField, path: &Path) -> ExposureResult<()> {
    let file = std::fs::File::create(path)?;
    write_positions(field, std::io::BufWriter::new(file))?;
    info!(
        path = %path.display(),
        width = field.width,
        height = field.height,
        "Saved filter positions"
    );
    Ok(())
}
