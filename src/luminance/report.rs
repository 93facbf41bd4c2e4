// SPDX-License-Identifier: GPL-3.0-only

//! Plain-text luminance reports
//!
//! A header with the frame's average luminance and the exposure derived
//! from it, followed by every pixel with a channel over the cutoff.

use super::exposure::final_exposure;
use crate::constants::REPORT_CUTOFF;
use crate::errors::ExposureResult;
use crate::frame::HdrImage;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub fn write_luminance_report<W: Write>(
    image: &HdrImage,
    average_luminance: f32,
    key_value: f32,
    mut writer: W,
) -> ExposureResult<()> {
    let exposure = final_exposure(average_luminance, key_value);
    writeln!(writer, "average_luminance = {:.3}", average_luminance)?;
    writeln!(writer, "exposure          = {:.3}", exposure)?;
    writeln!(writer)?;

    for y in 0..image.height() {
        for x in 0..image.width() {
            let [r, g, b, a] = image.get(x, y);
            if r > REPORT_CUTOFF || g > REPORT_CUTOFF || b > REPORT_CUTOFF {
                writeln!(
                    writer,
                    "[{:4} {:4}]  {:8.3}, {:8.3}, {:8.3}, {:8.3}",
                    x, y, r, g, b, a
                )?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn save_luminance_report(
    image: &HdrImage,
    average_luminance: f32,
    key_value: f32,
    path: &Path,
) -> ExposureResult<()> {
    let file = std::fs::File::create(path)?;
    write_luminance_report(
        image,
        average_luminance,
        key_value,
        std::io::BufWriter::new(file),
    )?;
    info!(path = %path.display(), average_luminance, "Saved luminance report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_bright_pixels() {
        let pixels = vec![
            [0.5, 0.5, 0.5, 1.0],
            [2.0, 0.25, 0.5, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 3.5, 0.5],
        ];
        let image = HdrImage::new(2, 2, pixels).unwrap();
        let mut out = Vec::new();
        write_luminance_report(&image, 0.5, 0.5, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "average_luminance = 0.500");
        assert!(lines[1].starts_with("exposure          = 1.000"));
        assert_eq!(lines[2], "");
        // Exactly 1.0 is not over the cutoff
        assert_eq!(
            &lines[3..],
            [
                "[   1    0]     2.000,    0.250,    0.500,    1.000",
                "[   1    1]     0.000,    0.000,    3.500,    0.500",
            ]
        );
    }

    #[test]
    fn test_dark_frame_has_header_only() {
        let image = HdrImage::filled(8, 8, [0.1, 0.1, 0.1, 1.0]);
        let mut out = Vec::new();
        write_luminance_report(&image, 0.1, 0.18, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    }
}
