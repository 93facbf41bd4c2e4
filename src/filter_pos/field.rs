// SPDX-License-Identifier: GPL-3.0-only

//! Filter position fields and the CPU interpolation kernel

use crate::constants::{FILTER_POS_COORD_WIDTH, FILTER_POS_MIN_COORD, WORKGROUP_DIM};
use crate::errors::{ExposureError, ExposureResult};
use rayon::prelude::*;

/// Uniform parameters of the filter position pass
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FilterPosParams {
    pub width: u32,
    pub height: u32,
    pub lerp_factor: f32,
    pub _padding: u32,
}

impl FilterPosParams {
    pub fn new(width: u32, height: u32, lerp_factor: f32) -> Self {
        Self {
            width,
            height,
            lerp_factor: sanitize_lerp_factor(lerp_factor),
            _padding: 0,
        }
    }
}

/// Conversion between screen texels and normalized filter coordinates
///
/// Both axes use the width ratio so the coordinate space stays square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedCoords {
    ratio: f32,
}

impl NormalizedCoords {
    pub fn new(width: u32) -> Self {
        Self {
            ratio: FILTER_POS_COORD_WIDTH / width.max(1) as f32,
        }
    }

    /// Normalized coordinate of a (possibly fractional) screen position
    pub fn to_normalized(&self, x: f32, y: f32) -> [f32; 2] {
        [
            FILTER_POS_MIN_COORD + self.ratio * x,
            FILTER_POS_MIN_COORD + self.ratio * y,
        ]
    }

    pub fn to_screen(&self, pos: [f32; 2]) -> [f32; 2] {
        [
            (pos[0] - FILTER_POS_MIN_COORD) / self.ratio,
            (pos[1] - FILTER_POS_MIN_COORD) / self.ratio,
        ]
    }
}

/// Per-texel 2D source positions of the displacement filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPosField {
    pub width: u32,
    pub height: u32,
    pub positions: Vec<[f32; 2]>,
}

impl FilterPosField {
    pub fn new(width: u32, height: u32, positions: Vec<[f32; 2]>) -> ExposureResult<Self> {
        let expected = width as usize * height as usize;
        if positions.len() != expected {
            return Err(ExposureError::InvalidInput(format!(
                "{}x{} position field needs {} entries, got {}",
                width,
                height,
                expected,
                positions.len()
            )));
        }
        Ok(Self {
            width,
            height,
            positions,
        })
    }

    /// Every texel points at its own center
    pub fn identity(width: u32, height: u32) -> Self {
        let coords = NormalizedCoords::new(width);
        let positions = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| coords.to_normalized(x as f32 + 0.5, y as f32 + 0.5))
            })
            .collect();
        Self {
            width,
            height,
            positions,
        }
    }

    /// Copy with every position multiplied by `factor` (a zoom about the origin)
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            positions: self
                .positions
                .iter()
                .map(|p| [p[0] * factor, p[1] * factor])
                .collect(),
        }
    }

    pub fn same_dimensions(&self, other: &FilterPosField) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [f32; 2] {
        self.positions[y as usize * self.width as usize + x as usize]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}

/// Clamp to [0, 1]; NaN and infinities become 0 and leave the field unchanged
#[inline]
pub fn sanitize_lerp_factor(lerp_factor: f32) -> f32 {
    if lerp_factor.is_finite() {
        lerp_factor.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fail unless `srce` and `dest` cover the same texels
pub fn check_dimensions(srce: &FilterPosField, dest: &FilterPosField) -> ExposureResult<()> {
    if !srce.same_dimensions(dest) {
        return Err(ExposureError::InvalidInput(format!(
            "source field is {}x{} but destination is {}x{}",
            srce.width, srce.height, dest.width, dest.height
        )));
    }
    Ok(())
}

/// Move every source position `lerp_factor` of the way toward its destination
pub fn lerp_positions(
    srce: &mut FilterPosField,
    dest: &FilterPosField,
    lerp_factor: f32,
) -> ExposureResult<()> {
    check_dimensions(srce, dest)?;
    let t = sanitize_lerp_factor(lerp_factor);

    // Rows of one workgroup height per task
    let chunk = (srce.width as usize * WORKGROUP_DIM as usize).max(1);
    srce.positions
        .par_chunks_mut(chunk)
        .zip(dest.positions.par_chunks(chunk))
        .for_each(|(srce_rows, dest_rows)| {
            for (s, d) in srce_rows.iter_mut().zip(dest_rows) {
                s[0] += t * (d[0] - s[0]);
                s[1] += t * (d[1] - s[1]);
            }
        });

    Ok(())
}
