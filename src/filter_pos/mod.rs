// SPDX-License-Identifier: GPL-3.0-only

//! Filter position fields
//!
//! A filter position field maps every screen texel to the normalized
//! coordinate it samples from. Animating the field means repeatedly moving
//! the source positions toward a destination field.

mod buffers;
mod dump;
mod field;

pub use buffers::FilterPosBuffers;
pub use dump::{save_positions, write_positions};
pub use field::{
    FilterPosField, FilterPosParams, NormalizedCoords, check_dimensions, lerp_positions,
    sanitize_lerp_factor,
};
