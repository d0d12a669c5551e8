//! Scalar range mapping and compact integer packing of vectors.
//!
//! [`pack_vec3`] squeezes a vector into a single `i32` by quantizing each axis
//! to one decimal place and storing it as a 10-bit field (offset by 512), so
//! every axis must lie in `-51.2..=51.1`.

use crate::{PoseError, Vec3};

const AXIS_OFFSET: i32 = 512;
const AXIS_SCALE: f32 = 10.0;
const FIELD: i32 = 1024;

/// Smallest value a packed axis can hold.
pub const PACK_MIN: f32 = -51.2;
/// Largest value a packed axis can hold.
pub const PACK_MAX: f32 = 51.1;

/// Linearly map `value` from `[from_lo, from_hi]` onto `[to_lo, to_hi]`.
///
/// Values outside the source range extrapolate.  Returns
/// [`PoseError::InvalidArgument`] for an empty source range.
pub fn remap(value: f32, from_lo: f32, from_hi: f32, to_lo: f32, to_hi: f32) -> Result<f32, PoseError> {
    let span = from_hi - from_lo;
    if span == 0.0 || !span.is_finite() {
        return Err(PoseError::InvalidArgument(format!(
            "empty source range [{from_lo}, {from_hi}]"
        )));
    }
    Ok((value - from_lo) / span * (to_hi - to_lo) + to_lo)
}

fn quantize(axis: &str, v: f32) -> Result<i32, PoseError> {
    let out_of_range = || {
        PoseError::InvalidArgument(format!(
            "{axis}={v} outside packable range [{PACK_MIN}, {PACK_MAX}]"
        ))
    };
    // Half a step of slack either side so values that round onto the limits pass.
    if !v.is_finite() || v < PACK_MIN - 0.05 || v > PACK_MAX + 0.05 {
        return Err(out_of_range());
    }
    let q = (v * AXIS_SCALE).round() as i32 + AXIS_OFFSET;
    if !(0..FIELD).contains(&q) {
        return Err(out_of_range());
    }
    Ok(q)
}

/// Pack `v` into one integer, one decimal of precision per axis.
pub fn pack_vec3(v: Vec3) -> Result<i32, PoseError> {
    let x = quantize("x", v.x)?;
    let y = quantize("y", v.y)?;
    let z = quantize("z", v.z)?;
    Ok(x + y * FIELD + z * FIELD * FIELD)
}

/// Inverse of [`pack_vec3`].
pub fn unpack_vec3(packed: i32) -> Vec3 {
    let z = packed / (FIELD * FIELD);
    let y = (packed - z * FIELD * FIELD) / FIELD;
    let x = packed - y * FIELD - z * FIELD * FIELD;
    let axis = |c: i32| (c - AXIS_OFFSET) as f32 / AXIS_SCALE;
    Vec3::new(axis(x), axis(y), axis(z))
}
