//! Numeric reconstruction of simply packed data fields.
//!
//! Data Representation Template 5.0 stores each value as a W-bit unsigned
//! integer I; the physical value is `(I * 2^E + R) * 10^-D` where R is the
//! reference value, E the binary scale factor, and D the decimal scale
//! factor. The evaluation order matters for bit-for-bit reproducibility
//! against reference encoders.

use crate::bits;
use crate::error::Grib2Result;
use crate::sections::DrtInstance;

/// Unpack `ndpts` values packed with the simple packing scheme.
///
/// With a bit width of zero the field is constant: every value equals the
/// reference value and no packed data follows. Allocation failure for the
/// intermediate integer buffer surfaces as [`crate::Grib2Error::Allocation`]
/// rather than a truncated result.
pub fn unpack_simple(packed: &[u8], drt: &DrtInstance, ndpts: usize) -> Grib2Result<Vec<f32>> {
    let reference = drt.reference_value();
    let bscale = 2.0f32.powi(drt.binary_scale_factor());
    let dscale = 10.0f32.powi(-drt.decimal_scale_factor());
    let nbits = drt.bits_per_value();

    let mut field = Vec::new();
    field.try_reserve_exact(ndpts)?;

    if nbits == 0 {
        field.resize(ndpts, reference);
        return Ok(field);
    }

    let packed_ints = bits::read_uints(packed, 0, nbits, ndpts)?;
    for value in packed_ints {
        field.push((value as f32 * bscale + reference) * dscale);
    }

    Ok(field)
}
