//! Bit-level read/write engine.
//!
//! GRIB2 packs numeric fields at arbitrary bit widths with no alignment
//! guarantees, so every section codec in this crate goes through this module
//! to cross the byte/bit boundary. Fields are big-endian: the first bit read
//! is the most significant bit of the result.

use crate::error::{Grib2Error, Grib2Result};

/// Supported field widths, in bits.
pub const MIN_WIDTH: u32 = 1;
/// Supported field widths, in bits.
pub const MAX_WIDTH: u32 = 32;

fn check_range(buf: &[u8], bit_offset: usize, width: u32) -> Grib2Result<()> {
    if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
        return Err(Grib2Error::BitWidth(width));
    }
    if bit_offset + width as usize > buf.len() * 8 {
        return Err(Grib2Error::BufferOverrun {
            offset: bit_offset,
            width: width as usize,
            len: buf.len(),
        });
    }
    Ok(())
}

/// Read a `width`-bit big-endian unsigned integer starting at `bit_offset`.
///
/// The field may start at any bit position and may span byte boundaries.
pub fn read_uint(buf: &[u8], bit_offset: usize, width: u32) -> Grib2Result<u32> {
    check_range(buf, bit_offset, width)?;

    let mut result = 0u32;
    for i in 0..width as usize {
        let absolute_bit = bit_offset + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8); // MSB first

        let bit = (buf[byte_idx] >> bit_idx) & 1;
        result = (result << 1) | u32::from(bit);
    }

    Ok(result)
}

/// Read `count` consecutive `width`-bit fields starting at `bit_offset`.
///
/// This is the vectorized form used when unpacking dense arrays such as
/// bit-maps (one flag per grid point) or packed data values. The fields are
/// contiguous: field `j` occupies bits `[bit_offset + j*width, ..+width)`.
pub fn read_uints(buf: &[u8], bit_offset: usize, width: u32, count: usize) -> Grib2Result<Vec<u32>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    // Validate the whole run up front so a short buffer never yields a
    // truncated array.
    check_range(buf, bit_offset + (count - 1) * width as usize, width)?;

    let mut out = Vec::new();
    out.try_reserve_exact(count)?;
    for j in 0..count {
        out.push(read_uint(buf, bit_offset + j * width as usize, width)?);
    }
    Ok(out)
}

/// Read a sign-and-magnitude signed integer of `width` bits.
///
/// GRIB2 encodes signed fields with a leading sign bit followed by the
/// magnitude; it does NOT use two's complement. `0x80000001` over 32 bits
/// is -1, not a large negative number.
pub fn read_signed(buf: &[u8], bit_offset: usize, width: u32) -> Grib2Result<i32> {
    check_range(buf, bit_offset, width)?;

    let sign = read_uint(buf, bit_offset, 1)?;
    let magnitude = if width > 1 {
        read_uint(buf, bit_offset + 1, width - 1)? as i32
    } else {
        0
    };
    Ok(if sign == 1 { -magnitude } else { magnitude })
}

/// Write the low `width` bits of `value` at `bit_offset`, big-endian.
///
/// Bits outside `[bit_offset, bit_offset + width)` are left untouched, so
/// adjacent fields may be written in any order. Bits of `value` above
/// `width` are masked off.
pub fn write_uint(buf: &mut [u8], value: u32, bit_offset: usize, width: u32) -> Grib2Result<()> {
    check_range(buf, bit_offset, width)?;

    for i in 0..width as usize {
        let absolute_bit = bit_offset + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8);

        let bit = ((value >> (width as usize - 1 - i)) & 1) as u8;
        buf[byte_idx] = (buf[byte_idx] & !(1 << bit_idx)) | (bit << bit_idx);
    }

    Ok(())
}

/// Write `values.len()` consecutive `width`-bit fields starting at
/// `bit_offset`. Inverse of [`read_uints`].
pub fn write_uints(buf: &mut [u8], values: &[u32], bit_offset: usize, width: u32) -> Grib2Result<()> {
    for (j, &value) in values.iter().enumerate() {
        write_uint(buf, value, bit_offset + j * width as usize, width)?;
    }
    Ok(())
}
