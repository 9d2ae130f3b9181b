//! GRIB2 section decoders.
//!
//! Every decoder here takes the message buffer plus a mutable bit-offset
//! cursor, reads the 4-octet section length and 1-octet section number,
//! verifies the number, decodes the payload through the bit engine, and
//! leaves the cursor past what it consumed. A section-number mismatch is a
//! hard decode error for the current call; it never corrupts other buffers.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};

use crate::bits;
use crate::error::{Grib2Error, Grib2Result};
use crate::templates;

/// Section 1: Identification Section.
///
/// Thirteen fixed-width fields at fixed offsets; 21 octets on the wire
/// including the section header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub table_version: u8,
    pub local_table_version: u8,
    pub significance_of_reference_time: u8,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub production_status: u8,
    pub data_type: u8,
}

/// Encoded length of the identification section, in octets.
pub const IDENTIFICATION_SECTION_LEN: u32 = 21;

impl Identification {
    /// Reference time of the data, if the encoded date is valid.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|date| {
                date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            })
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
    }

    /// Field values in wire order, paired with their octet widths.
    pub(crate) fn wire_fields(&self) -> [(u32, u32); 13] {
        [
            (u32::from(self.center), 16),
            (u32::from(self.sub_center), 16),
            (u32::from(self.table_version), 8),
            (u32::from(self.local_table_version), 8),
            (u32::from(self.significance_of_reference_time), 8),
            (u32::from(self.year), 16),
            (u32::from(self.month), 8),
            (u32::from(self.day), 8),
            (u32::from(self.hour), 8),
            (u32::from(self.minute), 8),
            (u32::from(self.second), 8),
            (u32::from(self.production_status), 8),
            (u32::from(self.data_type), 8),
        ]
    }
}

/// A decoded Data Representation Template instance: the template number plus
/// its field values in template order (extension included, when present).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrtInstance {
    pub template_number: u16,
    pub values: Vec<i64>,
}

impl DrtInstance {
    /// Reference value R, stored on the wire as a raw IEEE-754 single
    /// precision bit pattern.
    pub fn reference_value(&self) -> f32 {
        f32::from_bits(self.values.first().copied().unwrap_or(0) as u32)
    }

    /// Binary scale factor E.
    pub fn binary_scale_factor(&self) -> i32 {
        self.values.get(1).copied().unwrap_or(0) as i32
    }

    /// Decimal scale factor D.
    pub fn decimal_scale_factor(&self) -> i32 {
        self.values.get(2).copied().unwrap_or(0) as i32
    }

    /// Number of bits per packed value. Zero means a constant field.
    pub fn bits_per_value(&self) -> u32 {
        self.values.get(3).copied().unwrap_or(0).max(0) as u32
    }

    /// Type of original field values (Code Table 5.1).
    pub fn original_field_type(&self) -> i64 {
        self.values.get(4).copied().unwrap_or(0)
    }
}

/// Section 5: number of packed data points plus the decoded template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    pub drt: DrtInstance,
}

/// Section 6 result: the bit-map indicator and, for indicator 0, the
/// decoded per-grid-point presence flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapSection {
    /// Code Table 6.0: 0 = bit-map follows, 1-253 = predefined bit-map,
    /// 254 = previously defined bit-map applies, 255 = none.
    pub indicator: u8,
    pub bitmap: Option<Vec<bool>>,
}

impl BitmapSection {
    /// True if the message declares that no bit-map applies.
    pub fn is_absent(&self) -> bool {
        self.indicator == 255
    }
}

/// Read the 4-octet length and 1-octet number of the section at `cursor`,
/// advancing the cursor past both.
fn read_section_header(
    buf: &[u8],
    cursor: &mut usize,
    expected: u8,
) -> Grib2Result<u32> {
    let length = bits::read_uint(buf, *cursor, 32)?;
    *cursor += 32;
    let number = bits::read_uint(buf, *cursor, 8)? as u8;
    *cursor += 8;

    if number != expected {
        return Err(Grib2Error::SectionMismatch {
            expected,
            found: number,
        });
    }
    Ok(length)
}

/// Decode Section 1 (Identification).
pub fn decode_identification(buf: &[u8], cursor: &mut usize) -> Grib2Result<Identification> {
    let start = *cursor;
    let length = read_section_header(buf, cursor, 1)?;

    let mut field = |width: u32| -> Grib2Result<u32> {
        let value = bits::read_uint(buf, *cursor, width)?;
        *cursor += width as usize;
        Ok(value)
    };

    let ident = Identification {
        center: field(16)? as u16,
        sub_center: field(16)? as u16,
        table_version: field(8)? as u8,
        local_table_version: field(8)? as u8,
        significance_of_reference_time: field(8)? as u8,
        year: field(16)? as u16,
        month: field(8)? as u8,
        day: field(8)? as u8,
        hour: field(8)? as u8,
        minute: field(8)? as u8,
        second: field(8)? as u8,
        production_status: field(8)? as u8,
        data_type: field(8)? as u8,
    };

    // Skip any reserved octets a producer appended beyond the base layout.
    *cursor = start + (length as usize) * 8;

    Ok(ident)
}

/// Decode Section 2 (Local Use).
///
/// A declared length of exactly 5 octets (empty payload) is valid and
/// yields an empty buffer, not an error.
pub fn decode_local_use(buf: &[u8], cursor: &mut usize) -> Grib2Result<Bytes> {
    let length = read_section_header(buf, cursor, 2)?;
    let payload_len = (length as usize).saturating_sub(5);

    if payload_len == 0 {
        return Ok(Bytes::new());
    }

    let start = *cursor / 8;
    let end = start + payload_len;
    if end > buf.len() {
        return Err(Grib2Error::BufferOverrun {
            offset: *cursor,
            width: payload_len * 8,
            len: buf.len(),
        });
    }

    *cursor += payload_len * 8;
    Ok(Bytes::copy_from_slice(&buf[start..end]))
}

/// Decode Section 5 (Data Representation).
///
/// Walks the template's octet map through the bit engine, reading negative
/// widths as sign-and-magnitude fields, and resolves the extension map when
/// the template requires one. An absent template number is surfaced as
/// [`Grib2Error::UnknownTemplate`]; the caller decides the fallback.
pub fn decode_data_representation(
    buf: &[u8],
    cursor: &mut usize,
) -> Grib2Result<DataRepresentation> {
    read_section_header(buf, cursor, 5)?;

    let num_data_points = bits::read_uint(buf, *cursor, 32)?;
    *cursor += 32;
    let template_number = bits::read_uint(buf, *cursor, 16)? as u16;
    *cursor += 16;

    let template = templates::lookup(template_number)
        .ok_or(Grib2Error::UnknownTemplate(template_number))?;

    let mut values = Vec::new();
    values.try_reserve_exact(template.octet_map.len())?;
    for &width in template.octet_map {
        values.push(read_template_field(buf, cursor, width)?);
    }

    if template.needs_extension {
        let resolved = templates::resolve(template_number, &values)?;
        values.try_reserve_exact(resolved.extension.len())?;
        for &width in &resolved.extension {
            values.push(read_template_field(buf, cursor, width)?);
        }
    }

    Ok(DataRepresentation {
        num_data_points,
        drt: DrtInstance {
            template_number,
            values,
        },
    })
}

/// Read one template field of `width` octets; negative widths are
/// sign-and-magnitude signed fields.
fn read_template_field(buf: &[u8], cursor: &mut usize, width: i8) -> Grib2Result<i64> {
    let nbits = (width.unsigned_abs() as u32) * 8;
    let value = if width >= 0 {
        i64::from(bits::read_uint(buf, *cursor, nbits)?)
    } else {
        i64::from(bits::read_signed(buf, *cursor, nbits)?)
    };
    *cursor += nbits as usize;
    Ok(value)
}

/// Decode Section 6 (Bit-Map).
///
/// Indicator 0 unpacks `ngpts` one-bit presence flags through the
/// vectorized bit read. Indicators 1-253 (predefined bit-maps) and 254
/// (reuse previous) are recognized codes whose resolution is a caller
/// policy; they are surfaced with no bitmap attached. Indicator 255 means
/// no bit-map applies.
pub fn decode_bitmap(buf: &[u8], cursor: &mut usize, ngpts: usize) -> Grib2Result<BitmapSection> {
    read_section_header(buf, cursor, 6)?;

    let indicator = bits::read_uint(buf, *cursor, 8)? as u8;
    *cursor += 8;

    if indicator != 0 {
        return Ok(BitmapSection {
            indicator,
            bitmap: None,
        });
    }

    let flags = bits::read_uints(buf, *cursor, 1, ngpts)?;
    *cursor += ngpts;

    let mut bitmap = Vec::new();
    bitmap.try_reserve_exact(ngpts)?;
    bitmap.extend(flags.iter().map(|&f| f == 1));

    Ok(BitmapSection {
        indicator,
        bitmap: Some(bitmap),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_header(length: u32, number: u8) -> Vec<u8> {
        let mut buf = length.to_be_bytes().to_vec();
        buf.push(number);
        buf
    }

    #[test]
    fn test_decode_identification() {
        let mut buf = section_header(21, 1);
        buf.extend_from_slice(&7u16.to_be_bytes()); // center (NCEP)
        buf.extend_from_slice(&0u16.to_be_bytes()); // sub-center
        buf.extend_from_slice(&[2, 1, 1]); // tables + significance
        buf.extend_from_slice(&2021u16.to_be_bytes());
        buf.extend_from_slice(&[9, 22, 12, 30, 0, 0, 1]);

        let mut cursor = 0;
        let ident = decode_identification(&buf, &mut cursor).unwrap();
        assert_eq!(ident.center, 7);
        assert_eq!(ident.year, 2021);
        assert_eq!(ident.month, 9);
        assert_eq!(ident.day, 22);
        assert_eq!(cursor, 21 * 8);

        let time = ident.reference_time().unwrap();
        assert_eq!(time.to_rfc3339(), "2021-09-22T12:30:00+00:00");
    }

    #[test]
    fn test_decode_identification_wrong_section() {
        let buf = section_header(21, 3);
        let mut cursor = 0;
        assert!(matches!(
            decode_identification(&buf, &mut cursor),
            Err(Grib2Error::SectionMismatch {
                expected: 1,
                found: 3
            })
        ));
    }

    #[test]
    fn test_decode_local_use_empty() {
        let buf = section_header(5, 2);
        let mut cursor = 0;
        let payload = decode_local_use(&buf, &mut cursor).unwrap();
        assert!(payload.is_empty());
        assert_eq!(cursor, 40);
    }

    #[test]
    fn test_decode_local_use_payload() {
        let mut buf = section_header(9, 2);
        buf.extend_from_slice(b"NCEP");

        let mut cursor = 0;
        let payload = decode_local_use(&buf, &mut cursor).unwrap();
        assert_eq!(&payload[..], b"NCEP");
        assert_eq!(cursor, 9 * 8);
    }

    #[test]
    fn test_decode_local_use_truncated() {
        // Declares 4 payload octets but only carries 2.
        let mut buf = section_header(9, 2);
        buf.extend_from_slice(b"NC");

        let mut cursor = 0;
        assert!(matches!(
            decode_local_use(&buf, &mut cursor),
            Err(Grib2Error::BufferOverrun { .. })
        ));
    }

    #[test]
    fn test_decode_bitmap_inline() {
        // 10 grid points: 1111 0000 11 padded to 2 octets.
        let mut buf = section_header(8, 6);
        buf.push(0); // indicator: bit-map follows
        buf.extend_from_slice(&[0b1111_0000, 0b1100_0000]);

        let mut cursor = 0;
        let section = decode_bitmap(&buf, &mut cursor, 10).unwrap();
        assert_eq!(section.indicator, 0);
        let bitmap = section.bitmap.unwrap();
        assert_eq!(
            bitmap,
            vec![true, true, true, true, false, false, false, false, true, true]
        );
        assert_eq!(cursor, 48 + 10);
    }

    #[test]
    fn test_decode_bitmap_none_applies() {
        let mut buf = section_header(6, 6);
        buf.push(255);

        let mut cursor = 0;
        let section = decode_bitmap(&buf, &mut cursor, 100).unwrap();
        assert_eq!(section.indicator, 255);
        assert!(section.bitmap.is_none());
        assert!(section.is_absent());
    }

    #[test]
    fn test_decode_bitmap_predefined_passes_through() {
        // Predefined (42) and reuse-previous (254) are valid codes whose
        // resolution is left to the caller.
        for indicator in [42u8, 254] {
            let mut buf = section_header(6, 6);
            buf.push(indicator);

            let mut cursor = 0;
            let section = decode_bitmap(&buf, &mut cursor, 100).unwrap();
            assert_eq!(section.indicator, indicator);
            assert!(section.bitmap.is_none());
        }
    }

    #[test]
    fn test_decode_bitmap_wrong_section() {
        let buf = section_header(6, 7);
        let mut cursor = 0;
        assert!(matches!(
            decode_bitmap(&buf, &mut cursor, 10),
            Err(Grib2Error::SectionMismatch {
                expected: 6,
                found: 7
            })
        ));
    }

    #[test]
    fn test_decode_data_representation_simple_packing() {
        let mut buf = section_header(21, 5);
        buf.extend_from_slice(&300u32.to_be_bytes()); // data points
        buf.extend_from_slice(&0u16.to_be_bytes()); // template 5.0
        buf.extend_from_slice(&1.5f32.to_be_bytes()); // reference value
        buf.extend_from_slice(&[0x80, 0x02]); // E = -2 (sign-magnitude)
        buf.extend_from_slice(&[0x00, 0x01]); // D = 1
        buf.push(12); // bits per value
        buf.push(0); // original field type

        let mut cursor = 0;
        let section = decode_data_representation(&buf, &mut cursor).unwrap();
        assert_eq!(section.num_data_points, 300);
        assert_eq!(section.drt.template_number, 0);
        assert_eq!(section.drt.values.len(), 5);
        assert_eq!(section.drt.reference_value(), 1.5);
        assert_eq!(section.drt.binary_scale_factor(), -2);
        assert_eq!(section.drt.decimal_scale_factor(), 1);
        assert_eq!(section.drt.bits_per_value(), 12);
        assert_eq!(cursor, 21 * 8);
    }

    #[test]
    fn test_decode_data_representation_unknown_template() {
        let mut buf = section_header(11, 5);
        buf.extend_from_slice(&10u32.to_be_bytes());
        buf.extend_from_slice(&999u16.to_be_bytes());

        let mut cursor = 0;
        assert!(matches!(
            decode_data_representation(&buf, &mut cursor),
            Err(Grib2Error::UnknownTemplate(999))
        ));
    }
}
