//! Incremental GRIB2 message assembly.
//!
//! A message is built section by section: the 16-octet indicator section
//! and the identification section up front, then any of sections 2-7, and
//! finally the `7777` end section. The running total length lives in the
//! section 0 length field and is re-derived from the section chain during
//! finalization, which catches any byte-count drift before the message is
//! declared complete.

use tracing::{debug, trace};

use crate::bits;
use crate::error::{Grib2Error, Grib2Result};
use crate::sections::{Identification, IDENTIFICATION_SECTION_LEN};

/// Start marker, `GRIB` as a big-endian 32-bit pattern (1196575042).
pub const START_MARKER: [u8; 4] = *b"GRIB";
/// End marker, `7777` as a big-endian 32-bit pattern (926365495).
pub const END_MARKER: [u8; 4] = *b"7777";

/// Length of the indicator section (section 0), in octets.
pub const INDICATOR_SECTION_LEN: usize = 16;

/// Bit offset of the 32-bit total-length field in section 0. The field is
/// nominally 8 octets; the upper 4 stay zero for any message this builder
/// can produce.
const TOTAL_LENGTH_BIT_OFFSET: usize = 96;

/// Builder for a single GRIB2 message.
///
/// Owns a growable byte buffer holding the in-progress message. Sections
/// are appended in the order required by the format; [`finalize`] walks
/// the section chain to validate byte counts, appends the end marker, and
/// yields the completed message.
///
/// [`finalize`]: Grib2Builder::finalize
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    buf: Vec<u8>,
    last_section: u8,
}

impl Grib2Builder {
    /// Start a new message: indicator section (section 0) followed by the
    /// identification section (section 1).
    ///
    /// Only edition 2 can be encoded; any other edition is rejected with
    /// [`Grib2Error::UnsupportedEdition`].
    pub fn create(
        discipline: u8,
        edition: u8,
        identification: &Identification,
    ) -> Grib2Result<Self> {
        if edition != 2 {
            return Err(Grib2Error::UnsupportedEdition(edition));
        }

        let mut buf = vec![0u8; INDICATOR_SECTION_LEN];
        buf[0..4].copy_from_slice(&START_MARKER);
        // Octets 5-6 reserved, octet 7 discipline, octet 8 edition.
        buf[6] = discipline;
        buf[7] = edition;

        let mut builder = Grib2Builder {
            buf,
            last_section: 0,
        };
        builder.append_identification(identification)?;
        builder.last_section = 1;
        Ok(builder)
    }

    fn append_identification(&mut self, ident: &Identification) -> Grib2Result<()> {
        let start = self.buf.len();
        self.buf
            .resize(start + IDENTIFICATION_SECTION_LEN as usize, 0);

        let mut cursor = start * 8;
        let mut put = |value: u32, width: u32, buf: &mut [u8]| -> Grib2Result<()> {
            bits::write_uint(buf, value, cursor, width)?;
            cursor += width as usize;
            Ok(())
        };

        put(IDENTIFICATION_SECTION_LEN, 32, &mut self.buf)?;
        put(1, 8, &mut self.buf)?;
        for (value, width) in ident.wire_fields() {
            put(value, width, &mut self.buf)?;
        }

        self.set_total_length(self.buf.len() as u32)?;
        Ok(())
    }

    /// Total message length currently recorded in section 0.
    pub fn total_length(&self) -> Grib2Result<u32> {
        bits::read_uint(&self.buf, TOTAL_LENGTH_BIT_OFFSET, 32)
    }

    fn set_total_length(&mut self, length: u32) -> Grib2Result<()> {
        bits::write_uint(&mut self.buf, length, TOTAL_LENGTH_BIT_OFFSET, 32)
    }

    fn check_in_progress(&self) -> Grib2Result<()> {
        if self.buf.len() < INDICATOR_SECTION_LEN || self.buf[0..4] != START_MARKER {
            return Err(Grib2Error::NotGrib);
        }
        let total = self.total_length()? as usize;
        if total >= INDICATOR_SECTION_LEN + 4
            && total <= self.buf.len()
            && self.buf[total - 4..total] == END_MARKER
        {
            return Err(Grib2Error::MessageComplete);
        }
        Ok(())
    }

    /// Append one of sections 2-7 with an already-encoded body (everything
    /// after the 5-octet section header).
    ///
    /// Sections must arrive in non-decreasing order; a new repetition group
    /// (sections 2-7 again) may only start after a section 7. Returns the
    /// updated total message length.
    pub fn add_section(&mut self, number: u8, body: &[u8]) -> Grib2Result<u32> {
        self.check_in_progress()?;

        let in_order = (2..=7).contains(&number)
            && (number >= self.last_section || self.last_section == 7);
        if !in_order {
            return Err(Grib2Error::OutOfOrderSection(self.last_section));
        }

        let section_len = body.len() as u32 + 5;
        let start = self.buf.len();
        self.buf.resize(start + 5, 0);
        bits::write_uint(&mut self.buf, section_len, start * 8, 32)?;
        bits::write_uint(&mut self.buf, u32::from(number), start * 8 + 32, 8)?;
        self.buf.extend_from_slice(body);

        let total = self.total_length()? + section_len;
        self.set_total_length(total)?;
        self.last_section = number;

        trace!(section = number, length = section_len, total, "added section");
        Ok(total)
    }

    /// Append a Local Use section (section 2). An empty payload is valid
    /// and encodes as a bare 5-octet section.
    pub fn add_local_use(&mut self, payload: &[u8]) -> Grib2Result<u32> {
        self.add_section(2, payload)
    }

    /// Finalize the message: validate the section chain against the stored
    /// total length, append the `7777` end section, and record the final
    /// length. Returns the final total length in octets.
    ///
    /// The section walk re-reads every declared section length from the
    /// buffer. If the accumulated count ever exceeds the stored total the
    /// message is structurally corrupt; if the last section is not the data
    /// section (7) the end section would be out of order. Finalizing an
    /// already-complete message fails the same walk, since the end marker
    /// does not reconcile as a section.
    pub fn finalize(&mut self) -> Grib2Result<u32> {
        if self.buf.len() < INDICATOR_SECTION_LEN || self.buf[0..4] != START_MARKER {
            return Err(Grib2Error::NotGrib);
        }

        let total = u64::from(self.total_length()?);
        let mut sum = INDICATOR_SECTION_LEN as u64;
        let mut last_section;
        loop {
            let section_len = u64::from(bits::read_uint(&self.buf, sum as usize * 8, 32)?);
            if sum + section_len > total {
                return Err(Grib2Error::StructuralInconsistency {
                    sum: sum + section_len,
                    total,
                });
            }
            last_section = bits::read_uint(&self.buf, sum as usize * 8 + 32, 8)? as u8;
            sum += section_len;
            if sum == total {
                break;
            }
        }

        if last_section != 7 {
            return Err(Grib2Error::OutOfOrderSection(last_section));
        }

        self.buf.extend_from_slice(&END_MARKER);
        let final_length = total as u32 + 4;
        self.set_total_length(final_length)?;
        self.last_section = 8;

        debug!(length = final_length, "finalized GRIB2 message");
        Ok(final_length)
    }

    /// Bytes of the message as assembled so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the builder and hand the message buffer to the caller.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identification() -> Identification {
        Identification {
            year: 2021,
            month: 9,
            day: 22,
            ..Identification::default()
        }
    }

    #[test]
    fn test_create_golden_bytes() {
        // Known-good 37-octet header + identification sequence for
        // discipline 0, edition 2, reference time 2021-09-22T00:00:00Z.
        let expected: [u8; 37] = [
            71, 82, 73, 66, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 37, 0, 0, 0, 21, 1, 0, 0, 0, 0, 0, 0,
            0, 7, 229, 9, 22, 0, 0, 0, 0, 0,
        ];

        let builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();
        assert_eq!(builder.as_bytes(), &expected);
        assert_eq!(builder.total_length().unwrap(), 37);
    }

    #[test]
    fn test_create_rejects_other_editions() {
        for edition in [0u8, 1, 3] {
            assert!(matches!(
                Grib2Builder::create(0, edition, &test_identification()),
                Err(Grib2Error::UnsupportedEdition(e)) if e == edition
            ));
        }
    }

    #[test]
    fn test_finalize_without_data_section() {
        // Section 1 is the last section: the end section would be out of
        // order.
        let mut builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();
        assert!(matches!(
            builder.finalize(),
            Err(Grib2Error::OutOfOrderSection(1))
        ));
    }

    #[test]
    fn test_add_sections_and_finalize() {
        let mut builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();

        builder.add_local_use(b"local").unwrap();
        builder.add_section(3, &[0u8; 12]).unwrap();
        builder.add_section(4, &[0u8; 9]).unwrap();
        builder.add_section(5, &[0u8; 11]).unwrap();
        builder.add_section(6, &[255]).unwrap();
        builder.add_section(7, &[1, 2, 3]).unwrap();

        // 16 + 21 + 10 + 17 + 14 + 16 + 6 + 8 sections, then + 4 for 7777.
        let expected_total = 16 + 21 + 10 + 17 + 14 + 16 + 6 + 8 + 4;
        let total = builder.finalize().unwrap();
        assert_eq!(total, expected_total);

        let bytes = builder.into_bytes();
        assert_eq!(bytes.len() as u32, total);
        assert_eq!(&bytes[bytes.len() - 4..], b"7777");
        // Stored total matches the buffer.
        assert_eq!(
            u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            total
        );
    }

    #[test]
    fn test_finalize_twice_is_structural_error() {
        let mut builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();
        builder.add_section(3, &[0u8; 12]).unwrap();
        builder.add_section(7, &[0u8; 4]).unwrap();
        builder.finalize().unwrap();

        assert!(matches!(
            builder.finalize(),
            Err(Grib2Error::StructuralInconsistency { .. })
        ));
    }

    #[test]
    fn test_add_after_finalize_rejected() {
        let mut builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();
        builder.add_section(7, &[0u8; 4]).unwrap();
        builder.finalize().unwrap();

        assert!(matches!(
            builder.add_section(7, &[0u8; 4]),
            Err(Grib2Error::MessageComplete)
        ));
    }

    #[test]
    fn test_out_of_order_add_rejected() {
        let mut builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();
        builder.add_section(5, &[0u8; 11]).unwrap();

        // 3 < 5 and the last section is not 7.
        assert!(matches!(
            builder.add_section(3, &[0u8; 12]),
            Err(Grib2Error::OutOfOrderSection(5))
        ));

        // A new repetition group is allowed after section 7.
        builder.add_section(7, &[0u8; 2]).unwrap();
        builder.add_section(3, &[0u8; 12]).unwrap();
    }

    #[test]
    fn test_repeated_fields_total_length() {
        // total_length == sum(section_lengths) + 16 + 4 across two field
        // groups.
        let mut builder = Grib2Builder::create(0, 2, &test_identification()).unwrap();
        let mut section_sum = IDENTIFICATION_SECTION_LEN;
        for _ in 0..2 {
            for (number, body_len) in [(3u8, 12usize), (4, 9), (5, 11), (7, 5)] {
                builder.add_section(number, &vec![0u8; body_len]).unwrap();
                section_sum += body_len as u32 + 5;
            }
        }
        let total = builder.finalize().unwrap();
        assert_eq!(total, section_sum + 16 + 4);
    }
}
