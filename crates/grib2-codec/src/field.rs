//! Aggregate result of decoding one field from a GRIB2 message.

use bytes::Bytes;

use crate::sections::{DrtInstance, Identification};

/// Everything decoded for a single field, with clear ownership: each
/// sub-buffer is owned by the aggregate and released when it goes out of
/// scope. Any subset of fields may be unset; a message without a local-use
/// section, bit-map, or coordinate list simply leaves those as `None`.
#[derive(Debug, Clone, Default)]
pub struct Grib2Field {
    /// Discipline from the indicator section.
    pub discipline: u8,
    /// Section 1 contents.
    pub identification: Option<Identification>,
    /// Raw Local Use section payload, if one was present and non-empty.
    pub local_use: Option<Bytes>,
    /// Grid Definition Template number, when section 3 was decoded.
    pub grid_template_number: Option<u16>,
    /// Decoded Grid Definition Template values.
    pub grid_template: Option<Vec<i64>>,
    /// Optional list of numbers defining irregular grid rows.
    pub optional_points: Option<Vec<i64>>,
    /// Product Definition Template number, when section 4 was decoded.
    pub product_template_number: Option<u16>,
    /// Decoded Product Definition Template values.
    pub product_template: Option<Vec<i64>>,
    /// Optional vertical coordinate values from section 4.
    pub coordinate_list: Option<Vec<f32>>,
    /// Decoded Data Representation Template instance.
    pub data_representation: Option<DrtInstance>,
    /// Bit-map indicator (Code Table 6.0); 255 when no bit-map applies.
    pub bitmap_indicator: u8,
    /// Per-grid-point presence flags, when the message carried an inline
    /// bit-map.
    pub bitmap: Option<Vec<bool>>,
    /// Reconstructed data values.
    pub data: Option<Vec<f32>>,
}

impl Grib2Field {
    pub fn new(discipline: u8) -> Self {
        Self {
            discipline,
            bitmap_indicator: 255,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_field_is_valid() {
        // Fields may be populated piecemeal; dropping a partially filled
        // aggregate must be a no-op for the unset parts.
        let mut field = Grib2Field::new(0);
        assert_eq!(field.bitmap_indicator, 255);
        assert!(field.data.is_none());

        field.local_use = Some(Bytes::from_static(b"abc"));
        field.data = Some(vec![1.0, 2.0]);
        drop(field);
    }
}
