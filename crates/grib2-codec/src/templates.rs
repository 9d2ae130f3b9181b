//! Data Representation Template (DRT 5.NN) registry.
//!
//! Templates are fixed, compiled-in octet layouts keyed by template number.
//! A handful of templates cannot be described by a fixed layout alone: the
//! tail of the octet map depends on values decoded from the fixed portion.
//! Those carry a `needs_extension` flag and are completed by [`resolve`].

use crate::error::{Grib2Error, Grib2Result};

/// One entry in the compiled-in DRT table.
///
/// `octet_map` gives the width of each template field in octets. A negative
/// width marks a sign-and-magnitude signed field of `abs(width)` octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrsTemplate {
    pub number: u16,
    pub octet_map: &'static [i8],
    pub needs_extension: bool,
}

/// Known Data Representation Templates, per GRIB2 Code Table 5.0.
///
/// 40000/40010 are deprecated aliases of 5.40 (JPEG2000) and 5.41 (PNG)
/// still found in older archives.
static DRS_TEMPLATES: &[DrsTemplate] = &[
    // 5.0: Grid point data - simple packing
    DrsTemplate { number: 0, octet_map: &[4, -2, -2, 1, 1], needs_extension: false },
    // 5.2: Grid point data - complex packing
    DrsTemplate { number: 2, octet_map: &[4, -2, -2, 1, 1, 1, 1, 4, 4, 4, 1, 1, 4, 1, 4, 1], needs_extension: false },
    // 5.3: Grid point data - complex packing and spatial differencing
    DrsTemplate { number: 3, octet_map: &[4, -2, -2, 1, 1, 1, 1, 4, 4, 4, 1, 1, 4, 1, 4, 1, 1, 1], needs_extension: false },
    // 5.50: Spectral data - simple packing
    DrsTemplate { number: 50, octet_map: &[4, -2, -2, 1, 4], needs_extension: false },
    // 5.51: Spherical harmonics - complex packing
    DrsTemplate { number: 51, octet_map: &[4, -2, -2, 1, -4, 2, 2, 2, 4, 1], needs_extension: false },
    // 5.1: Matrix values at grid point - simple packing
    DrsTemplate { number: 1, octet_map: &[4, -2, -2, 1, 1, 1, 4, 2, 2, 1, 1, 1, 1, 1, 1], needs_extension: true },
    // 5.40: Grid point data - JPEG2000 compression
    DrsTemplate { number: 40, octet_map: &[4, -2, -2, 1, 1, 1, 1], needs_extension: false },
    // 5.41: Grid point data - PNG compression
    DrsTemplate { number: 41, octet_map: &[4, -2, -2, 1, 1, 1], needs_extension: false },
    DrsTemplate { number: 40000, octet_map: &[4, -2, -2, 1, 1, 1, 1], needs_extension: false },
    DrsTemplate { number: 40010, octet_map: &[4, -2, -2, 1, 1, 1], needs_extension: false },
];

/// Look up Data Representation Template 5.`number`.
///
/// A miss is a normal outcome (the table only carries templates this crate
/// knows how to walk); callers that cannot proceed without a hit map `None`
/// to [`Grib2Error::UnknownTemplate`].
pub fn lookup(number: u16) -> Option<&'static DrsTemplate> {
    DRS_TEMPLATES.iter().find(|t| t.number == number)
}

/// A template whose extension (if any) has been computed from decoded
/// fixed-portion values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDrsTemplate {
    pub number: u16,
    pub octet_map: &'static [i8],
    /// Extension field widths; empty unless the template needs extending.
    pub extension: Vec<i8>,
}

impl ResolvedDrsTemplate {
    /// Total number of fields, fixed portion plus extension.
    pub fn len(&self) -> usize {
        self.octet_map.len() + self.extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widths of every field in decode order.
    pub fn widths(&self) -> impl Iterator<Item = i8> + '_ {
        self.octet_map.iter().copied().chain(self.extension.iter().copied())
    }
}

/// Resolve template 5.`number`, computing the extension map when required.
///
/// `fixed_values` must hold the already-decoded values of the fixed portion.
/// Each extensible template defines its own derivation rule; new extensible
/// templates add an arm to the dispatch below rather than a formula at the
/// call sites.
pub fn resolve(number: u16, fixed_values: &[i64]) -> Grib2Result<ResolvedDrsTemplate> {
    let template = lookup(number).ok_or(Grib2Error::UnknownTemplate(number))?;

    let mut resolved = ResolvedDrsTemplate {
        number: template.number,
        octet_map: template.octet_map,
        extension: Vec::new(),
    };

    if !template.needs_extension {
        return Ok(resolved);
    }

    match number {
        // 5.1: one 4-octet coordinate value per first- and second-dimension
        // coefficient (NC1 + NC2, fields 10 and 12 of the fixed portion).
        1 => {
            let nc1 = fixed_values.get(10).copied().unwrap_or(0);
            let nc2 = fixed_values.get(12).copied().unwrap_or(0);
            let ext_len = (nc1 + nc2).max(0) as usize;
            resolved.extension = vec![4; ext_len];
        }
        _ => {}
    }

    Ok(resolved)
}
