//! Derived views over a decoded Grid Definition Template instance.
//!
//! The Grid Definition Section decoder itself is an external collaborator;
//! this module only interprets its output (template number plus decoded
//! integer array) at documented per-family offsets. Unrecognized template
//! numbers are a legitimate forward-compatibility case and yield the
//! defined all-zero result, never an error.

/// Output of an external Grid Definition Section decode, borrowed for the
/// duration of a query.
#[derive(Debug, Clone, Copy)]
pub struct GridDefinitionView<'a> {
    /// Grid Definition Template number (Code Table 3.1).
    pub template_number: u16,
    /// Decoded template values in template order.
    pub values: &'a [i64],
}

impl<'a> GridDefinitionView<'a> {
    pub fn new(template_number: u16, values: &'a [i64]) -> Self {
        Self {
            template_number,
            values,
        }
    }

    pub fn family(&self) -> GridFamily {
        GridFamily::from_template(self.template_number)
    }

    fn value(&self, index: usize) -> i64 {
        self.values.get(index).copied().unwrap_or(0)
    }
}

/// Supported Grid Definition Template families.
///
/// Dispatching on the family keeps the numeric field offsets in one place
/// instead of scattered across call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFamily {
    /// Templates 3.0-3.3: regular/rotated/stretched lat-lon.
    LatLon,
    /// Template 3.10.
    Mercator,
    /// Template 3.20.
    PolarStereographic,
    /// Template 3.30.
    LambertConformal,
    /// Templates 3.40-3.43: regular/rotated/stretched Gaussian.
    Gaussian,
    /// Template 3.90: space view perspective or orthographic.
    SpaceView,
    /// Template 3.110.
    EquatorialAzimuthal,
    /// Templates 3.50-3.53: spherical harmonic coefficients.
    SphericalHarmonic,
    /// Any other template number; queries yield zeros.
    Unsupported,
}

impl GridFamily {
    pub fn from_template(number: u16) -> Self {
        match number {
            0..=3 => GridFamily::LatLon,
            10 => GridFamily::Mercator,
            20 => GridFamily::PolarStereographic,
            30 => GridFamily::LambertConformal,
            40..=43 => GridFamily::Gaussian,
            50..=53 => GridFamily::SphericalHarmonic,
            90 => GridFamily::SpaceView,
            110 => GridFamily::EquatorialAzimuthal,
            _ => GridFamily::Unsupported,
        }
    }
}

/// Grid dimensions and scanning mode derived from a grid definition.
///
/// All zeros when the grid is not recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridDimensions {
    /// x (or i) dimension of the grid.
    pub width: i64,
    /// y (or j) dimension of the grid.
    pub height: i64,
    /// Scanning mode flags (Code Table 3.4).
    pub scan_mode: i64,
}

/// J, K, and M pentagonal resolution parameters for spherical harmonic
/// grids (templates 3.50-3.53). All zeros when the grid is not recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PentagonalResolution {
    pub j: i64,
    pub k: i64,
    pub m: i64,
}

/// Extract the grid dimensions and scanning mode from a decoded grid
/// definition. The width/height sit at template indices 7/8 in every
/// supported family; the scanning mode offset varies per family.
pub fn grid_dimensions(view: &GridDefinitionView<'_>) -> GridDimensions {
    let scan_index = match view.family() {
        GridFamily::LatLon | GridFamily::Gaussian => 18,
        GridFamily::Mercator | GridFamily::EquatorialAzimuthal => 15,
        GridFamily::PolarStereographic | GridFamily::LambertConformal => 17,
        GridFamily::SpaceView => 16,
        GridFamily::SphericalHarmonic | GridFamily::Unsupported => {
            return GridDimensions::default();
        }
    };

    GridDimensions {
        width: view.value(7),
        height: view.value(8),
        scan_mode: view.value(scan_index),
    }
}

/// Extract the pentagonal resolution parameters from a decoded spherical
/// harmonic grid definition (J, K, M at template indices 0, 1, 2).
pub fn pentagonal_resolution(view: &GridDefinitionView<'_>) -> PentagonalResolution {
    match view.family() {
        GridFamily::SphericalHarmonic => PentagonalResolution {
            j: view.value(0),
            k: view.value(1),
            m: view.value(2),
        },
        _ => PentagonalResolution::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlon_dimensions() {
        // Template 3.0 with Ni=1440, Nj=721 (GFS 0.25 degree), scan 0.
        let mut values = vec![0i64; 19];
        values[7] = 1440;
        values[8] = 721;
        values[18] = 64;

        let view = GridDefinitionView::new(0, &values);
        let dims = grid_dimensions(&view);
        assert_eq!(dims.width, 1440);
        assert_eq!(dims.height, 721);
        assert_eq!(dims.scan_mode, 64);
    }

    #[test]
    fn test_lambert_scan_offset() {
        // Lambert conformal (HRRR-style) keeps the scanning mode at
        // index 17, not 18.
        let mut values = vec![0i64; 22];
        values[7] = 1799;
        values[8] = 1059;
        values[17] = 80;
        values[18] = 999; // would be wrong if the lat-lon offset were used

        let view = GridDefinitionView::new(30, &values);
        let dims = grid_dimensions(&view);
        assert_eq!(dims.width, 1799);
        assert_eq!(dims.height, 1059);
        assert_eq!(dims.scan_mode, 80);
    }

    #[test]
    fn test_mercator_scan_offset() {
        let mut values = vec![0i64; 19];
        values[7] = 321;
        values[8] = 225;
        values[15] = 64;

        let view = GridDefinitionView::new(10, &values);
        assert_eq!(grid_dimensions(&view).scan_mode, 64);
    }

    #[test]
    fn test_unrecognized_template_yields_zeros() {
        let values = vec![5i64; 30];
        let view = GridDefinitionView::new(9999, &values);

        assert_eq!(grid_dimensions(&view), GridDimensions::default());
        assert_eq!(pentagonal_resolution(&view), PentagonalResolution::default());
        assert_eq!(view.family(), GridFamily::Unsupported);
    }

    #[test]
    fn test_pentagonal_parameters() {
        let values = vec![62i64, 62, 62, 0, 0];
        for template in 50..=53u16 {
            let view = GridDefinitionView::new(template, &values);
            let poly = pentagonal_resolution(&view);
            assert_eq!((poly.j, poly.k, poly.m), (62, 62, 62));
            // Spherical harmonic grids have no width/height.
            assert_eq!(grid_dimensions(&view), GridDimensions::default());
        }
    }

    #[test]
    fn test_short_value_array_yields_zeros() {
        // Template recognized, but the decoded array is shorter than the
        // documented offsets.
        let values = vec![0i64; 3];
        let view = GridDefinitionView::new(0, &values);
        assert_eq!(grid_dimensions(&view), GridDimensions::default());
    }
}
