//! GRIB2 message encoding and decoding (WMO FM 92 GRIB Edition 2).
//!
//! GRIB2 is a self-describing, section-based binary format for gridded
//! meteorological data. This crate implements the codec core:
//!
//! - [`bits`]: bit-level packing engine for arbitrary-width fields
//! - [`templates`]: Data Representation Template registry and extension
//!   resolution
//! - [`sections`]: section decoders (identification, local use, data
//!   representation, bit-map)
//! - [`grid`]: dimension and pentagonal-resolution views over decoded grid
//!   definitions
//! - [`unpack`]: numeric reconstruction for the simple packing scheme
//! - [`builder`]: incremental message assembly and finalization
//! - [`scan`]: message boundary scanner for large files
//!
//! All decode entry points borrow their input buffer; decoded structures
//! own their storage and release it on drop. Wire and file I/O beyond a
//! seekable byte source are out of scope.

pub mod bits;
pub mod builder;
pub mod error;
pub mod field;
pub mod grid;
pub mod scan;
pub mod sections;
pub mod templates;
pub mod unpack;

pub use builder::Grib2Builder;
pub use error::{Grib2Error, Grib2Result};
pub use field::Grib2Field;
pub use scan::{FoundMessage, MessageScanner};
pub use sections::{BitmapSection, DataRepresentation, DrtInstance, Identification};
