//! Error types for GRIB2 encoding and decoding.

use thiserror::Error;

/// Result type alias using Grib2Error.
pub type Grib2Result<T> = Result<T, Grib2Error>;

/// Primary error type for GRIB2 codec operations.
///
/// Each variant is a stable, distinct error kind. Lookup misses and
/// unrecognized grid templates are *not* represented here: the format
/// anticipates forward compatibility, so those surface as `Option::None`
/// or defined zero results at the call site.
#[derive(Debug, Error)]
pub enum Grib2Error {
    // === Template Errors ===
    #[error("Data Representation Template 5.{0} is not defined")]
    UnknownTemplate(u16),

    // === Section Decode Errors ===
    #[error("Expected section {expected}, found section {found}")]
    SectionMismatch { expected: u8, found: u8 },

    #[error("Bit range at offset {offset} (width {width}) exceeds buffer of {len} bytes")]
    BufferOverrun {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("Bit field width {0} outside supported range 1..=32")]
    BitWidth(u32),

    #[error("Failed to allocate decode buffer: {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    // === Message Assembly Errors ===
    #[error("Start marker 'GRIB' not found in message")]
    NotGrib,

    #[error("Message is already finalized")]
    MessageComplete,

    #[error("Section byte counts do not reconcile with declared total ({sum} vs {total})")]
    StructuralInconsistency { sum: u64, total: u64 },

    #[error("End section may only follow section 7 (last section was {0})")]
    OutOfOrderSection(u8),

    #[error("Unsupported GRIB edition: {0}")]
    UnsupportedEdition(u8),

    // === Scanner Errors ===
    #[error("Scan cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
