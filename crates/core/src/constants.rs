//! Constants used throughout the PMS core crate.
//!
//! Filenames, defaults and validation bounds live here so the store, the
//! service and the binaries agree on them.

/// Default store file when no explicit path is configured.
pub const DEFAULT_DATA_FILE: &str = "patients.json";

/// Suffix appended to the store filename while a save is in flight.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Ages must be strictly greater than this.
pub const MIN_AGE_EXCLUSIVE: i64 = 0;

/// Ages must be strictly less than this.
pub const MAX_AGE_EXCLUSIVE: i64 = 120;

/// Decimal digits kept when rounding BMI.
pub const BMI_DECIMALS: i32 = 2;
