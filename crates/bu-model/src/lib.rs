//! Data model for benefit upload processing.
//!
//! This crate holds the types shared by every pipeline stage:
//!
//! - [`RawTable`]: the header-less cell grid produced by file decoding
//! - [`Dataset`]: configured rows keyed by unique column names
//! - [`OutputColumn`] / [`OutputRow`]: the fixed 13-column upload schema
//! - [`Process`]: a saved, company-scoped mapping configuration
//! - [`ValidationError`]: per-row, per-column required-field failures

#![deny(unsafe_code)]

mod column;
mod dataset;
mod error;
mod output;
mod process;

pub use column::{OutputColumn, REQUIRED_COLUMNS};
pub use dataset::{Dataset, RawTable, Record};
pub use error::{ModelError, Result};
pub use output::{OutputRow, ValidationError};
pub use process::{
    AdditionalDetailsConfig, DEFAULT_SEPARATOR, DataConfig, FieldMapping, OutputOptions, Process,
    ProcessId,
};
