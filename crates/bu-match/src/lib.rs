//! Record matching over configured datasets.
//!
//! - [`duplicates`]: confirmed and potential duplicates between two files
//! - [`lookup`]: find listed employees across batch files and read their entity
//! - [`invoice`]: employee lists from invoice tables and typed lines

#![deny(unsafe_code)]

pub mod duplicates;
pub mod error;
pub mod fingerprint;
pub mod invoice;
pub mod lookup;

pub use duplicates::{
    COMMON_WORDS, ColumnMatch, DuplicateKind, DuplicateMatch, DuplicateOptions, DuplicateReport,
    DuplicateReview, find_duplicates, normalize_value,
};
pub use error::{MatchError, Result};
pub use fingerprint::RowFingerprint;
pub use invoice::{parse_invoice_employees, parse_manual_employees};
pub use lookup::{BatchColumns, Employee, LookupMatch, LookupSession, MAX_ENTITY_COLUMNS};
