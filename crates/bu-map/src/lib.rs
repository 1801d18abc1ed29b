//! Mapping engine for benefit upload processing.
//!
//! - [`entity`]: company and entity codes from filenames and title cells
//! - [`engine`]: applies a [`Process`](bu_model::Process) to a dataset
//! - [`clean`]: LOC amount, free-text, and email normalization
//! - [`suggest`]: header-based field mapping suggestions

#![deny(unsafe_code)]

pub mod clean;
pub mod details;
pub mod engine;
pub mod entity;
pub mod error;
pub mod suggest;
pub mod utils;

pub use clean::{
    clean_loc_amount, is_keyword_flagged, is_valid_email, parse_loc_amount, resolve_email,
    sanitize_value,
};
pub use details::compose_additional_details;
pub use engine::{MappingContext, MappingOutcome, apply_mapping, validate_mapping};
pub use entity::{
    CellRef, EntityInfo, UNKNOWN_COMPANY, extract_from_cell, extract_from_filename,
    extract_from_text,
};
pub use error::{MapError, Result};
pub use suggest::{FieldSuggestion, MIN_CONFIDENCE, score_column, suggest_fields, suggested_mapping};
pub use utils::normalize_text;
