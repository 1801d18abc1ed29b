//! Storage for saved processes.
//!
//! - [`backend`]: the [`ProcessBackend`] trait with JSON-directory and
//!   in-memory implementations
//! - [`store`]: [`ProcessStore`] with primary/fallback chaining, saving, and
//!   company resolution
//! - [`transfer`]: export envelope and collision-aware import

#![deny(unsafe_code)]

pub mod backend;
pub mod error;
pub mod store;
pub mod transfer;

pub use backend::{JsonDirBackend, MemoryBackend, ProcessBackend};
pub use error::{Result, StoreError};
pub use store::{
    FUZZY_COMPANY_THRESHOLD, ProcessStore, Resolution, ResolutionKind, SaveMode, resolve_in,
};
pub use transfer::{
    CollisionAction, CollisionDecision, CollisionResolver, EXPORT_VERSION, ExportEnvelope,
    ImportSummary, export_all, import_all, parse_import,
};
