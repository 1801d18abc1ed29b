//! Library side of the `bupload` CLI: logging setup, settings, and the
//! per-file pipeline.

pub mod logging;
pub mod pipeline;
pub mod settings;
