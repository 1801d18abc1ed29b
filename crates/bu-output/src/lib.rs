//! Output rendering for benefit uploads.

#![deny(unsafe_code)]

pub mod error;
pub mod files;
pub mod render;

pub use error::{OutputError, Result};
pub use files::{personal_group_filename, sftp_filename, standard_filename, write_output};
pub use render::{
    ACCOUNT_NAME_HEADER, APT_HEADER, UPLOAD_DATE_HEADER, render_dataset, render_personal_group,
    render_sftp, render_standard, short_date,
};
