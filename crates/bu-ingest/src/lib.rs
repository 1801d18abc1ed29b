//! File decoding and row configuration.
//!
//! Decoding turns CSV, spreadsheet, and PDF files into a header-less
//! [`RawTable`](bu_model::RawTable). Configuration slices that table into a
//! [`Dataset`](bu_model::Dataset) using 1-indexed header/start/end rows, with
//! helpers to guess the first data row and to filter rows by date.

pub mod configure;
pub mod dates;
pub mod decode;
pub mod detect;
pub mod error;

pub use configure::{column_names, configure};
pub use dates::{DateRange, detect_date_columns, filter_by_date_range, parse_flexible_date};
pub use decode::{
    FileKind, MAX_FILE_SIZE, PdfEngine, TEMPLATE_HEADERS, check_file_size, decode_bytes,
    decode_file, read_delimited, sniff_delimiter,
};
pub use detect::{DEFAULT_FIRST_DATA_ROW, detect_first_data_row, is_data_like, is_header_like};
pub use error::{IngestError, Result};
