//! # dialect-csv - CSV reading and writing driven by a dialect
//!
//! A [`Dialect`] describes one CSV variant: separators, quoting, line
//! ending, character encoding, BOM, and cleanup flags. A [`CsvReader`] and a
//! [`CsvWriter`] share it, so a file written with a dialect reads back with
//! the same one.
//!
//! ## Architecture
//!
//! ```text
//!                       ┌─────────────┐
//!                       │   Dialect   │
//!                       └──────┬──────┘
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌─────────────────────────┐     ┌─────────────────────────┐
//! │ CsvReader               │     │ CsvWriter               │
//! │ bytes → records → UTF-8 │     │ UTF-8 → line → bytes    │
//! └────────────┬────────────┘     └────────────┬────────────┘
//!              └───────────────┬───────────────┘
//!                              ▼
//!                    ┌───────────────────┐
//!                    │ encoding::convert │
//!                    └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use dialect_csv::{CsvReader, CsvWriter, Dialect};
//!
//! let writer = CsvWriter::new(Dialect::unix());
//! let mut bytes = writer.encode_row(["nom", "prénom", "age"]);
//! bytes.extend(writer.encode_row(["Martin", "Durand", "28"]));
//!
//! let mut reader = CsvReader::new(Dialect::unix());
//! reader.open_source(Cursor::new(bytes)).unwrap();
//! let rows = reader.get_rows().unwrap();
//!
//! assert_eq!(rows[1], vec!["Martin", "Durand", "28"]);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`dialect`] - Dialect, presets and option maps
//! - [`encoding`] - Encoding conversion and detection
//! - [`stream`] - File handles
//! - [`reader`] - Row decoding
//! - [`writer`] - Row encoding

// Core modules
pub mod dialect;
pub mod error;

// Bytes
pub mod encoding;
pub mod stream;

// Codec
pub mod reader;
pub mod writer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, CsvResult, OpenMode};

// =============================================================================
// Re-exports - Dialect
// =============================================================================

pub use dialect::{Dialect, EnclosingMode, LineEnding, TranslitMode};

// =============================================================================
// Re-exports - Encoding
// =============================================================================

pub use encoding::{convert, detect_encoding, utf16_decode};

// =============================================================================
// Re-exports - Reader / Writer
// =============================================================================

pub use reader::{CsvReader, Row, Rows};
pub use writer::CsvWriter;
