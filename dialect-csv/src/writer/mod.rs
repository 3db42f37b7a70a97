//! CSV writer.
//!
//! Rows are encoded as UTF-8 text, then converted to the dialect's encoding
//! line by line. Output to files is buffered and flushed on
//! [`CsvWriter::close`] or drop.
//!
//! # Example
//!
//! ```rust
//! use dialect_csv::{CsvWriter, Dialect};
//!
//! let writer = CsvWriter::new(Dialect::unix());
//! assert_eq!(writer.encode_row(["Martin", "Durand", "28,5"]), b"Martin,Durand,\"28,5\"\n");
//! ```

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::{Dialect, EnclosingMode};
use crate::encoding::{self, UTF8_BOM};
use crate::error::CsvResult;
use crate::stream;

/// Fields left bare in NONNUMERIC mode.
static NUMERIC: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").ok());

fn is_numeric(field: &str) -> bool {
    NUMERIC.as_ref().is_some_and(|re| re.is_match(field))
}

// =============================================================================
// Writer
// =============================================================================

pub struct CsvWriter {
    dialect: Dialect,
    filename: Option<PathBuf>,
    sink: Option<Box<dyn Write>>,
}

impl CsvWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            filename: None,
            sink: None,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Set the file created by [`CsvWriter::open_configured`] or implicitly
    /// by the first [`CsvWriter::write_row`].
    pub fn set_filename(&mut self, filename: impl Into<PathBuf>) -> &mut Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    // -------------------------------------------------------------------------
    // Binding
    // -------------------------------------------------------------------------

    /// Create or truncate `path`, closing any previous sink.
    pub fn open(&mut self, path: impl AsRef<Path>) -> CsvResult<()> {
        let path = path.as_ref();
        self.close()?;
        let file = stream::open_for_writing(path)?;
        self.filename = Some(path.to_path_buf());
        debug!("opened {} for writing", path.display());
        self.bind(Box::new(BufWriter::new(file)))
    }

    pub fn open_configured(&mut self) -> CsvResult<()> {
        let path = stream::require_filename(self.filename.as_deref())?.to_path_buf();
        self.open(path)
    }

    /// Write to any byte sink, closing any previous one.
    pub fn open_sink<W: Write + 'static>(&mut self, sink: W) -> CsvResult<()> {
        self.bind(Box::new(sink))
    }

    fn bind(&mut self, mut sink: Box<dyn Write>) -> CsvResult<()> {
        self.close()?;

        if self.dialect.use_bom() && encoding::is_utf8(self.dialect.encoding()) {
            sink.write_all(UTF8_BOM)?;
        }
        self.sink = Some(sink);
        Ok(())
    }

    /// Flush and release the sink. Closing twice is a no-op.
    pub fn close(&mut self) -> CsvResult<()> {
        if let Some(mut sink) = self.sink.take() {
            sink.flush()?;
            debug!("closed CSV sink");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    pub fn flush(&mut self) -> CsvResult<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Encode one row, line ending included, in the dialect's encoding.
    pub fn encode_row<I, S>(&self, fields: I) -> Vec<u8>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let delimiter = self.dialect.delimiter().to_string();
        let mut line = fields
            .into_iter()
            .map(|field| self.encode_field(field.as_ref()))
            .collect::<Vec<_>>()
            .join(&delimiter);
        line.push_str(self.dialect.line_ending().as_str());

        encoding::convert(
            line.as_bytes(),
            "UTF-8",
            self.dialect.encoding(),
            self.dialect.translit(),
        )
        .into_owned()
    }

    fn encode_field(&self, field: &str) -> String {
        let field = if self.dialect.trim_fields() {
            field.trim()
        } else {
            field
        };

        let enclosure = self.dialect.enclosure();
        let escaped_enclosure = if self.dialect.escape_double() {
            format!("{}{}", enclosure, enclosure)
        } else {
            format!("{}{}", self.dialect.escape(), enclosure)
        };
        let escaped = field.replace(enclosure, &escaped_enclosure);

        let wrap = match self.dialect.enclosing_mode() {
            EnclosingMode::All => true,
            EnclosingMode::Minimal => {
                escaped.contains([self.dialect.delimiter(), enclosure, '\r', '\n'])
            }
            EnclosingMode::NonNumeric => !is_numeric(&escaped),
        };

        if wrap {
            format!("{}{}{}", enclosure, escaped, enclosure)
        } else {
            escaped
        }
    }

    /// Encode and write one row, opening the configured file if needed.
    pub fn write_row<I, S>(&mut self, fields: I) -> CsvResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.sink.is_none() {
            self.open_configured()?;
        }
        let line = self.encode_row(fields);
        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(&line)?;
        }
        Ok(())
    }

    pub fn write_rows<R, I, S>(&mut self, rows: R) -> CsvResult<()>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Headers for serving a CSV download named `filename`.
    pub fn http_headers(filename: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", "application/csv".to_string()),
            (
                "Content-Disposition",
                format!("attachment;filename=\"{}\"", filename),
            ),
        ]
    }
}

impl Drop for CsvWriter {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.flush() {
                warn!("failed to flush CSV sink on drop: {}", e);
            }
        }
    }
}
