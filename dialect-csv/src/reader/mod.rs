//! CSV reader.
//!
//! A [`CsvReader`] binds one seekable byte source at a time and yields rows
//! of UTF-8 strings. It can be rewound ([`CsvReader::reset`]) and counted
//! ([`CsvReader::count`]) without losing its place.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use dialect_csv::{CsvReader, Dialect};
//!
//! let mut reader = CsvReader::new(Dialect::unix());
//! reader.open_source(Cursor::new("nom,age\nMartin,28\n")).unwrap();
//!
//! assert_eq!(reader.get_row().unwrap(), Some(vec!["nom".to_string(), "age".to_string()]));
//! assert_eq!(reader.get_rows().unwrap().len(), 2);
//! ```

mod tokenizer;

use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::dialect::Dialect;
use crate::encoding::{self, detect_encoding};
use crate::error::CsvResult;
use crate::stream::{self, ReadSeek};

use tokenizer::{RawRecord, Tokenizer};

/// One decoded row.
pub type Row = Vec<String>;

// =============================================================================
// Reader
// =============================================================================

pub struct CsvReader {
    dialect: Dialect,
    tokenizer: Tokenizer,
    /// `escape + enclosure` → `enclosure`, when escaping is not by doubling.
    unescape: Option<(String, String)>,
    filename: Option<PathBuf>,
    source: Option<BufReader<Box<dyn ReadSeek>>>,
    encoding: Option<String>,
    position: usize,
    at_start: bool,
    exhausted: bool,
}

impl CsvReader {
    pub fn new(dialect: Dialect) -> Self {
        let unescape = (!dialect.escape_double() && dialect.escape() != dialect.enclosure()).then(|| {
            let enclosure = dialect.enclosure().to_string();
            (format!("{}{}", dialect.escape(), enclosure), enclosure)
        });

        Self {
            tokenizer: Tokenizer::new(&dialect),
            dialect,
            unescape,
            filename: None,
            source: None,
            encoding: None,
            position: 0,
            at_start: true,
            exhausted: false,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Set the file opened by [`CsvReader::open_configured`] or implicitly
    /// by the first row request. Does not touch an already-bound source.
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

    /// Open `path` for reading, closing any previous source.
    pub fn open(&mut self, path: impl AsRef<Path>) -> CsvResult<()> {
        let path = path.as_ref();
        let file = stream::open_for_reading(path)?;
        self.filename = Some(path.to_path_buf());
        debug!("opened {} for reading", path.display());
        self.bind(Box::new(file))
    }

    /// Open the filename given to [`CsvReader::set_filename`].
    pub fn open_configured(&mut self) -> CsvResult<()> {
        let path = stream::require_filename(self.filename.as_deref())?.to_path_buf();
        self.open(path)
    }

    /// Bind any seekable byte source, closing any previous one.
    pub fn open_source<R: Read + Seek + 'static>(&mut self, source: R) -> CsvResult<()> {
        self.bind(Box::new(source))
    }

    fn bind(&mut self, source: Box<dyn ReadSeek>) -> CsvResult<()> {
        self.close();

        let mut source = BufReader::new(source);
        source.seek(SeekFrom::Start(0))?;

        let mut encoding = if self.dialect.force_encoding_detection() {
            let mut sample = Vec::new();
            source.read_to_end(&mut sample)?;
            source.seek(SeekFrom::Start(0))?;
            detect_encoding(&sample, self.dialect.encoding())
        } else {
            self.dialect.encoding().to_string()
        };

        // The tokenizer splits on ASCII bytes, so UTF-16 and other
        // non-ASCII-compatible sources are read as UTF-8 text.
        if encoding::resolve_encoding(&encoding).is_some_and(|e| !e.is_ascii_compatible()) {
            let mut raw = Vec::new();
            source.read_to_end(&mut raw)?;
            let utf8 = encoding::convert(&raw, &encoding, "UTF-8", self.dialect.translit()).into_owned();
            debug!("transcoded {} source ({} bytes) to UTF-8", encoding, raw.len());
            source = BufReader::new(Box::new(Cursor::new(utf8)) as Box<dyn ReadSeek>);
            encoding = "UTF-8".to_string();
        }
        debug!("reading with encoding {}", encoding);

        self.source = Some(source);
        self.encoding = Some(encoding);
        self.rewind_state();
        Ok(())
    }

    /// Release the source. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            debug!("closed CSV source");
        }
        self.encoding = None;
        self.rewind_state();
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Encoding fields are decoded from: the detected or configured one, or
    /// `UTF-8` when the source was transcoded at open.
    pub fn detected_encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Number of rows yielded since the last rewind.
    pub fn position(&self) -> usize {
        self.position
    }

    fn ensure_open(&mut self) -> CsvResult<()> {
        if self.source.is_none() {
            self.open_configured()?;
        }
        Ok(())
    }

    fn rewind_state(&mut self) {
        self.position = 0;
        self.at_start = true;
        self.exhausted = false;
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Decode the next row, `None` once the source is exhausted.
    pub fn decode_next_row(&mut self) -> CsvResult<Option<Row>> {
        self.ensure_open()?;

        while let Some(record) = self.next_record()? {
            let row = self.decode_record(record);
            if self.is_skipped(&row) {
                trace!("skipping empty record after row {}", self.position);
                continue;
            }
            self.position += 1;
            return Ok(Some(row));
        }
        Ok(None)
    }

    /// Alias of [`CsvReader::decode_next_row`].
    pub fn get_row(&mut self) -> CsvResult<Option<Row>> {
        self.decode_next_row()
    }

    /// Rewind to before the first row.
    pub fn reset(&mut self) -> CsvResult<()> {
        self.ensure_open()?;
        self.seek_source(0)?;
        self.rewind_state();
        Ok(())
    }

    /// Rewind, then iterate over every row.
    pub fn rows(&mut self) -> CsvResult<Rows<'_>> {
        self.reset()?;
        Ok(Rows {
            reader: self,
            done: false,
        })
    }

    /// Rewind and collect every row.
    pub fn get_rows(&mut self) -> CsvResult<Vec<Row>> {
        self.rows()?.collect()
    }

    /// Number of records a full read would yield.
    ///
    /// The caller's position in the source is preserved.
    pub fn count(&mut self) -> CsvResult<usize> {
        self.ensure_open()?;

        let offset = match self.source.as_mut() {
            Some(source) => source.stream_position()?,
            None => 0,
        };
        let saved = (self.position, self.at_start, self.exhausted);

        let counted = self.count_from_start();

        let restored = self.seek_source(offset);
        (self.position, self.at_start, self.exhausted) = saved;

        let count = counted?;
        restored?;
        Ok(count)
    }

    fn count_from_start(&mut self) -> CsvResult<usize> {
        self.seek_source(0)?;
        self.rewind_state();

        let mut count = 0;
        while let Some(record) = self.next_record()? {
            if !self.is_skipped(&self.decode_record(record)) {
                count += 1;
            }
        }
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn seek_source(&mut self, offset: u64) -> CsvResult<()> {
        if let Some(source) = self.source.as_mut() {
            source.seek(SeekFrom::Start(offset))?;
        }
        Ok(())
    }

    /// Next raw record, with the leading BOM removed from the first one.
    fn next_record(&mut self) -> CsvResult<Option<RawRecord>> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        if self.at_start {
            self.at_start = false;
            if self.dialect.use_bom() {
                skip_bom(source)?;
            }
        }

        let record = self.tokenizer.read_record(source)?;
        if record.is_none() {
            self.exhausted = true;
        }
        Ok(record)
    }

    /// Decoded rows dropped by `skip_empty_lines`.
    fn is_skipped(&self, row: &Row) -> bool {
        self.dialect.skip_empty_lines() && row.iter().all(String::is_empty)
    }

    fn decode_record(&self, record: RawRecord) -> Row {
        let from = self.encoding.as_deref().unwrap_or(self.dialect.encoding());
        let translit = self.dialect.translit();

        record
            .into_iter()
            .map(|bytes| {
                let utf8 = encoding::convert(&bytes, from, "UTF-8", translit);
                let mut value = String::from_utf8_lossy(&utf8).into_owned();
                if let Some((escaped, enclosure)) = &self.unescape {
                    value = value.replace(escaped.as_str(), enclosure);
                }
                if self.dialect.trim_fields() {
                    value = value.trim().to_string();
                }
                value
            })
            .collect()
    }
}

/// Move past one leading byte-order mark, however the source chunks its reads.
fn skip_bom<R: Read + Seek>(source: &mut R) -> io::Result<()> {
    let start = source.stream_position()?;
    let mut head = [0u8; 3];
    let mut filled = 0;
    while filled < head.len() {
        match source.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let bom_length = filled - encoding::strip_bom(&head[..filled]).len();
    source.seek(SeekFrom::Start(start + bom_length as u64))?;
    Ok(())
}

// =============================================================================
// Row iterator
// =============================================================================

/// Iterator returned by [`CsvReader::rows`]. Stops after the first error.
pub struct Rows<'a> {
    reader: &'a mut CsvReader,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = CsvResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.decode_next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Rows<'_> {}
