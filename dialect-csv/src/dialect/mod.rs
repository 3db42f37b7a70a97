//! CSV dialect: the shared configuration of a reader and a writer.
//!
//! A [`Dialect`] describes one CSV variant: delimiter, enclosure and escape
//! characters, quoting policy, line ending, character encoding, and the
//! text-cleanup flags. It is built from a loosely typed option map and never
//! rejects input: every missing or unusable option falls back to its default.
//!
//! | Option | Default |
//! |---|---|
//! | `delimiter` | `;` |
//! | `enclosure` | `"` |
//! | `escape` | `\` |
//! | `escape_double` | `true` |
//! | `enclosing_mode` | `minimal` |
//! | `eol` | `\r\n` |
//! | `encoding` | `CP1252` |
//! | `translit` | `translit` |
//! | `bom` | `false` |
//! | `force_encoding_detect` | `false` |
//! | `skip_empty` | `false` |
//! | `trim` | `false` |
//!
//! # Example
//!
//! ```rust
//! use dialect_csv::{Dialect, LineEnding};
//! use serde_json::json;
//!
//! let options = json!({ "delimiter": ",", "eol": "unix", "encoding": "UTF-8" });
//! let dialect = Dialect::new(options.as_object().unwrap());
//!
//! assert_eq!(dialect.delimiter(), ',');
//! assert_eq!(dialect.line_ending(), LineEnding::Lf);
//! assert_eq!(dialect.enclosure(), '"');
//! ```

mod options;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::CsvResult;

pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_ENCLOSURE: char = '"';
pub const DEFAULT_ESCAPE: char = '\\';
pub const DEFAULT_ENCODING: &str = "CP1252";

// =============================================================================
// Enclosing Mode
// =============================================================================

/// Which fields the writer wraps in enclosure characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnclosingMode {
    /// Every field.
    All,
    /// Only fields containing the delimiter, the enclosure or a line break.
    #[default]
    Minimal,
    /// Every field that is not a plain decimal number.
    NonNumeric,
}

impl EnclosingMode {
    /// Parse a mode name (`all`, `minimal`, `nonnumeric`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "all" => Some(Self::All),
            "minimal" => Some(Self::Minimal),
            "nonnumeric" | "non_numeric" | "non-numeric" => Some(Self::NonNumeric),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Minimal => "minimal",
            Self::NonNumeric => "nonnumeric",
        }
    }
}

// =============================================================================
// Line Ending
// =============================================================================

/// Record terminator written by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style (`\n`)
    Lf,
    /// Mac classic (`\r`)
    Cr,
    /// Windows-style (`\r\n`)
    #[default]
    Crlf,
}

impl LineEnding {
    /// Map a free-text alias or the raw characters to a line ending.
    ///
    /// Anything unrecognised is CRLF.
    pub fn from_alias(alias: &str) -> Self {
        match alias {
            "\n" => return Self::Lf,
            "\r" => return Self::Cr,
            "\r\n" => return Self::Crlf,
            _ => {}
        }

        match alias.trim().to_lowercase().as_str() {
            "unix" | "linux" | "lf" => Self::Lf,
            "mac" | "macos" | "cr" => Self::Cr,
            _ => Self::Crlf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Cr => "\r",
            Self::Crlf => "\r\n",
        }
    }
}

// =============================================================================
// Transliteration Mode
// =============================================================================

/// What the encoder does with a character the target encoding cannot hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslitMode {
    /// Substitute an approximation (`é` → `e`, `œ` → `oe`, otherwise `?`).
    #[default]
    Transliterate,
    /// Drop the character.
    Ignore,
    /// No special handling: the conversion path gives up on such input.
    None,
}

impl TranslitMode {
    /// Parse a mode name. Unrecognised names mean [`TranslitMode::None`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "translit" | "transliterate" => Self::Transliterate,
            "ignore" => Self::Ignore,
            _ => Self::None,
        }
    }

    /// Option-map spelling; `None` for [`TranslitMode::None`].
    pub fn as_name(&self) -> Option<&'static str> {
        match self {
            Self::Transliterate => Some("translit"),
            Self::Ignore => Some("ignore"),
            Self::None => None,
        }
    }
}

// =============================================================================
// Dialect
// =============================================================================

/// Validated, immutable CSV configuration shared by reader and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    delimiter: char,
    enclosure: char,
    escape: char,
    escape_double: bool,
    enclosing_mode: EnclosingMode,
    line_ending: LineEnding,
    encoding: String,
    translit: TranslitMode,
    use_bom: bool,
    force_encoding_detection: bool,
    skip_empty_lines: bool,
    trim_fields: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            enclosure: DEFAULT_ENCLOSURE,
            escape: DEFAULT_ESCAPE,
            escape_double: true,
            enclosing_mode: EnclosingMode::Minimal,
            line_ending: LineEnding::Crlf,
            encoding: DEFAULT_ENCODING.to_string(),
            translit: TranslitMode::Transliterate,
            use_bom: false,
            force_encoding_detection: false,
            skip_empty_lines: false,
            trim_fields: false,
        }
    }
}

impl Dialect {
    /// Build a dialect from an option map. Never fails.
    pub fn new(options: &Map<String, Value>) -> Self {
        let options = options::canonicalize(options);
        let mut dialect = Self::default();

        if let Some(c) = options.get(options::DELIMITER).and_then(options::as_char) {
            dialect.delimiter = c;
        }
        if let Some(c) = options.get(options::ENCLOSURE).and_then(options::as_char) {
            dialect.enclosure = c;
        }
        if let Some(c) = options.get(options::ESCAPE).and_then(options::as_char) {
            dialect.escape = c;
        }
        if let Some(value) = options.get(options::ESCAPE_DOUBLE) {
            dialect.escape_double = options::as_bool(value);
        }
        if let Some(mode) = options
            .get(options::ENCLOSING_MODE)
            .and_then(Value::as_str)
            .and_then(EnclosingMode::from_name)
        {
            dialect.enclosing_mode = mode;
        }
        if let Some(eol) = options.get(options::EOL).and_then(Value::as_str) {
            dialect.line_ending = LineEnding::from_alias(eol);
        }
        if let Some(encoding) = options.get(options::ENCODING).and_then(options::as_text) {
            dialect.encoding = encoding.trim().to_string();
        }
        if let Some(value) = options.get(options::TRANSLIT) {
            dialect.translit = value
                .as_str()
                .map(TranslitMode::from_name)
                .unwrap_or(TranslitMode::None);
        }
        if let Some(value) = options.get(options::BOM) {
            dialect.use_bom = options::as_bool(value);
        }
        if let Some(value) = options.get(options::FORCE_ENCODING_DETECT) {
            dialect.force_encoding_detection = options::as_bool(value);
        }
        if let Some(value) = options.get(options::SKIP_EMPTY) {
            dialect.skip_empty_lines = options::as_bool(value);
        }
        if let Some(value) = options.get(options::TRIM) {
            dialect.trim_fields = options::as_bool(value);
        }

        dialect
    }

    /// Excel flavour: `;`, CP1252, CRLF.
    pub fn excel() -> Self {
        Self::preset("excel").unwrap_or_default()
    }

    /// Unix flavour: `,`, UTF-8, LF.
    pub fn unix() -> Self {
        Self::preset("unix").unwrap_or_default()
    }

    /// Dialect for a preset name, case-insensitive.
    pub fn preset(name: &str) -> Option<Self> {
        options::preset_options(name).map(|map| Self::new(&map))
    }

    /// Full option map of a preset; empty for unknown names.
    pub fn default_options(preset: &str) -> Map<String, Value> {
        options::preset_options(preset).unwrap_or_default()
    }

    /// Parse a dialect from a JSON object.
    ///
    /// Only malformed JSON or a non-object document is an error; the options
    /// themselves are as permissive as [`Dialect::new`].
    pub fn from_json_str(text: &str) -> CsvResult<Self> {
        let map: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self::new(&map))
    }

    /// Canonical option map of this dialect. Feeding it back to
    /// [`Dialect::new`] yields an equal dialect.
    pub fn options(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(options::DELIMITER.into(), self.delimiter.to_string().into());
        map.insert(options::ENCLOSURE.into(), self.enclosure.to_string().into());
        map.insert(options::ENCODING.into(), self.encoding.clone().into());
        map.insert(
            options::ENCLOSING_MODE.into(),
            self.enclosing_mode.as_str().into(),
        );
        map.insert(options::EOL.into(), self.line_ending.as_str().into());
        map.insert(options::ESCAPE.into(), self.escape.to_string().into());
        map.insert(options::ESCAPE_DOUBLE.into(), self.escape_double.into());
        map.insert(options::BOM.into(), self.use_bom.into());
        map.insert(
            options::TRANSLIT.into(),
            self.translit.as_name().map_or(Value::Null, Value::from),
        );
        map.insert(
            options::FORCE_ENCODING_DETECT.into(),
            self.force_encoding_detection.into(),
        );
        map.insert(options::SKIP_EMPTY.into(), self.skip_empty_lines.into());
        map.insert(options::TRIM.into(), self.trim_fields.into());
        map
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn enclosure(&self) -> char {
        self.enclosure
    }

    pub fn escape(&self) -> char {
        self.escape
    }

    pub fn escape_double(&self) -> bool {
        self.escape_double
    }

    pub fn enclosing_mode(&self) -> EnclosingMode {
        self.enclosing_mode
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn translit(&self) -> TranslitMode {
        self.translit
    }

    pub fn use_bom(&self) -> bool {
        self.use_bom
    }

    pub fn force_encoding_detection(&self) -> bool {
        self.force_encoding_detection
    }

    pub fn skip_empty_lines(&self) -> bool {
        self.skip_empty_lines
    }

    pub fn trim_fields(&self) -> bool {
        self.trim_fields
    }

    // Raw bytes used by the tokenizer. The characters are ASCII by construction.

    pub(crate) fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub(crate) fn enclosure_byte(&self) -> u8 {
        self.enclosure as u8
    }

    pub(crate) fn escape_byte(&self) -> u8 {
        self.escape as u8
    }

    // -------------------------------------------------------------------------
    // Builder-style setters
    // -------------------------------------------------------------------------

    /// Non-ASCII characters fall back to `;`.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = ascii_or(delimiter, DEFAULT_DELIMITER);
        self
    }

    /// Non-ASCII characters fall back to `"`.
    pub fn with_enclosure(mut self, enclosure: char) -> Self {
        self.enclosure = ascii_or(enclosure, DEFAULT_ENCLOSURE);
        self
    }

    /// Non-ASCII characters fall back to `\`.
    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = ascii_or(escape, DEFAULT_ESCAPE);
        self
    }

    pub fn with_escape_double(mut self, escape_double: bool) -> Self {
        self.escape_double = escape_double;
        self
    }

    pub fn with_enclosing_mode(mut self, mode: EnclosingMode) -> Self {
        self.enclosing_mode = mode;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// An empty name falls back to `CP1252`.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        let encoding = encoding.into();
        self.encoding = if encoding.trim().is_empty() {
            DEFAULT_ENCODING.to_string()
        } else {
            encoding.trim().to_string()
        };
        self
    }

    pub fn with_translit(mut self, translit: TranslitMode) -> Self {
        self.translit = translit;
        self
    }

    pub fn with_use_bom(mut self, use_bom: bool) -> Self {
        self.use_bom = use_bom;
        self
    }

    pub fn with_force_encoding_detection(mut self, force: bool) -> Self {
        self.force_encoding_detection = force;
        self
    }

    pub fn with_skip_empty_lines(mut self, skip: bool) -> Self {
        self.skip_empty_lines = skip;
        self
    }

    pub fn with_trim_fields(mut self, trim: bool) -> Self {
        self.trim_fields = trim;
        self
    }
}

fn ascii_or(c: char, default: char) -> char {
    if c.is_ascii() {
        c
    } else {
        default
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Dialect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.options().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dialect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::new(&map))
    }
}
