//! Loosely typed option maps.
//!
//! Option keys are matched case-insensitively and the historical aliases
//! (`bom`, `skip_empty`, `eol`, ...) are folded onto one canonical key before
//! any value is read. Value coercion never fails: anything unusable yields
//! `None` and the caller substitutes its default.

use serde_json::{json, Map, Value};

// =============================================================================
// Canonical keys
// =============================================================================

pub(crate) const DELIMITER: &str = "delimiter";
pub(crate) const ENCLOSURE: &str = "enclosure";
pub(crate) const ESCAPE: &str = "escape";
pub(crate) const ESCAPE_DOUBLE: &str = "escape_double";
pub(crate) const ENCLOSING_MODE: &str = "enclosing_mode";
pub(crate) const EOL: &str = "eol";
pub(crate) const ENCODING: &str = "encoding";
pub(crate) const TRANSLIT: &str = "translit";
pub(crate) const BOM: &str = "bom";
pub(crate) const FORCE_ENCODING_DETECT: &str = "force_encoding_detect";
pub(crate) const SKIP_EMPTY: &str = "skip_empty";
pub(crate) const TRIM: &str = "trim";

/// Accepted spellings for each canonical key (already lowercase).
const KEY_ALIASES: &[(&str, &[&str])] = &[
    (DELIMITER, &["delimiter"]),
    (ENCLOSURE, &["enclosure"]),
    (ESCAPE, &["escape"]),
    (ESCAPE_DOUBLE, &["escape_double"]),
    (ENCLOSING_MODE, &["enclosing_mode"]),
    (EOL, &["eol", "line_ending", "line_endings"]),
    (ENCODING, &["encoding"]),
    (TRANSLIT, &["translit", "translit_mode"]),
    (BOM, &["bom", "use_bom"]),
    (
        FORCE_ENCODING_DETECT,
        &["force_encoding_detect", "force_encoding_detection"],
    ),
    (SKIP_EMPTY, &["skip_empty", "skip_empty_lines"]),
    (TRIM, &["trim", "trim_fields"]),
];

/// Fold user keys onto canonical keys. Unknown keys are dropped.
pub(crate) fn canonicalize(options: &Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for (key, value) in options {
        let lowered = key.trim().to_lowercase();
        let canonical = KEY_ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&lowered.as_str()))
            .map(|(canonical, _)| *canonical);

        if let Some(canonical) = canonical {
            cleaned.insert(canonical.to_string(), value.clone());
        }
    }
    cleaned
}

// =============================================================================
// Value coercion
// =============================================================================

/// A single ASCII character, or `None`.
pub(crate) fn as_char(value: &Value) -> Option<char> {
    let text = value.as_str()?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Some(c),
        _ => None,
    }
}

/// Boolean cast in the permissive style of the option maps this crate accepts.
pub(crate) fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// A non-empty string, or `None`.
pub(crate) fn as_text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

// =============================================================================
// Presets
// =============================================================================

/// Full option map of a named preset (`excel` or `unix`).
pub(crate) fn preset_options(name: &str) -> Option<Map<String, Value>> {
    let (delimiter, encoding, eol) = match name.trim().to_lowercase().as_str() {
        "excel" => (";", "CP1252", "\r\n"),
        "unix" => (",", "UTF-8", "\n"),
        _ => return None,
    };

    let preset = json!({
        DELIMITER: delimiter,
        ENCLOSURE: "\"",
        ENCODING: encoding,
        ENCLOSING_MODE: "minimal",
        EOL: eol,
        ESCAPE: "\\",
        ESCAPE_DOUBLE: true,
        BOM: false,
        TRANSLIT: "translit",
        FORCE_ENCODING_DETECT: false,
        SKIP_EMPTY: false,
        TRIM: false,
    });

    match preset {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
