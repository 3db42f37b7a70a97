//! Encoding detection for CSV sources.

use encoding_rs::Encoding;
use log::debug;

use super::resolve_encoding;

/// Below this chardet confidence the caller's fallback wins.
const MIN_CONFIDENCE: f32 = 0.25;

/// Guess the encoding of `sample`, returning an `encoding_rs` name.
///
/// A byte-order mark is authoritative. Pure ASCII cannot be told apart from
/// any ASCII-compatible encoding, so it keeps `fallback`. Valid UTF-8 is
/// reported as such, and anything else goes through chardet.
pub fn detect_encoding(sample: &[u8], fallback: &str) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding.name().to_string();
    }
    if sample.is_ascii() {
        return fallback.to_string();
    }
    if std::str::from_utf8(sample).is_ok() {
        return encoding_rs::UTF_8.name().to_string();
    }

    let (charset, confidence, _) = chardet::detect(sample);
    debug!("chardet guessed {:?} with confidence {:.2}", charset, confidence);
    if charset.is_empty() || confidence < MIN_CONFIDENCE {
        return fallback.to_string();
    }

    match resolve_encoding(chardet::charset2encoding(&charset)) {
        Some(encoding) => encoding.name().to_string(),
        None => fallback.to_string(),
    }
}
