//! Character-encoding conversion and detection.
//!
//! [`convert`] runs a fixed, ordered chain of strategies. Each one either
//! produces the converted bytes or declines, and the chain always ends with
//! the identity strategy, so conversion never fails:
//!
//! ```text
//! ┌───────────────┐   ┌──────────────────┐   ┌────────────────┐   ┌──────────┐
//! │ WHATWG labels │──▶│ codepage aliases │──▶│ manual UTF-16  │──▶│ identity │
//! │ (encoding_rs) │   │ (CP1252, LATIN9) │   │ → UTF-8 decode │   │          │
//! └───────────────┘   └──────────────────┘   └────────────────┘   └──────────┘
//! ```
//!
//! The first two strategies decline when a name does not resolve, and, in
//! [`TranslitMode::None`], when the input holds malformed sequences or
//! characters the target encoding cannot represent.
//!
//! # Example
//!
//! ```rust
//! use dialect_csv::{convert, TranslitMode};
//!
//! let cp1252 = convert("Aurélie".as_bytes(), "UTF-8", "CP1252", TranslitMode::Transliterate);
//! assert_eq!(cp1252.as_ref(), b"Aur\xE9lie");
//! ```

mod detect;
mod translit;
mod utf16;

use std::borrow::Cow;

use encoding_rs::{DecoderResult, Encoding, EncoderResult};
use log::{trace, warn};

use crate::dialect::TranslitMode;

pub use detect::detect_encoding;
pub use utf16::utf16_decode;

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// =============================================================================
// Public API
// =============================================================================

/// Convert `input` from encoding `from` to encoding `to`.
///
/// Best-effort: when no strategy applies the input is returned unmodified.
pub fn convert<'a>(input: &'a [u8], from: &str, to: &str, mode: TranslitMode) -> Cow<'a, [u8]> {
    for strategy in STRATEGIES {
        if let Some(output) = strategy.convert(input, from, to, mode) {
            trace!("{} -> {} via {} ({} bytes)", from, to, strategy.name(), input.len());
            return output;
        }
    }
    Cow::Borrowed(input)
}

/// Resolve an encoding name, first as a WHATWG label then as a codepage alias.
pub fn resolve_encoding(name: &str) -> Option<&'static Encoding> {
    resolve_label(name).or_else(|| resolve_codepage(name))
}

/// Whether `name` designates UTF-8 (`UTF-8`, `utf8`, `CP65001`, ...).
pub fn is_utf8(name: &str) -> bool {
    resolve_encoding(name) == Some(encoding_rs::UTF_8)
}

/// Remove one leading byte-order mark (UTF-8, UTF-16LE or UTF-16BE).
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    match Encoding::for_bom(bytes) {
        Some((_, bom_length)) => &bytes[bom_length..],
        None => bytes,
    }
}

// =============================================================================
// Strategy chain
// =============================================================================

trait ConversionStrategy: Sync {
    fn name(&self) -> &'static str;

    /// `None` means "not applicable", letting the next strategy try.
    fn convert<'a>(
        &self,
        input: &'a [u8],
        from: &str,
        to: &str,
        mode: TranslitMode,
    ) -> Option<Cow<'a, [u8]>>;
}

static STRATEGIES: &[&dyn ConversionStrategy] =
    &[&LabelConverter, &CodepageConverter, &Utf16Fallback, &Identity];

/// Names understood by `encoding_rs` directly.
struct LabelConverter;

impl ConversionStrategy for LabelConverter {
    fn name(&self) -> &'static str {
        "label"
    }

    fn convert<'a>(
        &self,
        input: &'a [u8],
        from: &str,
        to: &str,
        mode: TranslitMode,
    ) -> Option<Cow<'a, [u8]>> {
        transcode(input, resolve_label(from)?, resolve_label(to)?, mode)
    }
}

/// Windows/IBM codepage names and common aliases `encoding_rs` does not know.
struct CodepageConverter;

impl ConversionStrategy for CodepageConverter {
    fn name(&self) -> &'static str {
        "codepage"
    }

    fn convert<'a>(
        &self,
        input: &'a [u8],
        from: &str,
        to: &str,
        mode: TranslitMode,
    ) -> Option<Cow<'a, [u8]>> {
        transcode(input, resolve_encoding(from)?, resolve_encoding(to)?, mode)
    }
}

/// Lenient UTF-16 to UTF-8 decoding for input the strict paths refused.
struct Utf16Fallback;

impl ConversionStrategy for Utf16Fallback {
    fn name(&self) -> &'static str {
        "utf16-fallback"
    }

    fn convert<'a>(
        &self,
        input: &'a [u8],
        from: &str,
        to: &str,
        _mode: TranslitMode,
    ) -> Option<Cow<'a, [u8]>> {
        if !is_utf8(to) {
            return None;
        }
        // Bare UTF-16/UCS-2 is unmarked UTF-16 here, big-endian unless a BOM
        // says otherwise. `resolve_codepage` maps the same names to UTF-16LE.
        let big_endian = match normalize_name(from).as_str() {
            "UTF16" | "UTF16BE" | "UCS2" | "UCS2BE" => true,
            "UTF16LE" | "UCS2LE" | "UNICODE" => false,
            _ => return None,
        };
        Some(Cow::Owned(utf16_decode(input, big_endian)))
    }
}

struct Identity;

impl ConversionStrategy for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn convert<'a>(
        &self,
        input: &'a [u8],
        from: &str,
        to: &str,
        _mode: TranslitMode,
    ) -> Option<Cow<'a, [u8]>> {
        if normalize_name(from) != normalize_name(to) {
            warn!("no conversion path from {} to {}, passing {} bytes through", from, to, input.len());
        }
        Some(Cow::Borrowed(input))
    }
}

// =============================================================================
// Transcoding
// =============================================================================

fn transcode<'a>(
    input: &'a [u8],
    from: &'static Encoding,
    to: &'static Encoding,
    mode: TranslitMode,
) -> Option<Cow<'a, [u8]>> {
    if input.is_ascii() && from.is_ascii_compatible() && to.is_ascii_compatible() {
        return Some(Cow::Borrowed(input));
    }
    if from == encoding_rs::UTF_8 && to == encoding_rs::UTF_8 && std::str::from_utf8(input).is_ok() {
        return Some(Cow::Borrowed(input));
    }

    let text = decode(input, from, mode)?;
    encode(&text, to, mode).map(Cow::Owned)
}

fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE
}

fn decode(input: &[u8], encoding: &'static Encoding, mode: TranslitMode) -> Option<String> {
    // UTF-16 input honours its BOM; other encodings leave BOM handling to the caller.
    let mut decoder = if is_utf16(encoding) {
        encoding.new_decoder()
    } else {
        encoding.new_decoder_without_bom_handling()
    };

    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(input.len())
        .unwrap_or(input.len());
    let mut output = String::with_capacity(capacity);
    let mut remaining = input;

    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(remaining, &mut output, true);
        remaining = &remaining[read..];

        match result {
            DecoderResult::InputEmpty => return Some(output),
            DecoderResult::OutputFull => {
                let needed = decoder
                    .max_utf8_buffer_length_without_replacement(remaining.len())
                    .unwrap_or(remaining.len() * 3 + 16);
                output.reserve(needed);
            }
            DecoderResult::Malformed(_, _) => match mode {
                TranslitMode::Transliterate => output.push(char::REPLACEMENT_CHARACTER),
                TranslitMode::Ignore => {}
                TranslitMode::None => return None,
            },
        }
    }
}

fn encode(text: &str, encoding: &'static Encoding, mode: TranslitMode) -> Option<Vec<u8>> {
    // encoding_rs only ever encodes UTF-16 as UTF-8, so those two are done by hand.
    if encoding == encoding_rs::UTF_8 {
        return Some(text.as_bytes().to_vec());
    }
    if encoding == encoding_rs::UTF_16LE {
        return Some(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == encoding_rs::UTF_16BE {
        return Some(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }

    let mut encoder = encoding.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .unwrap_or(text.len());
    let mut output = Vec::with_capacity(capacity);
    let mut remaining = text;

    loop {
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(remaining, &mut output, true);
        remaining = &remaining[read..];

        match result {
            EncoderResult::InputEmpty => return Some(output),
            EncoderResult::OutputFull => {
                let needed = encoder
                    .max_buffer_length_from_utf8_without_replacement(remaining.len())
                    .unwrap_or(remaining.len() * 4 + 16);
                output.reserve(needed);
            }
            EncoderResult::Unmappable(c) => match mode {
                // Substitutions are ASCII; stateful encoders (ISO-2022-JP) drop them.
                TranslitMode::Transliterate if encoding.is_ascii_compatible() => {
                    output.extend_from_slice(translit::approximate(c).as_bytes());
                }
                TranslitMode::Transliterate | TranslitMode::Ignore => {}
                TranslitMode::None => return None,
            },
        }
    }
}

// =============================================================================
// Name resolution
// =============================================================================

/// Uppercase ASCII alphanumerics only: `iso-8859_15` → `ISO885915`.
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn resolve_label(name: &str) -> Option<&'static Encoding> {
    Encoding::for_label(name.trim().as_bytes()).filter(|e| *e != encoding_rs::REPLACEMENT)
}

fn resolve_codepage(name: &str) -> Option<&'static Encoding> {
    use encoding_rs::*;

    let normalized = normalize_name(name);
    let named = match normalized.as_str() {
        "UTF8" => Some(UTF_8),
        "UTF16" | "UTF16LE" | "UCS2" | "UCS2LE" | "UNICODE" => Some(UTF_16LE),
        "UTF16BE" | "UCS2BE" => Some(UTF_16BE),
        "ASCII" | "USASCII" | "ANSI" | "LATIN1" => Some(WINDOWS_1252),
        "LATIN2" => Some(ISO_8859_2),
        "LATIN9" => Some(ISO_8859_15),
        "MAC" | "MACROMAN" | "MACINTOSH" => Some(MACINTOSH),
        "SJIS" | "SHIFTJIS" => Some(SHIFT_JIS),
        "EUCJP" => Some(EUC_JP),
        "EUCKR" => Some(EUC_KR),
        "KOI8R" => Some(KOI8_R),
        "KOI8U" => Some(KOI8_U),
        "BIG5" => Some(BIG5),
        "GB2312" | "GBK" => Some(GBK),
        "GB18030" => Some(GB18030),
        _ => None,
    };
    if named.is_some() {
        return named;
    }

    if let Some(part) = normalized.strip_prefix("ISO8859") {
        return iso_8859(part.parse().ok()?);
    }

    let number = ["CP", "WINDOWS", "WIN", "MS", "IBM"]
        .iter()
        .find_map(|prefix| normalized.strip_prefix(prefix))?;
    codepage(number.parse().ok()?)
}

fn iso_8859(part: u32) -> Option<&'static Encoding> {
    use encoding_rs::*;

    match part {
        1 => Some(WINDOWS_1252),
        2 => Some(ISO_8859_2),
        3 => Some(ISO_8859_3),
        4 => Some(ISO_8859_4),
        5 => Some(ISO_8859_5),
        6 => Some(ISO_8859_6),
        7 => Some(ISO_8859_7),
        8 => Some(ISO_8859_8),
        9 => Some(WINDOWS_1254),
        10 => Some(ISO_8859_10),
        11 => Some(WINDOWS_874),
        13 => Some(ISO_8859_13),
        14 => Some(ISO_8859_14),
        15 => Some(ISO_8859_15),
        16 => Some(ISO_8859_16),
        _ => None,
    }
}

/// Windows codepage numbers.
fn codepage(number: u32) -> Option<&'static Encoding> {
    use encoding_rs::*;

    match number {
        866 => Some(IBM866),
        874 => Some(WINDOWS_874),
        932 => Some(SHIFT_JIS),
        936 => Some(GBK),
        949 => Some(EUC_KR),
        950 => Some(BIG5),
        1200 => Some(UTF_16LE),
        1201 => Some(UTF_16BE),
        1250 => Some(WINDOWS_1250),
        1251 => Some(WINDOWS_1251),
        1252 => Some(WINDOWS_1252),
        1253 => Some(WINDOWS_1253),
        1254 => Some(WINDOWS_1254),
        1255 => Some(WINDOWS_1255),
        1256 => Some(WINDOWS_1256),
        1257 => Some(WINDOWS_1257),
        1258 => Some(WINDOWS_1258),
        10000 => Some(MACINTOSH),
        10007 => Some(X_MAC_CYRILLIC),
        20866 => Some(KOI8_R),
        20932 => Some(EUC_JP),
        21866 => Some(KOI8_U),
        28591 => Some(WINDOWS_1252),
        28592..=28616 => iso_8859(number - 28590),
        50220 => Some(ISO_2022_JP),
        54936 => Some(GB18030),
        65001 => Some(UTF_8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_to_cp1252() {
        let out = convert("Aurélie".as_bytes(), "UTF-8", "CP1252", TranslitMode::Transliterate);
        assert_eq!(out.as_ref(), b"Aur\xE9lie");
    }

    #[test]
    fn test_cp1252_to_utf8() {
        let out = convert(b"Bousquet;In\xE8s", "CP1252", "UTF-8", TranslitMode::Transliterate);
        assert_eq!(out.as_ref(), "Bousquet;Inès".as_bytes());
    }

    #[test]
    fn test_ascii_is_borrowed() {
        let out = convert(b"plain ascii", "CP1252", "UTF-8", TranslitMode::None);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_codepage_aliases() {
        let expected = b"caf\xE9".to_vec();
        for name in ["WINDOWS1252", "CP-1252", "win1252", "LATIN-1", "ISO8859_1"] {
            let out = convert("café".as_bytes(), "utf8", name, TranslitMode::None);
            assert_eq!(out.as_ref(), expected.as_slice(), "alias {}", name);
        }
        assert_eq!(resolve_encoding("ISO8859_15"), Some(encoding_rs::ISO_8859_15));
        assert_eq!(resolve_encoding("CP65001"), Some(encoding_rs::UTF_8));
        assert_eq!(resolve_encoding("EBCDIC-037"), None);
    }

    #[test]
    fn test_unmappable_characters_follow_translit_mode() {
        let input = "Łódź".as_bytes();

        let translit = convert(input, "UTF-8", "CP1252", TranslitMode::Transliterate);
        assert_eq!(translit.as_ref(), b"L\xF3dz");

        let ignore = convert(input, "UTF-8", "CP1252", TranslitMode::Ignore);
        assert_eq!(ignore.as_ref(), b"\xF3d");

        // Strict conversion declines and the identity strategy passes the input through.
        let none = convert(input, "UTF-8", "CP1252", TranslitMode::None);
        assert_eq!(none.as_ref(), input);
    }

    #[test]
    fn test_malformed_input_follow_translit_mode() {
        let input: &[u8] = b"ab\xFFcd";
        assert_eq!(
            convert(input, "UTF-8", "UTF-8", TranslitMode::Transliterate).as_ref(),
            "ab\u{FFFD}cd".as_bytes()
        );
        assert_eq!(convert(input, "UTF-8", "UTF-8", TranslitMode::Ignore).as_ref(), b"abcd");
        assert_eq!(convert(input, "UTF-8", "UTF-8", TranslitMode::None).as_ref(), input);
    }

    #[test]
    fn test_utf16_round_trip() {
        let le = convert("prénom".as_bytes(), "UTF-8", "UTF-16LE", TranslitMode::None);
        assert_eq!(&le[..4], &[b'p', 0, b'r', 0]);
        let back = convert(&le, "UTF-16LE", "UTF-8", TranslitMode::None);
        assert_eq!(back.as_ref(), "prénom".as_bytes());

        let be = convert("ok".as_bytes(), "UTF-8", "UTF-16BE", TranslitMode::None);
        assert_eq!(be.as_ref(), &[0, b'o', 0, b'k']);
    }

    #[test]
    fn test_malformed_utf16_uses_manual_decoder() {
        // Lone high surrogate: the strict path declines, the manual decoder substitutes.
        let input: &[u8] = &[0x00, 0x61, 0xD8, 0x00, 0x00, 0x62];
        let out = convert(input, "UTF-16BE", "UTF-8", TranslitMode::None);
        assert_eq!(out.as_ref(), "a\u{FFFD}b".as_bytes());
    }

    #[test]
    fn test_bare_utf16_name_is_little_endian_unless_malformed() {
        let well_formed: &[u8] = &[0x61, 0x00, 0x62, 0x00];
        assert_eq!(convert(well_formed, "UTF-16", "UTF-8", TranslitMode::None).as_ref(), b"ab");

        // A lone surrogate when read little-endian sends this to the manual
        // decoder, which reads big-endian.
        let malformed: &[u8] = &[0x00, 0x61, 0x00, 0xD8, 0x00, 0x62];
        let out = convert(malformed, "UCS-2", "UTF-8", TranslitMode::None);
        assert_eq!(out.as_ref(), "aØb".as_bytes());
    }

    #[test]
    fn test_unknown_encoding_passes_through() {
        let out = convert(b"caf\xE9", "EBCDIC-037", "UTF-8", TranslitMode::Transliterate);
        assert_eq!(out.as_ref(), b"caf\xE9");
    }

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8("UTF-8"));
        assert!(is_utf8("utf8"));
        assert!(is_utf8(" UTF-8 "));
        assert!(!is_utf8("CP1252"));
        assert!(!is_utf8("UTF-16LE"));
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(b"\xEF\xBB\xBFnom"), b"nom");
        assert_eq!(strip_bom(b"\xEF\xBB\xBF\xEF\xBB\xBFnom"), b"\xEF\xBB\xBFnom");
        assert_eq!(strip_bom(b"\xFF\xFEn\x00"), b"n\x00");
        assert_eq!(strip_bom(b"nom"), b"nom");
    }
}
