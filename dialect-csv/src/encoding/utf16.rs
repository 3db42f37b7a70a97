//! Lenient UTF-16 to UTF-8 decoding.

/// Decode UTF-16 bytes to UTF-8.
///
/// A leading byte-order mark is consumed and overrides `big_endian`;
/// otherwise code units are read big-endian unless `big_endian` is false. Unpaired
/// surrogates become U+FFFD, U+2028 (line separator) becomes `\n` and an odd
/// trailing byte is dropped. Input shorter than one code unit is returned
/// unchanged.
pub fn utf16_decode(input: &[u8], big_endian: bool) -> Vec<u8> {
    if input.len() < 2 {
        return input.to_vec();
    }

    let (input, big_endian) = match input {
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        _ => (input, big_endian),
    };

    let units = input.chunks_exact(2).map(|pair| {
        let bytes = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        }
    });

    let mut output = String::with_capacity(input.len());
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok('\u{2028}') => output.push('\n'),
            Ok(c) => output.push(c),
            Err(_) => output.push(char::REPLACEMENT_CHARACTER),
        }
    }
    output.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian() {
        assert_eq!(utf16_decode(&[0x00, 0x41, 0x00, 0xE9], true), "Aé".as_bytes());
    }

    #[test]
    fn test_little_endian() {
        assert_eq!(utf16_decode(&[0x41, 0x00, 0xE9, 0x00], false), "Aé".as_bytes());
    }

    #[test]
    fn test_bom_overrides_endianness() {
        assert_eq!(utf16_decode(&[0xFF, 0xFE, 0x41, 0x00], true), b"A");
        assert_eq!(utf16_decode(&[0xFE, 0xFF, 0x00, 0x41], false), b"A");
    }

    #[test]
    fn test_surrogate_pair() {
        // U+1F600
        assert_eq!(utf16_decode(&[0xD8, 0x3D, 0xDE, 0x00], true), "\u{1F600}".as_bytes());
    }

    #[test]
    fn test_unpaired_surrogate() {
        assert_eq!(utf16_decode(&[0xDC, 0x00, 0x00, 0x41], true), "\u{FFFD}A".as_bytes());
    }

    #[test]
    fn test_line_separator() {
        assert_eq!(utf16_decode(&[0x20, 0x28, 0x00, 0x78], true), b"\nx");
    }

    #[test]
    fn test_short_and_odd_input() {
        assert_eq!(utf16_decode(b"", true), b"");
        assert_eq!(utf16_decode(b"x", true), b"x");
        assert_eq!(utf16_decode(&[0x00, 0x41, 0x42], true), b"A");
    }
}
