//! Byte-level record splitter.
//!
//! Works on raw bytes before any encoding conversion, which is why the
//! dialect's control characters are restricted to ASCII. Fields come out
//! with enclosures removed and doubled enclosures collapsed; escape-prefixed
//! enclosures are kept verbatim for the reader to unescape.
//!
//! ```text
//!              enclosure                   enclosure
//! FieldStart ────────────▶ Quoted ◀──────────────────── QuoteInQuoted
//!   │    ▲                 │   ▲ │ enclosure                 │
//!   │    │ delimiter       │   │ └──────────────────────────▶│
//!   ▼    │          escape │   │ any byte                    │ other byte
//! Unquoted ◀───────────────┼───┼─────────────────────────────┘
//!                          ▼   │
//!                         Escaped
//! ```

use std::io::{self, BufRead};

use crate::dialect::Dialect;

/// One physical record, fields still in the source encoding.
pub(crate) type RawRecord = Vec<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
    Escaped,
}

#[derive(Debug, Clone)]
pub(crate) struct Tokenizer {
    delimiter: u8,
    enclosure: u8,
    escape: Option<u8>,
}

impl Tokenizer {
    pub(crate) fn new(dialect: &Dialect) -> Self {
        let escape = (!dialect.escape_double() && dialect.escape() != dialect.enclosure())
            .then(|| dialect.escape_byte());

        Self {
            delimiter: dialect.delimiter_byte(),
            enclosure: dialect.enclosure_byte(),
            escape,
        }
    }

    /// Read the next record, `None` at end of input.
    ///
    /// Trailing whitespace after the last line break is not a record.
    pub(crate) fn read_record<R: BufRead>(&self, input: &mut R) -> io::Result<Option<RawRecord>> {
        let mut fields = Vec::new();
        let mut field = Vec::new();
        let mut state = State::FieldStart;
        let mut consumed = false;

        while let Some(byte) = next_byte(input)? {
            consumed = true;

            match state {
                State::FieldStart | State::Unquoted => {
                    if byte == self.delimiter {
                        fields.push(std::mem::take(&mut field));
                        state = State::FieldStart;
                    } else if is_line_break(byte) {
                        end_line(input, byte)?;
                        fields.push(field);
                        return Ok(Some(fields));
                    } else if byte == self.enclosure && state == State::FieldStart {
                        state = State::Quoted;
                    } else {
                        field.push(byte);
                        state = State::Unquoted;
                    }
                }
                State::Quoted => {
                    if Some(byte) == self.escape {
                        field.push(byte);
                        state = State::Escaped;
                    } else if byte == self.enclosure {
                        state = State::QuoteInQuoted;
                    } else {
                        field.push(byte);
                    }
                }
                State::Escaped => {
                    field.push(byte);
                    state = State::Quoted;
                }
                State::QuoteInQuoted => {
                    if byte == self.enclosure {
                        field.push(byte);
                        state = State::Quoted;
                    } else if byte == self.delimiter {
                        fields.push(std::mem::take(&mut field));
                        state = State::FieldStart;
                    } else if is_line_break(byte) {
                        end_line(input, byte)?;
                        fields.push(field);
                        return Ok(Some(fields));
                    } else {
                        // Text after a closing enclosure is kept as-is.
                        field.push(byte);
                        state = State::Unquoted;
                    }
                }
            }
        }

        if !consumed {
            return Ok(None);
        }

        let unquoted = matches!(state, State::FieldStart | State::Unquoted);
        if fields.is_empty() && unquoted && field.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        // An unterminated enclosure runs to end of input.
        fields.push(field);
        Ok(Some(fields))
    }
}

fn is_line_break(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Swallow the LF of a CRLF pair.
fn end_line<R: BufRead>(input: &mut R, byte: u8) -> io::Result<()> {
    if byte == b'\r' && peek_byte(input)? == Some(b'\n') {
        input.consume(1);
    }
    Ok(())
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    let byte = peek_byte(input)?;
    if byte.is_some() {
        input.consume(1);
    }
    Ok(byte)
}

fn peek_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    loop {
        match input.fill_buf() {
            Ok(buffer) => return Ok(buffer.first().copied()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
