//! Phase 1: Reader
//!
//! The reader turns the input bytes into code points. It performs:
//! - Encoding detection (byte order mark, or the null-byte pattern of the
//!   first four bytes)
//! - Decoding of UTF-8, UTF-16LE/BE and UTF-32LE/BE
//! - Validation against the printable character set
//! - Position tracking (byte offset, line, column) for every code point

use crate::error::{Error, ErrorKind, Mark, Result};

/// Character encoding of the input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

/// Detect the encoding of `bytes`, returning it with the length of the
/// byte order mark (zero when absent).
pub fn detect_encoding(bytes: &[u8]) -> (Encoding, usize) {
    match bytes {
        [0x00, 0x00, 0xFE, 0xFF, ..] => (Encoding::Utf32Be, 4),
        [0x00, 0x00, 0x00, _, ..] => (Encoding::Utf32Be, 0),
        [0xFF, 0xFE, 0x00, 0x00, ..] => (Encoding::Utf32Le, 4),
        [_, 0x00, 0x00, 0x00, ..] => (Encoding::Utf32Le, 0),
        [0xFE, 0xFF, ..] => (Encoding::Utf16Be, 2),
        [0xFF, 0xFE, ..] => (Encoding::Utf16Le, 2),
        [0xEF, 0xBB, 0xBF, ..] => (Encoding::Utf8, 3),
        [0x00, _, ..] => (Encoding::Utf16Be, 0),
        [_, 0x00, ..] => (Encoding::Utf16Le, 0),
        _ => (Encoding::Utf8, 0),
    }
}

/// Decode `bytes` into text, dropping the byte order mark.
pub fn decode(bytes: &[u8]) -> Result<(String, Encoding)> {
    let (encoding, bom) = detect_encoding(bytes);
    let body = &bytes[bom..];
    let text = match encoding {
        Encoding::Utf8 => match std::str::from_utf8(body) {
            Ok(s) => s.to_string(),
            Err(e) => {
                // The prefix is valid by construction.
                let valid = String::from_utf8_lossy(&body[..e.valid_up_to()]);
                return Err(malformed(&valid, "invalid UTF-8 byte sequence"));
            }
        },
        Encoding::Utf16Le | Encoding::Utf16Be => decode_utf16(body, encoding)?,
        Encoding::Utf32Le | Encoding::Utf32Be => decode_utf32(body, encoding)?,
    };
    validate_code_points(&text)?;
    Ok((text, encoding))
}

fn decode_utf16(body: &[u8], encoding: Encoding) -> Result<String> {
    let units = body.chunks_exact(2).map(|pair| match encoding {
        Encoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
        _ => u16::from_be_bytes([pair[0], pair[1]]),
    });
    let mut text = String::new();
    for unit in char::decode_utf16(units) {
        match unit {
            Ok(ch) => text.push(ch),
            Err(_) => return Err(malformed(&text, "invalid UTF-16 code unit")),
        }
    }
    if body.len() % 2 != 0 {
        return Err(malformed(&text, "truncated UTF-16 code unit"));
    }
    Ok(text)
}

fn decode_utf32(body: &[u8], encoding: Encoding) -> Result<String> {
    let mut text = String::new();
    for quad in body.chunks(4) {
        let raw = match (quad, encoding) {
            ([a, b, c, d], Encoding::Utf32Le) => u32::from_le_bytes([*a, *b, *c, *d]),
            ([a, b, c, d], _) => u32::from_be_bytes([*a, *b, *c, *d]),
            _ => return Err(malformed(&text, "truncated UTF-32 code unit")),
        };
        match char::from_u32(raw) {
            Some(ch) => text.push(ch),
            None => return Err(malformed(&text, "invalid UTF-32 code point")),
        }
    }
    Ok(text)
}

/// Build a MalformedEncoding error positioned just past `decoded`.
fn malformed(decoded: &str, message: &str) -> Error {
    Error::new(ErrorKind::MalformedEncoding, message, end_mark(decoded))
}

/// The mark just past the end of `text`.
fn end_mark(text: &str) -> Mark {
    let mut reader = Reader::from_text(text);
    while !reader.is_eof() {
        reader.advance();
    }
    reader.mark()
}

/// Check whether a code point is in the printable set.
fn is_printable(cp: u32) -> bool {
    cp == 0x09
        || cp == 0x0A
        || cp == 0x0D
        || (0x20..=0x7E).contains(&cp)
        || cp == 0x85
        || (0xA0..=0xD7FF).contains(&cp)
        || (0xE000..=0xFFFD).contains(&cp)
        || (0x10000..=0x10FFFF).contains(&cp)
}

/// Validate that the text contains only printable code points.
fn validate_code_points(text: &str) -> Result<()> {
    let mut reader = Reader::from_text(text);
    while !reader.is_eof() {
        let ch = reader.peek();
        if !is_printable(ch as u32) {
            return Err(Error::new(
                ErrorKind::MalformedEncoding,
                format!("forbidden code point U+{:04X}", ch as u32),
                reader.mark(),
            ));
        }
        reader.advance();
    }
    Ok(())
}

/// A cursor over the decoded code points with position tracking.
///
/// Past the end of input, `peek` returns `'\0'`, which the printable set
/// excludes from real content.
#[derive(Debug, Clone)]
pub struct Reader {
    chars: Vec<char>,
    pos: usize,
    mark: Mark,
    col: usize,
    line_start: usize,
    encoding: Encoding,
}

impl Reader {
    /// Decode and validate `bytes`.
    pub fn new(bytes: &[u8]) -> Result<Self> {
        let (text, encoding) = decode(bytes)?;
        let mut reader = Self::from_text(&text);
        reader.encoding = encoding;
        Ok(reader)
    }

    /// A reader over already-validated text.
    fn from_text(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            mark: Mark::start(),
            col: 0,
            line_start: 0,
            encoding: Encoding::Utf8,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The current character.
    #[inline]
    pub fn peek(&self) -> char {
        self.peek_at(0)
    }

    /// The character `n` positions ahead.
    #[inline]
    pub fn peek_at(&self, n: usize) -> char {
        self.chars.get(self.pos + n).copied().unwrap_or('\0')
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Zero-based column of the current character.
    pub fn col(&self) -> usize {
        self.col
    }

    /// Index of the current character in code points.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Whether everything between the start of the line and the cursor is
    /// blank, so the cursor is still inside the line's indentation.
    pub fn at_line_indent(&self) -> bool {
        self.chars[self.line_start..self.pos]
            .iter()
            .all(|c| *c == ' ' || *c == '\t')
    }

    /// Whether the upcoming characters equal `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == c)
    }

    /// Move past the current character.
    pub fn advance(&mut self) {
        let Some(&ch) = self.chars.get(self.pos) else {
            return;
        };
        self.pos += 1;
        self.mark.index += ch.len_utf8();
        let is_line_break = ch == '\n' || (ch == '\r' && self.peek() != '\n');
        if is_line_break {
            self.mark.line += 1;
            self.mark.column = 1;
            self.col = 0;
            self.line_start = self.pos;
        } else {
            self.mark.column += 1;
            self.col += 1;
        }
    }

    /// Move past `n` characters.
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding(b"a: 1"), (Encoding::Utf8, 0));
        assert_eq!(detect_encoding(b"\xEF\xBB\xBFa"), (Encoding::Utf8, 3));
        assert_eq!(detect_encoding(b"\xFE\xFF\x00a"), (Encoding::Utf16Be, 2));
        assert_eq!(detect_encoding(b"\xFF\xFEa\x00"), (Encoding::Utf16Le, 2));
        assert_eq!(detect_encoding(b"\x00\x00\xFE\xFF"), (Encoding::Utf32Be, 4));
        assert_eq!(detect_encoding(b"\xFF\xFE\x00\x00"), (Encoding::Utf32Le, 4));
        assert_eq!(detect_encoding(b"a\x00b\x00"), (Encoding::Utf16Le, 0));
        assert_eq!(detect_encoding(b"\x00a\x00b"), (Encoding::Utf16Be, 0));
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "- a\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, encoding) = decode(&bytes).unwrap();
        assert_eq!(text, "- a\n");
        assert_eq!(encoding, Encoding::Utf16Le);
    }

    #[test]
    fn test_decode_utf32_be() {
        let mut bytes = vec![0x00, 0x00, 0xFE, 0xFF];
        for ch in "x: é".chars() {
            bytes.extend_from_slice(&(ch as u32).to_be_bytes());
        }
        let (text, encoding) = decode(&bytes).unwrap();
        assert_eq!(text, "x: é");
        assert_eq!(encoding, Encoding::Utf32Be);
    }

    #[test]
    fn test_invalid_utf8_position() {
        let err = decode(b"ab\ncd\xFF").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding);
        assert_eq!(err.mark().line, 2);
        assert_eq!(err.mark().column, 3);
    }

    #[test]
    fn test_forbidden_control_character() {
        let err = decode(b"a: \x07").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding);
        assert_eq!(err.mark().column, 4);
    }

    #[test]
    fn test_tabs_and_crlf_are_printable() {
        assert!(decode(b"a:\tb\r\n").is_ok());
    }

    #[test]
    fn test_positions() {
        let mut reader = Reader::new("ab\r\nc\u{e9}d".as_bytes()).unwrap();
        let mut marks: Vec<(char, usize, usize, usize)> = Vec::new();
        while !reader.is_eof() {
            let mark = reader.mark();
            marks.push((reader.peek(), mark.index, mark.line, mark.column));
            reader.advance();
        }
        assert_eq!(
            marks,
            vec![
                ('a', 0, 1, 1),
                ('b', 1, 1, 2),
                ('\r', 2, 1, 3),
                ('\n', 3, 1, 4),
                ('c', 4, 2, 1),
                ('\u{e9}', 5, 2, 2),
                ('d', 7, 2, 3),
            ]
        );
    }

    #[test]
    fn test_at_line_indent() {
        let mut reader = Reader::new(b"  \tx").unwrap();
        reader.skip(3);
        assert!(reader.at_line_indent());
        reader.advance();
        assert!(!reader.at_line_indent());
    }
}
