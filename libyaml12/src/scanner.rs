//! Phase 2: Scanner
//!
//! The scanner converts code points into tokens. It tracks:
//! - An indentation stack, emitting block collection starts and block ends
//!   as the column of significant lines changes
//! - The flow nesting depth (unclosed `[` and `{`)
//! - One possible simple key per flow level, so that a plain or quoted
//!   scalar followed by `:` on the same line is retroactively marked as a
//!   mapping key
//!
//! Comments never leave the scanner.

use std::collections::VecDeque;

use crate::error::{Error, ErrorKind, Mark, Result};
use crate::reader::Reader;
use crate::token::{ScalarStyle, Token, TokenKind};

/// Longest implicit key, in code points.
const MAX_SIMPLE_KEY_LENGTH: usize = 1024;

#[derive(Clone, Copy, Debug, Default)]
struct SimpleKey {
    possible: bool,
    required: bool,
    token_number: usize,
    mark: Mark,
    pos: usize,
    col: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chomping {
    Strip,
    Clip,
    Keep,
}

/// Pull-based tokenizer over a [`Reader`].
pub struct Scanner {
    reader: Reader,
    tokens: VecDeque<Token>,
    tokens_parsed: usize,
    stream_start_produced: bool,
    stream_end_produced: bool,
    done: bool,
    indent: isize,
    indents: Vec<isize>,
    flow_level: usize,
    simple_key_allowed: bool,
    simple_keys: Vec<SimpleKey>,
    stale_key: Option<SimpleKey>,
    adjacent_value_at: Option<usize>,
}

#[inline]
fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[inline]
fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

#[inline]
fn is_breakz(c: char) -> bool {
    is_break(c) || c == '\0'
}

#[inline]
fn is_blankz(c: char) -> bool {
    is_blank(c) || is_breakz(c)
}

#[inline]
fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_indicator(c: char) -> bool {
    matches!(
        c,
        '-' | '?'
            | ':'
            | ','
            | '['
            | ']'
            | '{'
            | '}'
            | '#'
            | '&'
            | '*'
            | '!'
            | '|'
            | '>'
            | '\''
            | '"'
            | '%'
            | '@'
            | '`'
    )
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '#' | ';' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | '_' | '.' | '~'
                | '*' | '\'' | '(' | ')'
        )
}

fn error(kind: ErrorKind, message: &str, mark: Mark) -> Error {
    Error::new(kind, message, mark)
}

impl Scanner {
    pub fn new(reader: Reader) -> Self {
        Self {
            reader,
            tokens: VecDeque::new(),
            tokens_parsed: 0,
            stream_start_produced: false,
            stream_end_produced: false,
            done: false,
            indent: -1,
            indents: Vec::new(),
            flow_level: 0,
            simple_key_allowed: false,
            simple_keys: vec![SimpleKey::default()],
            stale_key: None,
            adjacent_value_at: None,
        }
    }

    /// The next token, without consuming it.
    pub fn peek_token(&mut self) -> Result<&Token> {
        self.fetch_more_tokens()?;
        let mark = self.reader.mark();
        self.tokens
            .front()
            .ok_or_else(|| error(ErrorKind::UnexpectedToken, "unexpected end of stream", mark))
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.fetch_more_tokens()?;
        match self.tokens.pop_front() {
            Some(token) => {
                self.tokens_parsed += 1;
                Ok(token)
            }
            None => Err(error(
                ErrorKind::UnexpectedToken,
                "unexpected end of stream",
                self.reader.mark(),
            )),
        }
    }

    // ========================================================================
    // Token Queue
    // ========================================================================

    /// Fill the queue until its head can no longer become a simple key.
    fn fetch_more_tokens(&mut self) -> Result<()> {
        loop {
            if !self.tokens.is_empty() {
                self.stale_simple_keys()?;
                let blocked = self
                    .simple_keys
                    .iter()
                    .any(|sk| sk.possible && sk.token_number == self.tokens_parsed);
                if !blocked {
                    return Ok(());
                }
            }
            if self.stream_end_produced {
                return Ok(());
            }
            self.fetch_next_token()?;
        }
    }

    fn fetch_next_token(&mut self) -> Result<()> {
        if !self.stream_start_produced {
            self.fetch_stream_start();
            return Ok(());
        }

        self.scan_to_next_token()?;
        self.stale_simple_keys()?;

        if self.reader.is_eof() {
            return self.fetch_stream_end();
        }

        let col = self.reader.col() as isize;
        if self.unroll_indent(col) && self.flow_level == 0 && self.indent < col {
            return Err(error(
                ErrorKind::BadIndentation,
                "line does not line up with any enclosing block",
                self.reader.mark(),
            ));
        }

        let c = self.reader.peek();
        let next = self.reader.peek_at(1);

        if self.reader.col() == 0 {
            if c == '%' {
                return self.fetch_directive();
            }
            if self.document_indicator_ahead("---") {
                return self.fetch_document_indicator(TokenKind::DocumentStart);
            }
            if self.document_indicator_ahead("...") {
                return self.fetch_document_indicator(TokenKind::DocumentEnd);
            }
        }

        match c {
            '[' => self.fetch_flow_collection_start(TokenKind::FlowSequenceStart),
            '{' => self.fetch_flow_collection_start(TokenKind::FlowMappingStart),
            ']' => self.fetch_flow_collection_end(TokenKind::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenKind::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if is_blankz(next) => self.fetch_block_entry(),
            '?' if is_blankz(next) => self.fetch_key(),
            ':' if self.is_value_indicator() => self.fetch_value(),
            '*' => self.fetch_anchor(true),
            '&' => self.fetch_anchor(false),
            '!' => self.fetch_tag(),
            '|' if self.flow_level == 0 => self.fetch_block_scalar(true),
            '>' if self.flow_level == 0 => self.fetch_block_scalar(false),
            '\'' => self.fetch_flow_scalar(true),
            '"' => self.fetch_flow_scalar(false),
            _ if self.starts_plain_scalar(c, next) => self.fetch_plain_scalar(),
            _ => Err(error(
                ErrorKind::LexicalError,
                &format!("found character {:?} that cannot start any token", c),
                self.reader.mark(),
            )),
        }
    }

    fn is_value_indicator(&self) -> bool {
        let next = self.reader.peek_at(1);
        is_blankz(next)
            || (self.flow_level > 0
                && (is_flow_indicator(next) || self.adjacent_value_at == Some(self.reader.pos())))
    }

    fn starts_plain_scalar(&self, c: char, next: char) -> bool {
        if matches!(c, '-' | '?' | ':') {
            !is_blankz(next) && !(self.flow_level > 0 && is_flow_indicator(next))
        } else {
            !is_blankz(c) && !is_indicator(c)
        }
    }

    fn document_indicator_ahead(&self, marker: &str) -> bool {
        self.reader.col() == 0 && self.reader.starts_with(marker) && is_blankz(self.reader.peek_at(3))
    }

    /// Skip whitespace, comments and line breaks up to the next token.
    fn scan_to_next_token(&mut self) -> Result<()> {
        loop {
            loop {
                match self.reader.peek() {
                    ' ' => self.reader.advance(),
                    '\t' => {
                        if self.flow_level == 0
                            && self.reader.at_line_indent()
                            && !self.rest_of_line_is_blank()
                        {
                            return Err(error(
                                ErrorKind::BadIndentation,
                                "tab character used for indentation",
                                self.reader.mark(),
                            ));
                        }
                        self.reader.advance();
                    }
                    '\u{FEFF}' if self.reader.col() == 0 => self.reader.advance(),
                    _ => break,
                }
            }
            if self.reader.peek() == '#' {
                while !is_breakz(self.reader.peek()) {
                    self.reader.advance();
                }
            }
            if is_break(self.reader.peek()) {
                self.skip_line();
                if self.flow_level == 0 {
                    self.simple_key_allowed = true;
                }
            } else {
                return Ok(());
            }
        }
    }

    fn rest_of_line_is_blank(&self) -> bool {
        let mut i = 0;
        while is_blank(self.reader.peek_at(i)) {
            i += 1;
        }
        let c = self.reader.peek_at(i);
        is_breakz(c) || c == '#'
    }

    fn skip_line(&mut self) {
        if self.reader.peek() == '\r' && self.reader.peek_at(1) == '\n' {
            self.reader.skip(2);
        } else if is_break(self.reader.peek()) {
            self.reader.advance();
        }
    }

    // ========================================================================
    // Simple Keys
    // ========================================================================

    /// Invalidate simple keys that can no longer be followed by `:`.
    fn stale_simple_keys(&mut self) -> Result<()> {
        let mark = self.reader.mark();
        let pos = self.reader.pos();
        for sk in self.simple_keys.iter_mut() {
            if sk.possible && (sk.mark.line < mark.line || sk.pos + MAX_SIMPLE_KEY_LENGTH < pos) {
                if sk.required {
                    return Err(error(
                        ErrorKind::InvalidMappingKey,
                        "could not find expected ':' after implicit key",
                        sk.mark,
                    ));
                }
                sk.possible = false;
                self.stale_key = Some(*sk);
            }
        }
        Ok(())
    }

    fn save_simple_key(&mut self) -> Result<()> {
        let required = self.flow_level == 0 && self.indent == self.reader.col() as isize;
        if self.simple_key_allowed {
            let sk = SimpleKey {
                possible: true,
                required,
                token_number: self.tokens_parsed + self.tokens.len(),
                mark: self.reader.mark(),
                pos: self.reader.pos(),
                col: self.reader.col(),
            };
            self.remove_simple_key()?;
            if let Some(last) = self.simple_keys.last_mut() {
                *last = sk;
            }
        }
        Ok(())
    }

    fn remove_simple_key(&mut self) -> Result<()> {
        if let Some(last) = self.simple_keys.last_mut() {
            if last.possible && last.required {
                return Err(error(
                    ErrorKind::InvalidMappingKey,
                    "could not find expected ':' after implicit key",
                    last.mark,
                ));
            }
            last.possible = false;
        }
        Ok(())
    }

    fn increase_flow_level(&mut self) {
        self.simple_keys.push(SimpleKey::default());
        self.flow_level += 1;
    }

    fn decrease_flow_level(&mut self) {
        if self.flow_level > 0 {
            self.flow_level -= 1;
            self.simple_keys.pop();
        }
    }

    // ========================================================================
    // Indentation
    // ========================================================================

    /// Open a block collection at `col` if it is deeper than the current
    /// indentation. With `number`, the start token is inserted before the
    /// queued token of that number.
    fn roll_indent(&mut self, col: usize, number: Option<usize>, kind: TokenKind, mark: Mark) {
        if self.flow_level > 0 {
            return;
        }
        if self.indent < col as isize {
            self.indents.push(self.indent);
            self.indent = col as isize;
            let token = Token::new(kind, mark, mark);
            match number {
                Some(n) => self.tokens.insert(n - self.tokens_parsed, token),
                None => self.tokens.push_back(token),
            }
        }
    }

    /// Close every block collection deeper than `col`. Returns whether any
    /// was closed.
    fn unroll_indent(&mut self, col: isize) -> bool {
        if self.flow_level > 0 {
            return false;
        }
        let mut closed = false;
        while self.indent > col {
            let mark = self.reader.mark();
            self.tokens
                .push_back(Token::new(TokenKind::BlockEnd, mark, mark));
            self.indent = self.indents.pop().unwrap_or(-1);
            closed = true;
        }
        closed
    }

    // ========================================================================
    // Structural Tokens
    // ========================================================================

    fn push_token(&mut self, kind: TokenKind, start: Mark) {
        let end = self.reader.mark();
        self.tokens.push_back(Token::new(kind, start, end));
    }

    fn fetch_stream_start(&mut self) {
        let mark = self.reader.mark();
        self.indent = -1;
        self.stream_start_produced = true;
        self.simple_key_allowed = true;
        self.tokens.push_back(Token::new(
            TokenKind::StreamStart(self.reader.encoding()),
            mark,
            mark,
        ));
    }

    fn fetch_stream_end(&mut self) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        self.stream_end_produced = true;
        let mark = self.reader.mark();
        self.tokens
            .push_back(Token::new(TokenKind::StreamEnd, mark, mark));
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;

        let start = self.reader.mark();
        self.reader.advance();
        let mut name = String::new();
        while is_word_char(self.reader.peek()) {
            name.push(self.reader.peek());
            self.reader.advance();
        }
        if name.is_empty() {
            return Err(error(
                ErrorKind::LexicalError,
                "did not find expected directive name",
                start,
            ));
        }
        if !is_blankz(self.reader.peek()) {
            return Err(error(
                ErrorKind::LexicalError,
                "found unexpected character after directive name",
                self.reader.mark(),
            ));
        }

        let mut params = Vec::new();
        loop {
            while is_blank(self.reader.peek()) {
                self.reader.advance();
            }
            let c = self.reader.peek();
            if c == '#' || is_breakz(c) {
                break;
            }
            let mut param = String::new();
            while !is_blankz(self.reader.peek()) {
                param.push(self.reader.peek());
                self.reader.advance();
            }
            params.push(param);
        }
        self.push_token(TokenKind::Directive { name, params }, start);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, kind: TokenKind) -> Result<()> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.reader.mark();
        self.reader.skip(3);
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, kind: TokenKind) -> Result<()> {
        self.save_simple_key()?;
        self.increase_flow_level();
        self.simple_key_allowed = true;
        let start = self.reader.mark();
        self.reader.advance();
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, kind: TokenKind) -> Result<()> {
        self.remove_simple_key()?;
        self.decrease_flow_level();
        self.simple_key_allowed = false;
        let start = self.reader.mark();
        self.reader.advance();
        self.push_token(kind, start);
        self.adjacent_value_at = Some(self.reader.pos());
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<()> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start = self.reader.mark();
        self.reader.advance();
        self.push_token(TokenKind::FlowEntry, start);
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<()> {
        let mark = self.reader.mark();
        if self.flow_level > 0 {
            return Err(error(
                ErrorKind::UnexpectedToken,
                "block sequence entries are not allowed inside a flow collection",
                mark,
            ));
        }
        if !self.simple_key_allowed {
            return Err(error(
                ErrorKind::UnexpectedToken,
                "block sequence entries are not allowed in this context",
                mark,
            ));
        }
        self.roll_indent(
            self.reader.col(),
            None,
            TokenKind::BlockSequenceStart,
            mark,
        );
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        self.reader.advance();
        self.push_token(TokenKind::BlockEntry, mark);
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<()> {
        let mark = self.reader.mark();
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return Err(error(
                    ErrorKind::InvalidMappingKey,
                    "mapping keys are not allowed in this context",
                    mark,
                ));
            }
            self.roll_indent(self.reader.col(), None, TokenKind::BlockMappingStart, mark);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;
        self.reader.advance();
        self.push_token(TokenKind::Key, mark);
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<()> {
        let mark = self.reader.mark();
        let sk = self.simple_keys.last().copied().unwrap_or_default();
        if sk.possible {
            let key = Token::new(TokenKind::Key, sk.mark, sk.mark);
            self.tokens.insert(sk.token_number - self.tokens_parsed, key);
            self.roll_indent(
                sk.col,
                Some(sk.token_number),
                TokenKind::BlockMappingStart,
                sk.mark,
            );
            if let Some(last) = self.simple_keys.last_mut() {
                last.possible = false;
            }
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                if let Some(stale) = self.stale_key {
                    let emitted = self.tokens_parsed + self.tokens.len();
                    if stale.token_number + 1 == emitted && !self.reader.at_line_indent() {
                        return Err(error(
                            ErrorKind::InvalidMappingKey,
                            "implicit key must fit on one line and within 1024 characters",
                            stale.mark,
                        ));
                    }
                }
                if !self.simple_key_allowed {
                    return Err(error(
                        ErrorKind::InvalidMappingKey,
                        "mapping values are not allowed in this context",
                        mark,
                    ));
                }
                self.roll_indent(self.reader.col(), None, TokenKind::BlockMappingStart, mark);
            }
            self.simple_key_allowed = self.flow_level == 0;
        }
        self.reader.advance();
        self.push_token(TokenKind::Value, mark);
        Ok(())
    }

    // ========================================================================
    // Node Properties
    // ========================================================================

    fn fetch_anchor(&mut self, alias: bool) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.reader.mark();
        self.reader.advance();
        let mut name = String::new();
        while !is_blankz(self.reader.peek()) && !is_flow_indicator(self.reader.peek()) {
            name.push(self.reader.peek());
            self.reader.advance();
        }
        if name.is_empty() {
            return Err(error(
                ErrorKind::LexicalError,
                if alias {
                    "did not find expected alias name"
                } else {
                    "did not find expected anchor name"
                },
                start,
            ));
        }
        let kind = if alias {
            TokenKind::Alias(name)
        } else {
            TokenKind::Anchor(name)
        };
        self.push_token(kind, start);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.reader.mark();

        let (handle, suffix) = if self.reader.peek_at(1) == '<' {
            self.reader.skip(2);
            let uri = self.scan_tag_uri(true, "")?;
            if self.reader.peek() != '>' {
                return Err(error(
                    ErrorKind::LexicalError,
                    "did not find the expected '>' after verbatim tag",
                    self.reader.mark(),
                ));
            }
            if uri.is_empty() {
                return Err(error(ErrorKind::LexicalError, "empty verbatim tag", start));
            }
            self.reader.advance();
            (String::new(), uri)
        } else {
            let mut handle = String::from("!");
            self.reader.advance();
            while is_word_char(self.reader.peek()) {
                handle.push(self.reader.peek());
                self.reader.advance();
            }
            if self.reader.peek() == '!' {
                handle.push('!');
                self.reader.advance();
                let suffix = self.scan_tag_uri(false, "")?;
                if suffix.is_empty() {
                    return Err(error(
                        ErrorKind::LexicalError,
                        "did not find expected tag suffix",
                        start,
                    ));
                }
                (handle, suffix)
            } else {
                let suffix = self.scan_tag_uri(false, &handle[1..])?;
                if suffix.is_empty() {
                    (String::new(), String::from("!"))
                } else {
                    (String::from("!"), suffix)
                }
            }
        };

        let c = self.reader.peek();
        if !is_blankz(c) && !(self.flow_level > 0 && is_flow_indicator(c)) {
            return Err(error(
                ErrorKind::LexicalError,
                "did not find expected whitespace after tag",
                self.reader.mark(),
            ));
        }
        self.push_token(TokenKind::Tag { handle, suffix }, start);
        Ok(())
    }

    /// Scan tag URI characters, decoding `%XX` escapes.
    fn scan_tag_uri(&mut self, verbatim: bool, head: &str) -> Result<String> {
        let mut bytes = head.as_bytes().to_vec();
        loop {
            let c = self.reader.peek();
            if c == '%' {
                let mark = self.reader.mark();
                let hi = self.reader.peek_at(1).to_digit(16);
                let lo = self.reader.peek_at(2).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => bytes.push((hi * 16 + lo) as u8),
                    _ => {
                        return Err(error(
                            ErrorKind::LexicalError,
                            "did not find URI escaped octet",
                            mark,
                        ))
                    }
                }
                self.reader.skip(3);
            } else if is_tag_char(c) || (verbatim && matches!(c, '!' | ',' | '[' | ']')) {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                self.reader.advance();
            } else {
                break;
            }
        }
        String::from_utf8(bytes).map_err(|_| {
            error(
                ErrorKind::LexicalError,
                "URI escapes do not form valid UTF-8",
                self.reader.mark(),
            )
        })
    }

    // ========================================================================
    // Block Scalars
    // ========================================================================

    fn fetch_block_scalar(&mut self, literal: bool) -> Result<()> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start = self.reader.mark();
        let value = self.scan_block_scalar(literal)?;
        let style = if literal {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        self.push_token(TokenKind::Scalar { value, style }, start);
        Ok(())
    }

    fn scan_block_scalar(&mut self, literal: bool) -> Result<String> {
        self.reader.advance();

        let mut chomping = Chomping::Clip;
        let mut increment = 0usize;
        for _ in 0..2 {
            let c = self.reader.peek();
            if (c == '+' || c == '-') && chomping == Chomping::Clip {
                chomping = if c == '+' {
                    Chomping::Keep
                } else {
                    Chomping::Strip
                };
                self.reader.advance();
            } else if c.is_ascii_digit() && increment == 0 {
                if c == '0' {
                    return Err(error(
                        ErrorKind::LexicalError,
                        "block scalar indentation indicator must be between 1 and 9",
                        self.reader.mark(),
                    ));
                }
                increment = c as usize - '0' as usize;
                self.reader.advance();
            }
        }

        while is_blank(self.reader.peek()) {
            self.reader.advance();
        }
        if self.reader.peek() == '#' {
            while !is_breakz(self.reader.peek()) {
                self.reader.advance();
            }
        }
        if !is_breakz(self.reader.peek()) {
            return Err(error(
                ErrorKind::LexicalError,
                "did not find expected comment or line break after block scalar header",
                self.reader.mark(),
            ));
        }
        self.skip_line();

        let mut indent = 0usize;
        if increment > 0 {
            indent = if self.indent >= 0 {
                self.indent as usize + increment
            } else {
                increment
            };
        }

        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut leading_blank = false;

        self.block_scalar_breaks(&mut indent, &mut trailing_breaks)?;

        while self.reader.col() == indent && !self.reader.is_eof() {
            let trailing_blank = is_blank(self.reader.peek());
            if !literal && leading_break.starts_with('\n') && !leading_blank && !trailing_blank {
                if trailing_breaks.is_empty() {
                    string.push(' ');
                }
                leading_break.clear();
            } else {
                string.push_str(&leading_break);
                leading_break.clear();
            }
            string.push_str(&trailing_breaks);
            trailing_breaks.clear();

            leading_blank = is_blank(self.reader.peek());
            while !is_breakz(self.reader.peek()) {
                string.push(self.reader.peek());
                self.reader.advance();
            }
            if self.reader.is_eof() {
                break;
            }
            leading_break.push('\n');
            self.skip_line();
            self.block_scalar_breaks(&mut indent, &mut trailing_breaks)?;
        }

        if chomping != Chomping::Strip {
            string.push_str(&leading_break);
        }
        if chomping == Chomping::Keep {
            string.push_str(&trailing_breaks);
        }
        Ok(string)
    }

    /// Consume indentation and empty lines of a block scalar. With an
    /// `indent` of zero, the content indentation is detected here.
    fn block_scalar_breaks(&mut self, indent: &mut usize, breaks: &mut String) -> Result<()> {
        let mut max_indent = 0;
        loop {
            while (*indent == 0 || self.reader.col() < *indent) && self.reader.peek() == ' ' {
                self.reader.advance();
            }
            if self.reader.col() > max_indent {
                max_indent = self.reader.col();
            }
            if (*indent == 0 || self.reader.col() < *indent) && self.reader.peek() == '\t' {
                return Err(error(
                    ErrorKind::BadIndentation,
                    "found a tab character where block scalar indentation is expected",
                    self.reader.mark(),
                ));
            }
            if !is_break(self.reader.peek()) {
                break;
            }
            breaks.push('\n');
            self.skip_line();
        }
        if *indent == 0 {
            let floor = (self.indent + 1).max(1) as usize;
            *indent = max_indent.max(floor);
        }
        Ok(())
    }

    // ========================================================================
    // Flow Scalars
    // ========================================================================

    fn fetch_flow_scalar(&mut self, single: bool) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.reader.mark();
        let value = self.scan_flow_scalar(single, start)?;
        let style = if single {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::DoubleQuoted
        };
        self.push_token(TokenKind::Scalar { value, style }, start);
        self.adjacent_value_at = Some(self.reader.pos());
        Ok(())
    }

    fn scan_flow_scalar(&mut self, single: bool, start: Mark) -> Result<String> {
        let quote = if single { '\'' } else { '"' };
        self.reader.advance();

        let mut string = String::new();
        let mut whitespaces = String::new();
        let mut trailing_breaks = String::new();

        loop {
            if self.document_indicator_ahead("---") || self.document_indicator_ahead("...") {
                return Err(error(
                    ErrorKind::LexicalError,
                    "found unexpected document indicator inside a quoted scalar",
                    self.reader.mark(),
                ));
            }
            if self.reader.is_eof() {
                return Err(error(
                    ErrorKind::LexicalError,
                    "found unexpected end of stream inside a quoted scalar",
                    start,
                ));
            }

            let mut leading_blanks = false;
            let mut line_folded = false;
            while !is_blankz(self.reader.peek()) {
                let c = self.reader.peek();
                if single && c == '\'' && self.reader.peek_at(1) == '\'' {
                    string.push('\'');
                    self.reader.skip(2);
                } else if c == quote {
                    break;
                } else if !single && c == '\\' && is_break(self.reader.peek_at(1)) {
                    self.reader.advance();
                    self.skip_line();
                    leading_blanks = true;
                    break;
                } else if !single && c == '\\' {
                    self.scan_escape(&mut string)?;
                } else {
                    string.push(c);
                    self.reader.advance();
                }
            }

            if self.reader.peek() == quote {
                break;
            }

            while is_blank(self.reader.peek()) || is_break(self.reader.peek()) {
                if is_blank(self.reader.peek()) {
                    if !leading_blanks {
                        whitespaces.push(self.reader.peek());
                    }
                    self.reader.advance();
                } else {
                    if !leading_blanks {
                        whitespaces.clear();
                        leading_blanks = true;
                        line_folded = true;
                    } else {
                        trailing_breaks.push('\n');
                    }
                    self.skip_line();
                }
            }

            if leading_blanks
                && self.flow_level == 0
                && !self.reader.is_eof()
                && (self.reader.col() as isize) <= self.indent
            {
                return Err(error(
                    ErrorKind::BadIndentation,
                    "quoted scalar continuation line is not indented enough",
                    self.reader.mark(),
                ));
            }

            if leading_blanks {
                if line_folded && trailing_breaks.is_empty() {
                    string.push(' ');
                } else {
                    string.push_str(&trailing_breaks);
                }
                trailing_breaks.clear();
            } else {
                string.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        self.reader.advance();
        Ok(string)
    }

    fn scan_escape(&mut self, string: &mut String) -> Result<()> {
        let mark = self.reader.mark();
        let code_length = match self.reader.peek_at(1) {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            c => {
                let ch = match c {
                    '0' => '\0',
                    'a' => '\x07',
                    'b' => '\x08',
                    't' | '\t' => '\t',
                    'n' => '\n',
                    'v' => '\x0B',
                    'f' => '\x0C',
                    'r' => '\r',
                    'e' => '\x1B',
                    ' ' => ' ',
                    '"' => '"',
                    '/' => '/',
                    '\\' => '\\',
                    'N' => '\u{85}',
                    '_' => '\u{A0}',
                    'L' => '\u{2028}',
                    'P' => '\u{2029}',
                    _ => {
                        return Err(error(
                            ErrorKind::LexicalError,
                            &format!("found unknown escape character {:?}", c),
                            mark,
                        ))
                    }
                };
                string.push(ch);
                self.reader.skip(2);
                return Ok(());
            }
        };

        let mut code = 0u32;
        for i in 0..code_length {
            match self.reader.peek_at(2 + i).to_digit(16) {
                Some(d) => code = code * 16 + d,
                None => {
                    return Err(error(
                        ErrorKind::LexicalError,
                        "did not find expected hexadecimal digits in escape",
                        mark,
                    ))
                }
            }
        }
        match char::from_u32(code) {
            Some(ch) => string.push(ch),
            None => {
                return Err(error(
                    ErrorKind::LexicalError,
                    &format!("escape \\{:X} is not a Unicode scalar value", code),
                    mark,
                ))
            }
        }
        self.reader.skip(2 + code_length);
        Ok(())
    }

    // ========================================================================
    // Plain Scalars
    // ========================================================================

    fn fetch_plain_scalar(&mut self) -> Result<()> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let start = self.reader.mark();
        let (value, end) = self.scan_plain_scalar()?;
        self.tokens.push_back(Token::new(
            TokenKind::Scalar {
                value,
                style: ScalarStyle::Plain,
            },
            start,
            end,
        ));
        Ok(())
    }

    fn scan_plain_scalar(&mut self) -> Result<(String, Mark)> {
        let indent = self.indent + 1;
        let mut end = self.reader.mark();
        let mut string = String::new();
        let mut whitespaces = String::new();
        let mut trailing_breaks = String::new();
        let mut leading_blanks = false;

        loop {
            if self.document_indicator_ahead("---") || self.document_indicator_ahead("...") {
                break;
            }
            if self.reader.peek() == '#' {
                break;
            }

            while !is_blankz(self.reader.peek()) {
                let c = self.reader.peek();
                let next = self.reader.peek_at(1);
                if c == ':' && (is_blankz(next) || (self.flow_level > 0 && is_flow_indicator(next)))
                {
                    break;
                }
                if self.flow_level > 0 && is_flow_indicator(c) {
                    break;
                }
                if leading_blanks {
                    if trailing_breaks.is_empty() {
                        string.push(' ');
                    } else {
                        string.push_str(&trailing_breaks);
                        trailing_breaks.clear();
                    }
                    leading_blanks = false;
                } else if !whitespaces.is_empty() {
                    string.push_str(&whitespaces);
                    whitespaces.clear();
                }
                string.push(c);
                self.reader.advance();
                end = self.reader.mark();
            }

            let c = self.reader.peek();
            if !(is_blank(c) || is_break(c)) {
                break;
            }

            while is_blank(self.reader.peek()) || is_break(self.reader.peek()) {
                if is_blank(self.reader.peek()) {
                    if leading_blanks
                        && (self.reader.col() as isize) < indent
                        && self.reader.peek() == '\t'
                        && !self.rest_of_line_is_blank()
                    {
                        return Err(error(
                            ErrorKind::BadIndentation,
                            "found a tab character that violates indentation",
                            self.reader.mark(),
                        ));
                    }
                    if !leading_blanks {
                        whitespaces.push(self.reader.peek());
                    }
                    self.reader.advance();
                } else {
                    if !leading_blanks {
                        whitespaces.clear();
                        leading_blanks = true;
                    } else {
                        trailing_breaks.push('\n');
                    }
                    self.skip_line();
                }
            }

            if self.flow_level == 0 && (self.reader.col() as isize) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }
        Ok((string, end))
    }
}

impl Iterator for Scanner {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(token) => {
                if token.kind == TokenKind::StreamEnd {
                    self.done = true;
                }
                Some(Ok(token))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
