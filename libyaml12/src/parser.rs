//! Phase 3: Event Parser
//!
//! The event parser checks the token stream against the YAML grammar and
//! emits a flat sequence of events. It handles:
//! - Document boundaries, explicit (`---`, `...`) and implicit
//! - `%YAML` and `%TAG` directives, and tag shorthand expansion
//! - Block and flow collections, including indentless sequences and
//!   single-pair mappings inside flow sequences
//! - Empty nodes, reported as empty plain scalars

use tracing::{trace, warn};

use crate::error::{Error, ErrorKind, Mark, Result};
use crate::event::{Event, EventKind, TagDirective};
use crate::scanner::Scanner;
use crate::token::{ScalarStyle, Token, TokenKind};

/// Default nesting limit for collections.
pub const DEFAULT_MAX_DEPTH: usize = 128;

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    StreamStart,
    ImplicitDocumentStart,
    DocumentStart,
    DocumentContent,
    DocumentEnd,
    BlockNode,
    BlockSequenceFirstEntry,
    BlockSequenceEntry,
    IndentlessSequenceEntry,
    BlockMappingFirstKey,
    BlockMappingKey,
    BlockMappingValue,
    FlowSequenceFirstEntry,
    FlowSequenceEntry,
    FlowSequenceEntryMappingKey,
    FlowSequenceEntryMappingValue,
    FlowSequenceEntryMappingEnd,
    FlowMappingFirstKey,
    FlowMappingKey,
    FlowMappingValue,
    FlowMappingEmptyValue,
    End,
}

/// Pull-based event parser over a [`Scanner`].
pub struct Parser {
    scanner: Scanner,
    state: State,
    states: Vec<State>,
    marks: Vec<Mark>,
    tag_directives: Vec<TagDirective>,
    depth: usize,
    max_depth: usize,
    done: bool,
}

fn default_tag_directives() -> Vec<TagDirective> {
    vec![
        ("!".to_string(), "!".to_string()),
        ("!!".to_string(), CORE_TAG_PREFIX.to_string()),
    ]
}

fn is_valid_tag_handle(handle: &str) -> bool {
    if handle == "!" || handle == "!!" {
        return true;
    }
    handle.len() > 2
        && handle.starts_with('!')
        && handle.ends_with('!')
        && handle[1..handle.len() - 1]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Parser {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            scanner,
            state: State::StreamStart,
            states: Vec::new(),
            marks: Vec::new(),
            tag_directives: Vec::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            done: false,
        }
    }

    /// Limit collection nesting to `max_depth` levels.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Produce the next event. After `StreamEnd` this fails.
    pub fn next_event(&mut self) -> Result<Event> {
        let event = self.state_machine()?;
        trace!(event = ?event.kind, line = event.start.line, "event");
        Ok(event)
    }

    fn state_machine(&mut self) -> Result<Event> {
        match self.state {
            State::StreamStart => self.parse_stream_start(),
            State::ImplicitDocumentStart => self.parse_document_start(true),
            State::DocumentStart => self.parse_document_start(false),
            State::DocumentContent => self.parse_document_content(),
            State::DocumentEnd => self.parse_document_end(),
            State::BlockNode => self.parse_node(true, false),
            State::BlockSequenceFirstEntry => self.parse_block_sequence_entry(true),
            State::BlockSequenceEntry => self.parse_block_sequence_entry(false),
            State::IndentlessSequenceEntry => self.parse_indentless_sequence_entry(),
            State::BlockMappingFirstKey => self.parse_block_mapping_key(true),
            State::BlockMappingKey => self.parse_block_mapping_key(false),
            State::BlockMappingValue => self.parse_block_mapping_value(),
            State::FlowSequenceFirstEntry => self.parse_flow_sequence_entry(true),
            State::FlowSequenceEntry => self.parse_flow_sequence_entry(false),
            State::FlowSequenceEntryMappingKey => self.parse_flow_sequence_entry_mapping_key(),
            State::FlowSequenceEntryMappingValue => self.parse_flow_sequence_entry_mapping_value(),
            State::FlowSequenceEntryMappingEnd => self.parse_flow_sequence_entry_mapping_end(),
            State::FlowMappingFirstKey => self.parse_flow_mapping_key(true),
            State::FlowMappingKey => self.parse_flow_mapping_key(false),
            State::FlowMappingValue => self.parse_flow_mapping_value(false),
            State::FlowMappingEmptyValue => self.parse_flow_mapping_value(true),
            State::End => Err(Error::new(
                ErrorKind::UnexpectedToken,
                "no events after the end of the stream",
                Mark::default(),
            )),
        }
    }

    // ========================================================================
    // Token Helpers
    // ========================================================================

    fn peek(&mut self) -> Result<Token> {
        Ok(self.scanner.peek_token()?.clone())
    }

    /// Peek inside a flow collection, where the end of the stream means the
    /// collection was never closed.
    fn peek_flow(&mut self) -> Result<Token> {
        let token = self.peek()?;
        if token.kind == TokenKind::StreamEnd {
            let mark = self.marks.last().copied().unwrap_or(token.start);
            return Err(Error::new(
                ErrorKind::UnmatchedStructure,
                "flow collection is never closed",
                mark,
            ));
        }
        Ok(token)
    }

    fn skip(&mut self) -> Result<()> {
        self.scanner.next_token().map(|_| ())
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::End);
    }

    fn unexpected(token: &Token, context: &str) -> Error {
        Error::new(
            ErrorKind::UnexpectedToken,
            format!("{}, but found {}", context, token.kind.describe()),
            token.start,
        )
    }

    fn enter_collection(&mut self, mark: Mark) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::new(
                ErrorKind::LimitExceeded,
                format!("collections nested deeper than {} levels", self.max_depth),
                mark,
            ));
        }
        Ok(())
    }

    fn leave_collection(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ========================================================================
    // Stream and Documents
    // ========================================================================

    fn parse_stream_start(&mut self) -> Result<Event> {
        let token = self.scanner.next_token()?;
        match token.kind {
            TokenKind::StreamStart(_) => {
                self.state = State::ImplicitDocumentStart;
                Ok(Event::new(EventKind::StreamStart, token.start, token.end))
            }
            _ => Err(Self::unexpected(&token, "expected the start of the stream")),
        }
    }

    fn parse_document_start(&mut self, implicit: bool) -> Result<Event> {
        let mut token = self.peek()?;
        while token.kind == TokenKind::DocumentEnd {
            self.skip()?;
            token = self.peek()?;
        }

        let at_boundary = matches!(
            token.kind,
            TokenKind::Directive { .. } | TokenKind::DocumentStart | TokenKind::StreamEnd
        );

        if implicit && !at_boundary {
            self.tag_directives = default_tag_directives();
            self.states.push(State::DocumentEnd);
            self.state = State::BlockNode;
            return Ok(Event::new(
                EventKind::DocumentStart {
                    explicit: false,
                    version: None,
                    tags: Vec::new(),
                },
                token.start,
                token.start,
            ));
        }

        if token.kind == TokenKind::StreamEnd {
            self.state = State::End;
            self.skip()?;
            return Ok(Event::new(EventKind::StreamEnd, token.start, token.end));
        }

        let start = token.start;
        let (version, tags) = self.process_directives()?;
        let token = self.peek()?;
        if token.kind != TokenKind::DocumentStart {
            return Err(Self::unexpected(&token, "expected '---' to start a document"));
        }
        self.skip()?;
        self.states.push(State::DocumentEnd);
        self.state = State::DocumentContent;
        Ok(Event::new(
            EventKind::DocumentStart {
                explicit: true,
                version,
                tags,
            },
            start,
            token.end,
        ))
    }

    /// Consume the directives before `---` and install the tag handles for
    /// the document.
    fn process_directives(&mut self) -> Result<(Option<(u32, u32)>, Vec<TagDirective>)> {
        let mut version = None;
        let mut tags: Vec<TagDirective> = Vec::new();

        loop {
            let token = self.peek()?;
            let (name, params) = match token.kind {
                TokenKind::Directive { name, params } => (name, params),
                _ => break,
            };
            let mark = token.start;
            self.skip()?;

            match name.as_str() {
                "YAML" => {
                    if version.is_some() {
                        return Err(parse_error("found duplicate %YAML directive", mark));
                    }
                    let parsed = match params.as_slice() {
                        [v] => parse_version(v),
                        _ => None,
                    };
                    let (major, minor) = parsed
                        .ok_or_else(|| parse_error("malformed %YAML directive", mark))?;
                    if major != 1 {
                        return Err(parse_error(
                            &format!("unsupported YAML version {}.{}", major, minor),
                            mark,
                        ));
                    }
                    if minor > 2 {
                        warn!(
                            line = mark.line,
                            "YAML version 1.{} is newer than 1.2, loading as 1.2", minor
                        );
                    }
                    version = Some((major, minor));
                }
                "TAG" => {
                    let (handle, prefix) = match params.as_slice() {
                        [h, p] => (h.clone(), p.clone()),
                        _ => return Err(parse_error("malformed %TAG directive", mark)),
                    };
                    if !is_valid_tag_handle(&handle) {
                        return Err(parse_error(
                            &format!("invalid tag handle {:?}", handle),
                            mark,
                        ));
                    }
                    if tags.iter().any(|(h, _)| *h == handle) {
                        return Err(parse_error(
                            &format!("found duplicate %TAG directive for {:?}", handle),
                            mark,
                        ));
                    }
                    tags.push((handle, prefix));
                }
                _ => {
                    warn!(line = mark.line, "ignoring unknown directive %{}", name);
                }
            }
        }

        let mut directives = tags.clone();
        for (handle, prefix) in default_tag_directives() {
            if !directives.iter().any(|(h, _)| *h == handle) {
                directives.push((handle, prefix));
            }
        }
        self.tag_directives = directives;
        Ok((version, tags))
    }

    fn parse_document_content(&mut self) -> Result<Event> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Directive { .. }
            | TokenKind::DocumentStart
            | TokenKind::DocumentEnd
            | TokenKind::StreamEnd => {
                self.pop_state();
                Ok(Event::empty_scalar(token.start))
            }
            _ => self.parse_node(true, false),
        }
    }

    fn parse_document_end(&mut self) -> Result<Event> {
        let token = self.peek()?;
        let explicit = token.kind == TokenKind::DocumentEnd;
        let end = if explicit {
            self.skip()?;
            token.end
        } else {
            token.start
        };
        self.tag_directives.clear();
        self.state = if explicit {
            State::ImplicitDocumentStart
        } else {
            State::DocumentStart
        };
        Ok(Event::new(
            EventKind::DocumentEnd { explicit },
            token.start,
            end,
        ))
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> Result<Event> {
        let mut token = if block { self.peek()? } else { self.peek_flow()? };

        if let TokenKind::Alias(name) = token.kind {
            self.pop_state();
            self.skip()?;
            return Ok(Event::new(
                EventKind::Alias { name },
                token.start,
                token.end,
            ));
        }

        let start = token.start;
        let mut end = token.start;
        let mut anchor = None;
        let mut raw_tag = None;
        for _ in 0..2 {
            match token.kind.clone() {
                TokenKind::Anchor(name) if anchor.is_none() => {
                    anchor = Some(name);
                }
                TokenKind::Tag { handle, suffix } if raw_tag.is_none() => {
                    raw_tag = Some((handle, suffix, token.start));
                }
                _ => break,
            }
            end = token.end;
            self.skip()?;
            token = if block { self.peek()? } else { self.peek_flow()? };
        }

        let tag = match raw_tag {
            Some((handle, suffix, mark)) => Some(self.expand_tag(&handle, &suffix, mark)?),
            None => None,
        };

        if indentless_sequence && token.kind == TokenKind::BlockEntry {
            self.enter_collection(token.start)?;
            self.state = State::IndentlessSequenceEntry;
            return Ok(Event::new(
                EventKind::SequenceStart {
                    anchor,
                    tag,
                    flow: false,
                },
                start,
                token.end,
            ));
        }

        match token.kind {
            TokenKind::Scalar { value, style } => {
                self.skip()?;
                self.pop_state();
                Ok(Event::new(
                    EventKind::Scalar {
                        anchor,
                        tag,
                        value,
                        style,
                    },
                    start,
                    token.end,
                ))
            }
            TokenKind::FlowSequenceStart => {
                self.enter_collection(token.start)?;
                self.state = State::FlowSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        flow: true,
                    },
                    start,
                    token.end,
                ))
            }
            TokenKind::FlowMappingStart => {
                self.enter_collection(token.start)?;
                self.state = State::FlowMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart {
                        anchor,
                        tag,
                        flow: true,
                    },
                    start,
                    token.end,
                ))
            }
            TokenKind::BlockSequenceStart if block => {
                self.enter_collection(token.start)?;
                self.state = State::BlockSequenceFirstEntry;
                Ok(Event::new(
                    EventKind::SequenceStart {
                        anchor,
                        tag,
                        flow: false,
                    },
                    start,
                    token.end,
                ))
            }
            TokenKind::BlockMappingStart if block => {
                self.enter_collection(token.start)?;
                self.state = State::BlockMappingFirstKey;
                Ok(Event::new(
                    EventKind::MappingStart {
                        anchor,
                        tag,
                        flow: false,
                    },
                    start,
                    token.end,
                ))
            }
            _ if anchor.is_some() || tag.is_some() => {
                self.pop_state();
                Ok(Event::new(
                    EventKind::Scalar {
                        anchor,
                        tag,
                        value: String::new(),
                        style: ScalarStyle::Plain,
                    },
                    start,
                    end,
                ))
            }
            _ => Err(Self::unexpected(&token, "expected node content")),
        }
    }

    /// Expand a tag shorthand through the active `%TAG` handles.
    fn expand_tag(&self, handle: &str, suffix: &str, mark: Mark) -> Result<String> {
        if handle.is_empty() {
            return Ok(suffix.to_string());
        }
        match self.tag_directives.iter().find(|(h, _)| h == handle) {
            Some((_, prefix)) => Ok(format!("{}{}", prefix, suffix)),
            None => Err(parse_error(
                &format!("found undefined tag handle {:?}", handle),
                mark,
            )),
        }
    }

    // ========================================================================
    // Block Collections
    // ========================================================================

    fn parse_block_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if first {
            let token = self.scanner.next_token()?;
            self.marks.push(token.start);
        }
        let token = self.peek()?;
        match token.kind {
            TokenKind::BlockEntry => {
                self.skip()?;
                let next = self.peek()?;
                if matches!(next.kind, TokenKind::BlockEntry | TokenKind::BlockEnd) {
                    self.state = State::BlockSequenceEntry;
                    Ok(Event::empty_scalar(token.end))
                } else {
                    self.states.push(State::BlockSequenceEntry);
                    self.parse_node(true, false)
                }
            }
            TokenKind::BlockEnd => {
                self.pop_state();
                self.marks.pop();
                self.leave_collection();
                self.skip()?;
                Ok(Event::new(EventKind::SequenceEnd, token.start, token.end))
            }
            _ => Err(Self::unexpected(&token, "expected '-' in block sequence")),
        }
    }

    fn parse_indentless_sequence_entry(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::BlockEntry {
            self.pop_state();
            self.leave_collection();
            return Ok(Event::new(EventKind::SequenceEnd, token.start, token.start));
        }
        self.skip()?;
        let next = self.peek()?;
        if matches!(
            next.kind,
            TokenKind::BlockEntry | TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
        ) {
            self.state = State::IndentlessSequenceEntry;
            Ok(Event::empty_scalar(token.end))
        } else {
            self.states.push(State::IndentlessSequenceEntry);
            self.parse_node(true, false)
        }
    }

    fn parse_block_mapping_key(&mut self, first: bool) -> Result<Event> {
        if first {
            let token = self.scanner.next_token()?;
            self.marks.push(token.start);
        }
        let token = self.peek()?;
        match token.kind {
            TokenKind::Key => {
                self.skip()?;
                let next = self.peek()?;
                if matches!(
                    next.kind,
                    TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
                ) {
                    self.state = State::BlockMappingValue;
                    Ok(Event::empty_scalar(token.end))
                } else {
                    self.states.push(State::BlockMappingValue);
                    self.parse_node(true, true)
                }
            }
            TokenKind::Value => {
                self.state = State::BlockMappingValue;
                Ok(Event::empty_scalar(token.start))
            }
            TokenKind::BlockEnd => {
                self.pop_state();
                self.marks.pop();
                self.leave_collection();
                self.skip()?;
                Ok(Event::new(EventKind::MappingEnd, token.start, token.end))
            }
            _ => Err(Self::unexpected(&token, "expected a key in block mapping")),
        }
    }

    fn parse_block_mapping_value(&mut self) -> Result<Event> {
        let token = self.peek()?;
        if token.kind != TokenKind::Value {
            self.state = State::BlockMappingKey;
            return Ok(Event::empty_scalar(token.start));
        }
        self.skip()?;
        let next = self.peek()?;
        if matches!(
            next.kind,
            TokenKind::Key | TokenKind::Value | TokenKind::BlockEnd
        ) {
            self.state = State::BlockMappingKey;
            Ok(Event::empty_scalar(token.end))
        } else {
            self.states.push(State::BlockMappingKey);
            self.parse_node(true, true)
        }
    }

    // ========================================================================
    // Flow Collections
    // ========================================================================

    fn parse_flow_sequence_entry(&mut self, first: bool) -> Result<Event> {
        if first {
            let token = self.scanner.next_token()?;
            self.marks.push(token.start);
        }
        let mut token = self.peek_flow()?;
        if token.kind != TokenKind::FlowSequenceEnd {
            if !first {
                if token.kind == TokenKind::FlowEntry {
                    self.skip()?;
                    token = self.peek_flow()?;
                } else {
                    return Err(Self::unexpected(
                        &token,
                        "expected ',' or ']' in flow sequence",
                    ));
                }
            }
            if matches!(token.kind, TokenKind::Key | TokenKind::Value) {
                self.enter_collection(token.start)?;
                self.state = State::FlowSequenceEntryMappingKey;
                // The key state reports the empty key before a bare ':'.
                if token.kind == TokenKind::Key {
                    self.skip()?;
                }
                return Ok(Event::new(
                    EventKind::MappingStart {
                        anchor: None,
                        tag: None,
                        flow: true,
                    },
                    token.start,
                    token.end,
                ));
            }
            if token.kind != TokenKind::FlowSequenceEnd {
                self.states.push(State::FlowSequenceEntry);
                return self.parse_node(false, false);
            }
        }
        self.pop_state();
        self.marks.pop();
        self.leave_collection();
        self.skip()?;
        Ok(Event::new(EventKind::SequenceEnd, token.start, token.end))
    }

    fn parse_flow_sequence_entry_mapping_key(&mut self) -> Result<Event> {
        let token = self.peek_flow()?;
        if matches!(
            token.kind,
            TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowSequenceEnd
        ) {
            self.state = State::FlowSequenceEntryMappingValue;
            Ok(Event::empty_scalar(token.start))
        } else {
            self.states.push(State::FlowSequenceEntryMappingValue);
            self.parse_node(false, false)
        }
    }

    fn parse_flow_sequence_entry_mapping_value(&mut self) -> Result<Event> {
        let mut token = self.peek_flow()?;
        if token.kind == TokenKind::Value {
            self.skip()?;
            token = self.peek_flow()?;
            if !matches!(
                token.kind,
                TokenKind::FlowEntry | TokenKind::FlowSequenceEnd
            ) {
                self.states.push(State::FlowSequenceEntryMappingEnd);
                return self.parse_node(false, false);
            }
        }
        self.state = State::FlowSequenceEntryMappingEnd;
        Ok(Event::empty_scalar(token.start))
    }

    fn parse_flow_sequence_entry_mapping_end(&mut self) -> Result<Event> {
        let token = self.peek_flow()?;
        self.state = State::FlowSequenceEntry;
        self.leave_collection();
        Ok(Event::new(EventKind::MappingEnd, token.start, token.start))
    }

    fn parse_flow_mapping_key(&mut self, first: bool) -> Result<Event> {
        if first {
            let token = self.scanner.next_token()?;
            self.marks.push(token.start);
        }
        let mut token = self.peek_flow()?;
        if token.kind != TokenKind::FlowMappingEnd {
            if !first {
                if token.kind == TokenKind::FlowEntry {
                    self.skip()?;
                    token = self.peek_flow()?;
                } else {
                    return Err(Self::unexpected(
                        &token,
                        "expected ',' or '}' in flow mapping",
                    ));
                }
            }
            if token.kind == TokenKind::Key {
                self.skip()?;
                let next = self.peek_flow()?;
                if matches!(
                    next.kind,
                    TokenKind::Value | TokenKind::FlowEntry | TokenKind::FlowMappingEnd
                ) {
                    self.state = State::FlowMappingValue;
                    return Ok(Event::empty_scalar(next.start));
                }
                self.states.push(State::FlowMappingValue);
                return self.parse_node(false, false);
            }
            if token.kind == TokenKind::Value {
                self.state = State::FlowMappingValue;
                return Ok(Event::empty_scalar(token.start));
            }
            if token.kind != TokenKind::FlowMappingEnd {
                self.states.push(State::FlowMappingEmptyValue);
                return self.parse_node(false, false);
            }
        }
        self.pop_state();
        self.marks.pop();
        self.leave_collection();
        self.skip()?;
        Ok(Event::new(EventKind::MappingEnd, token.start, token.end))
    }

    fn parse_flow_mapping_value(&mut self, empty: bool) -> Result<Event> {
        let mut token = self.peek_flow()?;
        if empty {
            self.state = State::FlowMappingKey;
            return Ok(Event::empty_scalar(token.start));
        }
        if token.kind == TokenKind::Value {
            self.skip()?;
            token = self.peek_flow()?;
            if !matches!(
                token.kind,
                TokenKind::FlowEntry | TokenKind::FlowMappingEnd
            ) {
                self.states.push(State::FlowMappingKey);
                return self.parse_node(false, false);
            }
        }
        self.state = State::FlowMappingKey;
        Ok(Event::empty_scalar(token.start))
    }
}

fn parse_error(message: &str, mark: Mark) -> Error {
    Error::new(ErrorKind::ParseError, message, mark)
}

/// Parse a `MAJOR.MINOR` version string.
fn parse_version(text: &str) -> Option<(u32, u32)> {
    let (major, minor) = text.split_once('.')?;
    if major.is_empty()
        || minor.is_empty()
        || !major.bytes().all(|b| b.is_ascii_digit())
        || !minor.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}

impl Iterator for Parser {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(event) => {
                if event.kind == EventKind::StreamEnd {
                    self.done = true;
                }
                Some(Ok(event))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    fn events(input: &str) -> Result<Vec<EventKind>> {
        let reader = Reader::new(input.as_bytes())?;
        Parser::new(Scanner::new(reader))
            .map(|e| e.map(|e| e.kind))
            .collect()
    }

    fn error_kind(input: &str) -> ErrorKind {
        events(input).unwrap_err().kind()
    }

    fn plain(value: &str) -> EventKind {
        EventKind::Scalar {
            anchor: None,
            tag: None,
            value: value.to_string(),
            style: ScalarStyle::Plain,
        }
    }

    fn doc_start(explicit: bool) -> EventKind {
        EventKind::DocumentStart {
            explicit,
            version: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(
            events("").unwrap(),
            vec![EventKind::StreamStart, EventKind::StreamEnd]
        );
        assert_eq!(
            events("# only a comment\n...\n").unwrap(),
            vec![EventKind::StreamStart, EventKind::StreamEnd]
        );
    }

    #[test]
    fn test_block_mapping_events() {
        assert_eq!(
            events("a: 1\nb:\n").unwrap(),
            vec![
                EventKind::StreamStart,
                doc_start(false),
                EventKind::MappingStart {
                    anchor: None,
                    tag: None,
                    flow: false
                },
                plain("a"),
                plain("1"),
                plain("b"),
                plain(""),
                EventKind::MappingEnd,
                EventKind::DocumentEnd { explicit: false },
                EventKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_indentless_sequence() {
        let kinds = events("key:\n- a\n- b\nother: c\n").unwrap();
        assert_eq!(
            kinds[4],
            EventKind::SequenceStart {
                anchor: None,
                tag: None,
                flow: false
            }
        );
        assert_eq!(kinds[7], EventKind::SequenceEnd);
        assert_eq!(kinds[8], plain("other"));
    }

    #[test]
    fn test_flow_pair_in_sequence() {
        let kinds = events("[a: b, c]").unwrap();
        assert_eq!(
            kinds[3],
            EventKind::MappingStart {
                anchor: None,
                tag: None,
                flow: true
            }
        );
        assert_eq!(kinds[4], plain("a"));
        assert_eq!(kinds[5], plain("b"));
        assert_eq!(kinds[6], EventKind::MappingEnd);
        assert_eq!(kinds[7], plain("c"));
    }

    #[test]
    fn test_flow_mapping_without_values() {
        let kinds = events("{a, b: }").unwrap();
        assert_eq!(&kinds[3..7], &[plain("a"), plain(""), plain("b"), plain("")]);
    }

    #[test]
    fn test_flow_mapping_empty_key() {
        let kinds = events("{\n  ? foo :,\n  : bar,\n}\n").unwrap();
        assert_eq!(
            &kinds[3..8],
            &[
                plain("foo"),
                plain(""),
                plain(""),
                plain("bar"),
                EventKind::MappingEnd
            ]
        );
    }

    #[test]
    fn test_flow_pair_with_empty_key() {
        let kinds = events("[ : a ]").unwrap();
        assert_eq!(
            &kinds[3..7],
            &[
                EventKind::MappingStart {
                    anchor: None,
                    tag: None,
                    flow: true
                },
                plain(""),
                plain("a"),
                EventKind::MappingEnd
            ]
        );
        assert_eq!(kinds[7], EventKind::SequenceEnd);
    }

    #[test]
    fn test_multiple_documents() {
        let kinds = events("--- a\n--- b\n...\nc\n").unwrap();
        let starts: Vec<bool> = kinds
            .iter()
            .filter_map(|k| match k {
                EventKind::DocumentStart { explicit, .. } => Some(*explicit),
                _ => None,
            })
            .collect();
        assert_eq!(starts, vec![true, true, false]);
        assert!(kinds.contains(&EventKind::DocumentEnd { explicit: true }));
    }

    #[test]
    fn test_explicit_empty_document() {
        assert_eq!(
            events("---\n").unwrap(),
            vec![
                EventKind::StreamStart,
                doc_start(true),
                plain(""),
                EventKind::DocumentEnd { explicit: false },
                EventKind::StreamEnd,
            ]
        );
    }

    #[test]
    fn test_tag_expansion() {
        let kinds = events("%TAG !e! tag:example.com,2000:app/\n---\n- !e!foo a\n- !!str b\n- !local c\n- ! d\n").unwrap();
        let tags: Vec<Option<String>> = kinds
            .iter()
            .filter_map(|k| match k {
                EventKind::Scalar { tag, .. } => Some(tag.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            tags,
            vec![
                Some("tag:example.com,2000:app/foo".to_string()),
                Some("tag:yaml.org,2002:str".to_string()),
                Some("!local".to_string()),
                Some("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_tag_directives_are_per_document() {
        assert_eq!(
            error_kind("%TAG !e! tag:e/\n--- !e!a x\n...\n--- !e!b y\n"),
            ErrorKind::ParseError
        );
    }

    #[test]
    fn test_yaml_directive() {
        let kinds = events("%YAML 1.2\n--- a\n").unwrap();
        assert_eq!(
            kinds[1],
            EventKind::DocumentStart {
                explicit: true,
                version: Some((1, 2)),
                tags: Vec::new()
            }
        );
        assert!(events("%YAML 1.3\n--- a\n").is_ok());
        assert_eq!(error_kind("%YAML 2.0\n--- a\n"), ErrorKind::ParseError);
        assert_eq!(
            error_kind("%YAML 1.2\n%YAML 1.2\n--- a\n"),
            ErrorKind::ParseError
        );
    }

    #[test]
    fn test_unknown_directive_is_ignored() {
        assert!(events("%FOO bar\n--- a\n").is_ok());
    }

    #[test]
    fn test_undefined_handle() {
        assert_eq!(error_kind("!x!y a"), ErrorKind::ParseError);
    }

    #[test]
    fn test_directive_without_document() {
        assert_eq!(error_kind("%YAML 1.2\n"), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_unclosed_flow() {
        let err = events("key: [a, b\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedStructure);
        assert_eq!(err.mark().column, 6);
        assert_eq!(error_kind("{a: 1"), ErrorKind::UnmatchedStructure);
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(error_kind("{a: 1 b: 2}"), ErrorKind::UnexpectedToken);
        assert_eq!(error_kind("[a]]"), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_content_after_root() {
        assert_eq!(error_kind("[a]\n[b]\n"), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_anchor_and_alias_events() {
        let kinds = events("- &x a\n- *x\n").unwrap();
        assert_eq!(
            kinds[3],
            EventKind::Scalar {
                anchor: Some("x".into()),
                tag: None,
                value: "a".into(),
                style: ScalarStyle::Plain
            }
        );
        assert_eq!(kinds[4], EventKind::Alias { name: "x".into() });
    }

    #[test]
    fn test_properties_on_empty_node() {
        let kinds = events("a: !!str\nb: &x\n").unwrap();
        assert_eq!(
            kinds[4],
            EventKind::Scalar {
                anchor: None,
                tag: Some("tag:yaml.org,2002:str".into()),
                value: String::new(),
                style: ScalarStyle::Plain
            }
        );
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}{}", "[".repeat(10), "]".repeat(10));
        let reader = Reader::new(deep.as_bytes()).unwrap();
        let result: Result<Vec<Event>> = Parser::new(Scanner::new(reader))
            .with_max_depth(5)
            .collect();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::LimitExceeded);
        assert!(events(&deep).is_ok());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2"), Some((1, 2)));
        assert_eq!(parse_version("1"), None);
        assert_eq!(parse_version("1.x"), None);
    }
}
