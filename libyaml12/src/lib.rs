//! A YAML 1.2 loader.
//!
//! Turns YAML text into native values under the Core Schema, with the
//! additional types of the YAML type repository (`!!binary`, `!!timestamp`,
//! `!!set`, `!!omap`, `!!pairs`).
//!
//! # Loading Pipeline
//!
//! Each stage pulls from the one before it:
//!
//! 1. **Reader**: Detects the encoding, decodes to UTF-8 and checks that
//!    every character is printable.
//!
//! 2. **Scanner**: Converts characters into tokens, tracking indentation
//!    and recovering implicit mapping keys.
//!
//! 3. **Parser**: Checks the token stream against the YAML grammar and
//!    emits events, expanding tag shorthands through `%TAG` directives.
//!
//! 4. **Composer**: Folds events into a node graph per document, linking
//!    aliases to their anchors and resolving every node's tag.
//!
//! 5. **Constructor**: Builds a [`Value`] from the node graph.
//!
//! # Example
//!
//! ```
//! let value = libyaml12::load_one("hr: 65\navg: 0.278\n").unwrap();
//! assert_eq!(value.get("hr").and_then(|v| v.as_i64()), Some(65));
//! ```

mod composer;
mod constructor;
mod encode;
mod error;
mod event;
mod options;
mod parser;
mod reader;
mod resolver;
mod scanner;
mod timestamp;
mod token;
mod value;

use tracing::debug;

use crate::composer::{Composer, Document};
use crate::parser::Parser;
use crate::reader::Reader;
use crate::scanner::Scanner;

pub use constructor::{parse_float, parse_int};
pub use encode::{dump_events, encode_json};
pub use error::{Error, ErrorKind, Mark, Result};
pub use event::{Event, EventKind, TagDirective};
pub use options::LoadOptions;
pub use reader::Encoding;
pub use timestamp::Timestamp;
pub use token::ScalarStyle;
pub use value::{Mapping, TaggedValue, Value};

/// Loads YAML streams under a set of [`LoadOptions`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    fn parser(&self, input: &[u8]) -> Result<Parser> {
        let reader = Reader::new(input)?;
        Ok(Parser::new(Scanner::new(reader)).with_max_depth(self.options.max_depth))
    }

    fn composer(&self, input: &[u8]) -> Result<Composer> {
        Ok(Composer::new(self.parser(input)?)
            .with_max_expanded_nodes(self.options.max_expanded_nodes))
    }

    /// Load a stream that holds exactly one document.
    pub fn load_one(&self, input: impl AsRef<[u8]>) -> Result<Value> {
        let mut composer = self.composer(input.as_ref())?;
        let document = match composer.next_document()? {
            Some(document) => document,
            None => {
                let mark = composer.stream_end().unwrap_or_else(Mark::start);
                return Err(Error::new(
                    ErrorKind::EmptyStream,
                    "the stream contains no document",
                    mark,
                ));
            }
        };
        log_document(0, &document);
        let value = constructor::construct(&document.root)?;
        if let Some(mark) = composer.peek_document()? {
            return Err(Error::new(
                ErrorKind::MultipleDocuments,
                "expected a single document in the stream",
                mark,
            ));
        }
        Ok(value)
    }

    /// Load every document of a stream, lazily.
    pub fn load_all(&self, input: impl AsRef<[u8]>) -> Documents {
        match self.composer(input.as_ref()) {
            Ok(composer) => Documents {
                composer: Some(composer),
                error: None,
                index: 0,
            },
            Err(err) => Documents {
                composer: None,
                error: Some(err),
                index: 0,
            },
        }
    }

    /// Call `visitor` with each document in order and return how many there
    /// were. Stops at the first malformed document.
    pub fn for_each_document<F>(&self, input: impl AsRef<[u8]>, mut visitor: F) -> Result<usize>
    where
        F: FnMut(Value),
    {
        let mut count = 0;
        for value in self.load_all(input) {
            visitor(value?);
            count += 1;
        }
        Ok(count)
    }

    /// The event dump of a stream, one event per line.
    pub fn dump_events(&self, input: impl AsRef<[u8]>) -> Result<String> {
        encode::write_events(self.parse_events(input))
    }

    /// The parser's event stream.
    pub fn parse_events(&self, input: impl AsRef<[u8]>) -> Events {
        match self.parser(input.as_ref()) {
            Ok(parser) => Events {
                parser: Some(parser),
                error: None,
            },
            Err(err) => Events {
                parser: None,
                error: Some(err),
            },
        }
    }
}

/// Iterator over the documents of a stream. Yields `None` after the first
/// error.
pub struct Documents {
    composer: Option<Composer>,
    error: Option<Error>,
    index: usize,
}

impl Iterator for Documents {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            return Some(Err(err));
        }
        let composer = self.composer.as_mut()?;
        let result = composer.next_document().and_then(|document| match document {
            Some(document) => {
                log_document(self.index, &document);
                constructor::construct(&document.root).map(Some)
            }
            None => Ok(None),
        });
        match result {
            Ok(Some(value)) => {
                self.index += 1;
                Some(Ok(value))
            }
            Ok(None) => {
                self.composer = None;
                None
            }
            Err(err) => {
                self.composer = None;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for Documents {}

/// Iterator over parser events. Yields `None` after `StreamEnd` or the
/// first error.
pub struct Events {
    parser: Option<Parser>,
    error: Option<Error>,
}

impl Iterator for Events {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.error.take() {
            return Some(Err(err));
        }
        self.parser.as_mut()?.next()
    }
}

fn log_document(index: usize, document: &Document) {
    debug!(
        index,
        line = document.start.line,
        version = ?document.version,
        tag_directives = document.tags.len(),
        explicit_start = document.explicit_start,
        explicit_end = document.explicit_end,
        nodes = document.root.weight,
        "loaded document"
    );
}

/// Load a stream that holds exactly one document.
///
/// Fails with [`ErrorKind::EmptyStream`] when there is no document and
/// [`ErrorKind::MultipleDocuments`] when there is more than one.
pub fn load_one(input: impl AsRef<[u8]>) -> Result<Value> {
    Loader::default().load_one(input)
}

/// Load every document of a stream, lazily.
///
/// ```
/// use libyaml12::Value;
///
/// let docs: Vec<Value> = libyaml12::load_all("--- 1\n--- 2\n")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(docs, vec![Value::from(1), Value::from(2)]);
/// ```
pub fn load_all(input: impl AsRef<[u8]>) -> Documents {
    Loader::default().load_all(input)
}

/// Call `visitor` with each document in order and return how many there were.
pub fn for_each_document<F>(input: impl AsRef<[u8]>, visitor: F) -> Result<usize>
where
    F: FnMut(Value),
{
    Loader::default().for_each_document(input, visitor)
}

/// The parser's event stream, for tooling.
pub fn parse_events(input: impl AsRef<[u8]>) -> Events {
    Loader::default().parse_events(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_one() {
        assert_eq!(load_one("42").unwrap(), Value::from(42));
        assert_eq!(load_one("--- 42\n...\n").unwrap(), Value::from(42));
    }

    #[test]
    fn test_empty_stream() {
        for input in ["", "# only a comment\n", "\n\n", "...\n"] {
            let err = load_one(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::EmptyStream, "input {:?}", input);
        }
    }

    #[test]
    fn test_multiple_documents() {
        let err = load_one("a\n---\nb\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MultipleDocuments);
        assert_eq!(err.mark().line, 2);
        // An empty explicit document still counts.
        let err = load_one("a\n---\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MultipleDocuments);
    }

    #[test]
    fn test_flow_empty_keys() {
        let value = load_one("{ ? foo :, : bar }").unwrap();
        let mut expected = Mapping::new();
        expected.insert(Value::from("foo"), Value::Null);
        expected.insert(Value::Null, Value::from("bar"));
        assert_eq!(value, Value::Mapping(expected));

        let value = load_one("[ : a ]").unwrap();
        let mut pair = Mapping::new();
        pair.insert(Value::Null, Value::from("a"));
        assert_eq!(value, Value::Sequence(vec![Value::Mapping(pair)]));
    }

    #[test]
    fn test_load_all() {
        let docs: Vec<Value> = load_all("a\n---\nb\n--- !!int 3\n")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(docs, vec![Value::from("a"), Value::from("b"), Value::from(3)]);
        assert_eq!(load_all("").count(), 0);
    }

    #[test]
    fn test_load_all_is_fused_after_error() {
        let mut docs = load_all("--- 1\n--- *x\n--- 3\n");
        assert_eq!(docs.next().unwrap().unwrap(), Value::from(1));
        assert_eq!(
            docs.next().unwrap().unwrap_err().kind(),
            ErrorKind::UnknownAnchor
        );
        assert!(docs.next().is_none());
        assert!(docs.next().is_none());
    }

    #[test]
    fn test_encoding_error_is_yielded_once() {
        let mut docs = load_all(b"a: \xff\n");
        assert_eq!(
            docs.next().unwrap().unwrap_err().kind(),
            ErrorKind::MalformedEncoding
        );
        assert!(docs.next().is_none());
    }

    #[test]
    fn test_for_each_document() {
        let mut seen = Vec::new();
        let count = for_each_document("- a\n---\n- b\n", |v| seen.push(v)).unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen[1], Value::from(vec![Value::from("b")]));

        let err = for_each_document("--- a\n--- {b\n", |_| {}).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedStructure);
    }

    #[test]
    fn test_utf16_input() {
        let input: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain("k: v\n".encode_utf16().flat_map(|u| u.to_le_bytes()))
            .collect();
        assert_eq!(load_one(&input).unwrap().get("k"), Some(&Value::from("v")));
    }

    #[test]
    fn test_loader_limits() {
        let shallow = Loader::new(LoadOptions::new().max_depth(2));
        assert!(shallow.load_one("[[1]]").is_ok());
        assert_eq!(
            shallow.load_one("[[[1]]]").unwrap_err().kind(),
            ErrorKind::LimitExceeded
        );

        let bomb = "a: &a [x, x, x]\nb: &b [*a, *a, *a]\nc: [*b, *b, *b]\n";
        let small = Loader::new(LoadOptions::new().max_expanded_nodes(20));
        assert_eq!(small.load_one(bomb).unwrap_err().kind(), ErrorKind::LimitExceeded);
        assert!(load_one(bomb).is_ok());
    }

    #[test]
    fn test_parse_events() {
        let kinds: Vec<EventKind> = parse_events("[]")
            .map(|e| e.map(|e| e.kind))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(kinds.len(), 6);
        assert_eq!(kinds[0], EventKind::StreamStart);
        assert_eq!(kinds[5], EventKind::StreamEnd);
    }
}
