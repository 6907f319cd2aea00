//! Phase 4: Composer
//!
//! The composer folds the event stream into one node graph per document.
//! It handles:
//! - Per-document anchor tables, with later definitions shadowing earlier
//!   ones
//! - Aliases, which share the anchored node (`Rc`) instead of copying it
//! - Tag resolution for every node as it is built
//! - The expanded node count, guarding against alias bombs

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, ErrorKind, Mark, Result};
use crate::event::{Event, EventKind, TagDirective};
use crate::options::DEFAULT_MAX_EXPANDED_NODES;
use crate::parser::Parser;
use crate::resolver::{self, NodeKind};
use crate::token::ScalarStyle;

/// The content of a node.
#[derive(Debug)]
pub enum NodeContent {
    Scalar(String),
    Sequence(Vec<Rc<Node>>),
    Mapping(Vec<(Rc<Node>, Rc<Node>)>),
}

/// A node of the representation graph.
#[derive(Debug)]
pub struct Node {
    /// Position in composition order, unique across the stream.
    pub index: usize,
    /// Resolved absolute tag, or a local `!tag`.
    pub tag: String,
    pub anchor: Option<String>,
    pub mark: Mark,
    /// Number of nodes this node expands to with aliases substituted.
    pub weight: u64,
    pub content: NodeContent,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.content {
            NodeContent::Scalar(_) => NodeKind::Scalar,
            NodeContent::Sequence(_) => NodeKind::Sequence,
            NodeContent::Mapping(_) => NodeKind::Mapping,
        }
    }
}

/// A composed document.
#[derive(Debug)]
pub struct Document {
    pub root: Rc<Node>,
    /// Position of the document start.
    pub start: Mark,
    pub version: Option<(u32, u32)>,
    pub tags: Vec<TagDirective>,
    pub explicit_start: bool,
    pub explicit_end: bool,
}

enum AnchorSlot {
    /// The anchored collection is still being composed.
    Pending,
    Complete(Rc<Node>),
}

pub struct Composer {
    parser: Parser,
    anchors: HashMap<String, AnchorSlot>,
    next_index: usize,
    max_expanded_nodes: u64,
    started: bool,
    pending: Option<Event>,
    stream_end: Option<Mark>,
}

fn unexpected_event(event: &Event) -> Error {
    Error::new(
        ErrorKind::UnexpectedToken,
        format!("unexpected event {:?}", event.kind),
        event.start,
    )
}

impl Composer {
    pub fn new(parser: Parser) -> Self {
        Self {
            parser,
            anchors: HashMap::new(),
            next_index: 0,
            max_expanded_nodes: DEFAULT_MAX_EXPANDED_NODES,
            started: false,
            pending: None,
            stream_end: None,
        }
    }

    pub fn with_max_expanded_nodes(mut self, max_expanded_nodes: u64) -> Self {
        self.max_expanded_nodes = max_expanded_nodes;
        self
    }

    /// Position of the end of the stream, once it has been reached.
    pub fn stream_end(&self) -> Option<Mark> {
        self.stream_end
    }

    fn next_event(&mut self) -> Result<Event> {
        match self.pending.take() {
            Some(event) => Ok(event),
            None => self.parser.next_event(),
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if !self.started {
            let event = self.next_event()?;
            if event.kind != EventKind::StreamStart {
                return Err(unexpected_event(&event));
            }
            self.started = true;
        }
        Ok(())
    }

    /// The start of the next document, without composing it.
    pub fn peek_document(&mut self) -> Result<Option<Mark>> {
        if self.stream_end.is_some() {
            return Ok(None);
        }
        if self.pending.is_none() {
            self.ensure_started()?;
            let event = self.next_event()?;
            match event.kind {
                EventKind::StreamEnd => {
                    self.stream_end = Some(event.start);
                    return Ok(None);
                }
                EventKind::DocumentStart { .. } => self.pending = Some(event),
                _ => return Err(unexpected_event(&event)),
            }
        }
        Ok(self.pending.as_ref().map(|event| event.start))
    }

    /// Compose the next document, or `None` at the end of the stream.
    pub fn next_document(&mut self) -> Result<Option<Document>> {
        if self.peek_document()?.is_none() {
            return Ok(None);
        }
        let event = self.next_event()?;
        let start = event.start;
        let (explicit_start, version, tags) = match event.kind {
            EventKind::DocumentStart {
                explicit,
                version,
                tags,
            } => (explicit, version, tags),
            _ => return Err(unexpected_event(&event)),
        };

        self.anchors.clear();
        let first = self.next_event()?;
        let root = self.compose_node(first)?;

        let end = self.next_event()?;
        let explicit_end = match end.kind {
            EventKind::DocumentEnd { explicit } => explicit,
            _ => return Err(unexpected_event(&end)),
        };

        Ok(Some(Document {
            root,
            start,
            version,
            tags,
            explicit_start,
            explicit_end,
        }))
    }

    fn take_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn check_weight(&self, weight: u64, mark: Mark) -> Result<()> {
        if weight > self.max_expanded_nodes {
            return Err(Error::new(
                ErrorKind::LimitExceeded,
                format!(
                    "document expands to more than {} nodes",
                    self.max_expanded_nodes
                ),
                mark,
            ));
        }
        Ok(())
    }

    fn reserve_anchor(&mut self, anchor: &Option<String>) {
        if let Some(name) = anchor {
            self.anchors.insert(name.clone(), AnchorSlot::Pending);
        }
    }

    fn register_anchor(&mut self, node: &Rc<Node>) {
        if let Some(name) = &node.anchor {
            self.anchors
                .insert(name.clone(), AnchorSlot::Complete(Rc::clone(node)));
        }
    }

    fn resolve_alias(&self, name: &str, mark: Mark) -> Result<Rc<Node>> {
        match self.anchors.get(name) {
            Some(AnchorSlot::Complete(node)) => Ok(Rc::clone(node)),
            Some(AnchorSlot::Pending) => Err(Error::new(
                ErrorKind::CyclicKey,
                format!("alias *{} refers to a node that contains it", name),
                mark,
            )),
            None => Err(Error::new(
                ErrorKind::UnknownAnchor,
                format!("found undefined alias *{}", name),
                mark,
            )),
        }
    }

    fn compose_node(&mut self, event: Event) -> Result<Rc<Node>> {
        let mark = event.start;
        match event.kind {
            EventKind::Alias { name } => self.resolve_alias(&name, mark),
            EventKind::Scalar {
                anchor,
                tag,
                value,
                style,
            } => {
                let index = self.take_index();
                let tag = resolver::resolve(NodeKind::Scalar, tag.as_deref(), &value, style);
                let node = Rc::new(Node {
                    index,
                    tag,
                    anchor,
                    mark,
                    weight: 1,
                    content: NodeContent::Scalar(value),
                });
                self.check_weight(node.weight, mark)?;
                self.register_anchor(&node);
                Ok(node)
            }
            EventKind::SequenceStart { anchor, tag, .. } => {
                let index = self.take_index();
                self.reserve_anchor(&anchor);
                let mut items = Vec::new();
                let mut weight = 1u64;
                loop {
                    let event = self.next_event()?;
                    if event.kind == EventKind::SequenceEnd {
                        break;
                    }
                    let item = self.compose_node(event)?;
                    weight = weight.saturating_add(item.weight);
                    self.check_weight(weight, mark)?;
                    items.push(item);
                }
                let tag = resolver::resolve(NodeKind::Sequence, tag.as_deref(), "", ScalarStyle::Plain);
                let node = Rc::new(Node {
                    index,
                    tag,
                    anchor,
                    mark,
                    weight,
                    content: NodeContent::Sequence(items),
                });
                self.register_anchor(&node);
                Ok(node)
            }
            EventKind::MappingStart { anchor, tag, .. } => {
                let index = self.take_index();
                self.reserve_anchor(&anchor);
                let mut pairs = Vec::new();
                let mut weight = 1u64;
                loop {
                    let event = self.next_event()?;
                    if event.kind == EventKind::MappingEnd {
                        break;
                    }
                    let key = self.compose_node(event)?;
                    let event = self.next_event()?;
                    let value = self.compose_node(event)?;
                    weight = weight
                        .saturating_add(key.weight)
                        .saturating_add(value.weight);
                    self.check_weight(weight, mark)?;
                    pairs.push((key, value));
                }
                let tag = resolver::resolve(NodeKind::Mapping, tag.as_deref(), "", ScalarStyle::Plain);
                let node = Rc::new(Node {
                    index,
                    tag,
                    anchor,
                    mark,
                    weight,
                    content: NodeContent::Mapping(pairs),
                });
                self.register_anchor(&node);
                Ok(node)
            }
            _ => Err(unexpected_event(&event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;
    use crate::scanner::Scanner;

    fn composer(input: &str) -> Composer {
        let reader = Reader::new(input.as_bytes()).unwrap();
        Composer::new(Parser::new(Scanner::new(reader)))
    }

    fn documents(input: &str) -> Result<Vec<Document>> {
        let mut composer = composer(input);
        let mut docs = Vec::new();
        while let Some(doc) = composer.next_document()? {
            docs.push(doc);
        }
        Ok(docs)
    }

    fn sequence(node: &Node) -> &[Rc<Node>] {
        match &node.content {
            NodeContent::Sequence(items) => items,
            other => panic!("expected a sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_alias_shares_node() {
        let docs = documents("- &a [x]\n- *a\n").unwrap();
        let items = sequence(&docs[0].root);
        assert!(Rc::ptr_eq(&items[0], &items[1]));
        assert_eq!(docs[0].root.weight, 5);
    }

    #[test]
    fn test_index_is_monotonic_across_documents() {
        let docs = documents("--- [a, b]\n--- c\n").unwrap();
        let first = sequence(&docs[0].root);
        assert_eq!(docs[0].root.index, 0);
        assert_eq!(first[0].index, 1);
        assert_eq!(first[1].index, 2);
        assert_eq!(docs[1].root.index, 3);
    }

    #[test]
    fn test_tags_are_resolved() {
        let docs = documents("[1, '1', !!str 2, !x 3, ~]").unwrap();
        let tags: Vec<&str> = sequence(&docs[0].root)
            .iter()
            .map(|n| n.tag.as_str())
            .collect();
        assert_eq!(
            tags,
            vec![resolver::INT, resolver::STR, resolver::STR, "!x", resolver::NULL]
        );
        assert_eq!(docs[0].root.tag, resolver::SEQ);
    }

    #[test]
    fn test_unknown_anchor() {
        let err = documents("- *nope\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAnchor);
        assert_eq!(err.mark().column, 3);
    }

    #[test]
    fn test_anchors_are_per_document() {
        let err = documents("--- &a x\n--- *a\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAnchor);
    }

    #[test]
    fn test_recursive_alias() {
        let err = documents("&a [*a]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicKey);
        let err = documents("&m { *m : 1 }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicKey);
    }

    #[test]
    fn test_anchor_shadowing() {
        let docs = documents("- &a one\n- *a\n- &a two\n- *a\n").unwrap();
        let values: Vec<String> = sequence(&docs[0].root)
            .iter()
            .map(|n| match &n.content {
                NodeContent::Scalar(value) => value.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(values, vec!["one", "one", "two", "two"]);
    }

    #[test]
    fn test_expansion_limit() {
        let bomb = "a: &a [x, x, x, x]\nb: &b [*a, *a, *a, *a]\nc: &c [*b, *b, *b, *b]\nd: [*c, *c, *c, *c]\n";
        let reader = Reader::new(bomb.as_bytes()).unwrap();
        let mut composer =
            Composer::new(Parser::new(Scanner::new(reader))).with_max_expanded_nodes(100);
        let err = composer.next_document().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
        assert!(documents(bomb).is_ok());
    }

    #[test]
    fn test_document_header() {
        let docs = documents("%YAML 1.2\n--- a\n...\n").unwrap();
        assert_eq!(docs[0].version, Some((1, 2)));
        assert!(docs[0].explicit_start);
        assert!(docs[0].explicit_end);
    }

    #[test]
    fn test_peek_document() {
        let mut composer = composer("a\n--- b\n");
        assert_eq!(composer.peek_document().unwrap().map(|m| m.line), Some(1));
        assert!(composer.next_document().unwrap().is_some());
        assert_eq!(composer.peek_document().unwrap().map(|m| m.line), Some(2));
        assert!(composer.next_document().unwrap().is_some());
        assert!(composer.next_document().unwrap().is_none());
        assert!(composer.stream_end().is_some());
    }
}
