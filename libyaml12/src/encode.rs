//! Encode loaded values and event streams as text.
//!
//! `encode_json` maps the value model onto JSON. `dump_events` renders the
//! parser's event stream in the line-per-event notation of the YAML test
//! suite, which the fixture tests compare against.

use base64::Engine;

use crate::error::Result;
use crate::event::{Event, EventKind};
use crate::token::ScalarStyle;
use crate::value::Value;

// =============================================================================
// JSON Encoder
// =============================================================================

/// Encode a value as indented JSON.
///
/// Types JSON lacks are lowered: non-finite floats become the strings
/// `".inf"`, `"-.inf"` and `".nan"`, timestamps their ISO-8601 text, bytes
/// base64, sets arrays, and mappings with a non-string key an array of
/// `[key, value]` pairs. Application tags are dropped.
pub fn encode_json(value: &Value) -> String {
    encode_json_value(value, 0)
}

fn encode_json_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => encode_json_float(*f),
        Value::Timestamp(t) => encode_json_string(&t.to_string()),
        Value::String(s) => encode_json_string(s),
        Value::Bytes(b) => {
            encode_json_string(&base64::engine::general_purpose::STANDARD.encode(b))
        }
        Value::Sequence(seq) => {
            let items: Vec<String> = seq
                .iter()
                .map(|v| encode_json_value(v, indent + 1))
                .collect();
            json_block('[', ']', items, indent)
        }
        Value::Set(set) => {
            let items: Vec<String> = set
                .iter()
                .map(|v| encode_json_value(v, indent + 1))
                .collect();
            json_block('[', ']', items, indent)
        }
        Value::Mapping(map) => {
            if map.keys().all(|k| matches!(k, Value::String(_))) {
                let items: Vec<String> = map
                    .iter()
                    .map(|(k, v)| {
                        format!(
                            "{}: {}",
                            encode_json_value(k, 0),
                            encode_json_value(v, indent + 1)
                        )
                    })
                    .collect();
                json_block('{', '}', items, indent)
            } else {
                encode_json_pairs(map.iter(), indent)
            }
        }
        Value::Pairs(pairs) => encode_json_pairs(pairs.iter().map(|(k, v)| (k, v)), indent),
        Value::Tagged(tagged) => encode_json_value(&tagged.value, indent),
    }
}

fn encode_json_pairs<'a>(
    pairs: impl Iterator<Item = (&'a Value, &'a Value)>,
    indent: usize,
) -> String {
    let items: Vec<String> = pairs
        .map(|(k, v)| {
            format!(
                "[{}, {}]",
                encode_json_value(k, indent + 1),
                encode_json_value(v, indent + 1)
            )
        })
        .collect();
    json_block('[', ']', items, indent)
}

fn json_block(open: char, close: char, items: Vec<String>, indent: usize) -> String {
    if items.is_empty() {
        return format!("{}{}", open, close);
    }
    let pad = "  ".repeat(indent);
    let pad1 = "  ".repeat(indent + 1);
    format!(
        "{}\n{}\n{}{}",
        open,
        items
            .iter()
            .map(|i| format!("{}{}", pad1, i))
            .collect::<Vec<_>>()
            .join(",\n"),
        pad,
        close
    )
}

fn encode_json_float(f: f64) -> String {
    if f.is_nan() {
        "\".nan\"".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "\".inf\"".to_string()
        } else {
            "\"-.inf\"".to_string()
        }
    } else {
        // Debug uses exponent notation for very large and small magnitudes.
        format!("{:?}", f)
    }
}

fn encode_json_string(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0c' => result.push_str("\\f"),
            c if c.is_control() => {
                for unit in c.encode_utf16(&mut [0; 2]) {
                    result.push_str(&format!("\\u{:04x}", unit));
                }
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

// =============================================================================
// Event Dump
// =============================================================================

/// Render the event stream of `input`, one event per line.
///
/// ```
/// let dump = libyaml12::dump_events("- a\n").unwrap();
/// assert_eq!(dump, "+STR\n+DOC\n+SEQ\n=VAL :a\n-SEQ\n-DOC\n-STR\n");
/// ```
pub fn dump_events(input: impl AsRef<[u8]>) -> Result<String> {
    write_events(crate::parse_events(input))
}

pub(crate) fn write_events(events: impl Iterator<Item = Result<Event>>) -> Result<String> {
    let mut out = String::new();
    for event in events {
        out.push_str(&dump_event(&event?.kind));
        out.push('\n');
    }
    Ok(out)
}

fn dump_event(kind: &EventKind) -> String {
    match kind {
        EventKind::StreamStart => "+STR".to_string(),
        EventKind::StreamEnd => "-STR".to_string(),
        EventKind::DocumentStart { explicit: true, .. } => "+DOC ---".to_string(),
        EventKind::DocumentStart { .. } => "+DOC".to_string(),
        EventKind::DocumentEnd { explicit: true } => "-DOC ...".to_string(),
        EventKind::DocumentEnd { .. } => "-DOC".to_string(),
        EventKind::Alias { name } => format!("=ALI *{}", name),
        EventKind::SequenceStart { anchor, tag, flow } => {
            let mut line = String::from("+SEQ");
            if *flow {
                line.push_str(" []");
            }
            push_properties(&mut line, anchor, tag);
            line
        }
        EventKind::MappingStart { anchor, tag, flow } => {
            let mut line = String::from("+MAP");
            if *flow {
                line.push_str(" {}");
            }
            push_properties(&mut line, anchor, tag);
            line
        }
        EventKind::SequenceEnd => "-SEQ".to_string(),
        EventKind::MappingEnd => "-MAP".to_string(),
        EventKind::Scalar {
            anchor,
            tag,
            value,
            style,
        } => {
            let mut line = String::from("=VAL");
            push_properties(&mut line, anchor, tag);
            line.push(' ');
            line.push(match style {
                ScalarStyle::Plain => ':',
                ScalarStyle::SingleQuoted => '\'',
                ScalarStyle::DoubleQuoted => '"',
                ScalarStyle::Literal => '|',
                ScalarStyle::Folded => '>',
            });
            line.push_str(&escape_event_text(value));
            line
        }
    }
}

fn push_properties(line: &mut String, anchor: &Option<String>, tag: &Option<String>) {
    if let Some(anchor) = anchor {
        line.push_str(" &");
        line.push_str(anchor);
    }
    if let Some(tag) = tag {
        line.push_str(" <");
        line.push_str(tag);
        line.push('>');
    }
}

fn escape_event_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Mapping, TaggedValue};
    use crate::{load_one, ErrorKind};

    #[test]
    fn test_json_scalars() {
        assert_eq!(encode_json(&Value::Null), "null");
        assert_eq!(encode_json(&Value::from(-7)), "-7");
        assert_eq!(encode_json(&Value::from(1.5)), "1.5");
        assert_eq!(encode_json(&Value::from(1.0)), "1.0");
        assert_eq!(encode_json(&Value::from(1e300)), "1e300");
        assert_eq!(encode_json(&Value::Float(f64::NEG_INFINITY)), "\"-.inf\"");
        assert_eq!(encode_json(&Value::Float(f64::NAN)), "\".nan\"");
        assert_eq!(encode_json(&Value::from("a\"b\n")), "\"a\\\"b\\n\"");
        assert_eq!(encode_json(&Value::from("\u{1}")), "\"\\u0001\"");
        assert_eq!(encode_json(&Value::Bytes(b"GIF89a".to_vec())), "\"R0lGODlh\"");
    }

    #[test]
    fn test_json_containers() {
        let value = load_one("a: [1, 2]\nb: {}\n").unwrap();
        assert_eq!(
            encode_json(&value),
            "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}"
        );
    }

    #[test]
    fn test_json_non_string_keys() {
        let mut map = Mapping::new();
        map.insert(Value::from(1), Value::from("one"));
        assert_eq!(
            encode_json(&Value::Mapping(map)),
            "[\n  [1, \"one\"]\n]"
        );
    }

    #[test]
    fn test_json_timestamp_and_tagged() {
        let value = load_one("2001-12-14t21:59:43.10-05:00").unwrap();
        assert_eq!(encode_json(&value), "\"2001-12-14T21:59:43.100-05:00\"");
        let tagged = Value::Tagged(Box::new(TaggedValue {
            tag: "!circle".into(),
            value: Value::from("x"),
        }));
        assert_eq!(encode_json(&tagged), "\"x\"");
    }

    #[test]
    fn test_dump_block_mapping() {
        let dump = dump_events("--- &m !!map\nkey: 'v'\nseq: [*m]\n...\n").unwrap();
        let expected = [
            "+STR",
            "+DOC ---",
            "+MAP &m <tag:yaml.org,2002:map>",
            "=VAL :key",
            "=VAL 'v",
            "=VAL :seq",
            "+SEQ []",
            "=ALI *m",
            "-SEQ",
            "-MAP",
            "-DOC ...",
            "-STR",
            "",
        ]
        .join("\n");
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_dump_escapes_and_styles() {
        let dump = dump_events("- |\n  a\\b\n  \tc\n- >\n  d\n- \"e\"\n").unwrap();
        assert!(dump.contains("=VAL |a\\\\b\\n\\tc\\n\n"), "{}", dump);
        assert!(dump.contains("=VAL >d\\n\n"), "{}", dump);
        assert!(dump.contains("=VAL \"e\n"), "{}", dump);
    }

    #[test]
    fn test_dump_reports_errors() {
        let err = dump_events("[a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedStructure);
    }
}
