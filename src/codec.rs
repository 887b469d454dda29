//! AML text <-> raw exchange tree.
//!
//! The tree layout follows the usual "XML as nested mappings" convention:
//! * every child element is stored in a list under its tag, even when it is
//!   the only one,
//! * attributes are stored as `@name` keys holding strings,
//! * an element with neither attributes nor children collapses to its text
//!   (or null when empty), otherwise its text lives under `#text`,
//! * surrounding whitespace of text is stripped.
//!
//! Serializing skips null attributes and empty child lists, so a section that
//! holds nothing does not appear in the output at all.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};

use crate::error::{MamlError, Result};
use crate::node::{Node, text};

const TEXT: &str = "#text";

struct Frame {
    tag: String,
    map: Map<String, Value>,
    text: String,
}
impl Frame {
    fn new(tag: String) -> Self {
        Self {
            tag,
            map: Map::new(),
            text: String::new(),
        }
    }
    fn finish(self) -> (String, Value) {
        let trimmed = self.text.trim();
        let value = if self.map.is_empty() {
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_owned())
            }
        } else {
            let mut map = self.map;
            if !trimmed.is_empty() {
                map.insert(TEXT.to_owned(), Value::String(trimmed.to_owned()));
            }
            Value::Object(map)
        };
        (self.tag, value)
    }
    fn push_child(&mut self, tag: String, value: Value) {
        let entry = self
            .map
            .entry(tag)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.push(value);
        }
    }
}

fn open(start: &BytesStart) -> Result<Frame> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut frame = Frame::new(tag);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| MamlError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        frame.map.insert(format!("@{key}"), Value::String(value));
    }
    Ok(frame)
}

/// Parses AML text into the raw exchange tree.
pub fn parse(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Frame::new(String::new())];
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open(&start)?),
            Event::Empty(start) => {
                let (tag, value) = open(&start)?.finish();
                if let Some(parent) = stack.last_mut() {
                    parent.push_child(tag, value);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(MamlError::Xml("unbalanced closing tag".into()));
                }
                if let Some(frame) = stack.pop() {
                    let (tag, value) = frame.finish();
                    if let Some(parent) = stack.last_mut() {
                        parent.push_child(tag, value);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions and doctypes carry no data
            _ => (),
        }
    }
    if stack.len() != 1 {
        return Err(MamlError::Xml(format!(
            "unexpected end of document inside <{}>",
            stack.last().map(|f| f.tag.as_str()).unwrap_or_default()
        )));
    }
    match stack.pop() {
        Some(root) if !root.map.is_empty() => Ok(Value::Object(root.map)),
        _ => Err(MamlError::Xml("document has no root element".into())),
    }
}

/// Serializes the raw exchange tree to AML text, indenting by `indent`
/// spaces per level (0 writes everything on one line).
pub fn serialize(tree: &Node, indent: usize) -> Result<String> {
    let mut writer = if indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    } else {
        Writer::new(Vec::new())
    };
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    let root = tree
        .as_object()
        .ok_or_else(|| MamlError::Xml("root of the tree must be a mapping".into()))?;
    for (tag, value) in root {
        write_elements(&mut writer, tag, value)?;
    }
    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| MamlError::Xml(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

fn write_elements(writer: &mut Writer<Vec<u8>>, tag: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(list) => {
            for item in list {
                write_element(writer, tag, item)?;
            }
            Ok(())
        }
        other => write_element(writer, tag, other),
    }
}

fn is_empty_list(value: &Value) -> bool {
    matches!(value, Value::Array(list) if list.is_empty())
}

fn write_element(writer: &mut Writer<Vec<u8>>, tag: &str, value: &Value) -> Result<()> {
    let mut start = BytesStart::new(tag);
    match value {
        Value::Null => {
            writer.write_event(Event::Empty(start))?;
        }
        Value::Object(map) => {
            for (key, v) in map {
                if let Some(name) = key.strip_prefix('@') {
                    if let Some(t) = text(v) {
                        start.push_attribute((name, t.as_str()));
                    }
                }
            }
            let body = map.get(TEXT).and_then(text);
            let nested: Vec<(&String, &Value)> = map
                .iter()
                .filter(|(k, v)| !k.starts_with('@') && k.as_str() != TEXT && !is_empty_list(v))
                .collect();
            if body.is_none() && nested.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }
            writer.write_event(Event::Start(start))?;
            if let Some(body) = body {
                writer.write_event(Event::Text(BytesText::new(&body)))?;
            }
            for (child, v) in nested {
                write_elements(writer, child, v)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        scalar => {
            let body = text(scalar).unwrap_or_default();
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&body)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}
