//! XML document to generic ordered tree decoding
//!
//! Boundary module between the raw XCCDF document and the typed benchmark
//! model. Produces a `serde_json::Value` shaped like the conventional
//! dict-of-dicts XML mapping: attributes become `@name` keys, element text
//! becomes `#text`, and repeated child elements are promoted to arrays.
//! Key order follows document order.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Errors produced while decoding an XML document into a tree
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("XML syntax error at byte {position}: {source}")]
    Syntax {
        position: usize,
        source: quick_xml::Error,
    },

    #[error("Malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("Document ended inside element '{name}'")]
    UnclosedElement { name: String },

    #[error("Document contains no elements")]
    EmptyDocument,
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    /// Collapse a completed element into its tree value
    fn into_value(self) -> Value {
        if self.children.is_empty() {
            if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            }
        } else {
            let mut map = self.children;
            if !self.text.is_empty() {
                map.insert("#text".to_string(), Value::String(self.text));
            }
            Value::Object(map)
        }
    }
}

/// Decode an XML document into the generic ordered tree
///
/// The returned value is an object with one key per root element, so a
/// benchmark document yields `{"Benchmark": {...}}`.
pub fn decode_document(xml: &str) -> Result<Value, TreeError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Frame> = vec![Frame::new(String::new())];

    loop {
        let position = reader.buffer_position();
        match reader
            .read_event()
            .map_err(|source| TreeError::Syntax { position, source })?
        {
            Event::Start(start) => {
                let mut frame = Frame::new(local_name(start.name().as_ref()));
                collect_attributes(&start, &mut frame)?;
                stack.push(frame);
            }
            Event::Empty(start) => {
                let mut frame = Frame::new(local_name(start.name().as_ref()));
                collect_attributes(&start, &mut frame)?;
                let name = frame.name.clone();
                let value = frame.into_value();
                if let Some(parent) = stack.last_mut() {
                    insert_child(&mut parent.children, name, value);
                }
            }
            Event::Text(text) => {
                let unescaped = text
                    .unescape()
                    .map_err(|source| TreeError::Syntax { position, source })?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::End(_) => {
                // quick-xml validates end-tag pairing before we get here
                if stack.len() > 1 {
                    let frame = stack.pop().unwrap_or_else(|| Frame::new(String::new()));
                    let name = frame.name.clone();
                    let value = frame.into_value();
                    if let Some(parent) = stack.last_mut() {
                        insert_child(&mut parent.children, name, value);
                    }
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry no benchmark data
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if stack.len() > 1 {
        let name = stack.pop().map(|f| f.name).unwrap_or_default();
        return Err(TreeError::UnclosedElement { name });
    }

    let root = stack.pop().map(Frame::into_value).unwrap_or(Value::Null);
    match root {
        Value::Object(map) => Ok(Value::Object(map)),
        _ => Err(TreeError::EmptyDocument),
    }
}

/// Strip any namespace prefix from a qualified element name
fn local_name(qualified: &[u8]) -> String {
    let name = String::from_utf8_lossy(qualified);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.to_string(),
    }
}

fn collect_attributes(
    start: &quick_xml::events::BytesStart<'_>,
    frame: &mut Frame,
) -> Result<(), TreeError> {
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = format!("@{}", String::from_utf8_lossy(attribute.key.as_ref()));
        let value = attribute
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_default();
        frame.children.insert(key, Value::String(value));
    }
    Ok(())
}

/// Insert a child value, promoting repeated names to arrays
fn insert_child(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}
