//! XML to JSON conversion for error bodies
//!
//! A small recursive descent parser covering the shapes providers use for
//! error envelopes: nested elements, repeated siblings, text, CDATA and
//! comments. Attributes are ignored. The root element becomes the single
//! key of the resulting object.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

const MAX_DEPTH: usize = 64;

/// Convert an XML document into a JSON node
pub fn xml_to_json(xml: &str) -> Result<Value> {
    let input = skip_misc(xml);
    if !input.starts_with('<') {
        return Err(xml_error("Input does not appear to be XML"));
    }

    let (name, value, rest) = parse_element(input, 0)?;
    if !skip_misc(rest).is_empty() {
        return Err(xml_error("Unexpected content after root element"));
    }

    let mut root = Map::new();
    root.insert(name, value);
    Ok(Value::Object(root))
}

fn xml_error(message: impl Into<String>) -> Error {
    Error::XmlParse {
        message: message.into(),
    }
}

/// Skip whitespace, declarations, doctype and comments
fn skip_misc(mut input: &str) -> &str {
    loop {
        input = input.trim_start();
        let end = if input.starts_with("<?") {
            input.find("?>").map(|p| p + 2)
        } else if input.starts_with("<!--") {
            input.find("-->").map(|p| p + 3)
        } else if input.starts_with("<!DOCTYPE") {
            input.find('>').map(|p| p + 1)
        } else {
            None
        };

        match end {
            Some(end) => input = &input[end..],
            None => return input,
        }
    }
}

/// Parse one element starting at `<`, returning its name, value and the rest
fn parse_element(input: &str, depth: usize) -> Result<(String, Value, &str)> {
    if depth >= MAX_DEPTH {
        return Err(xml_error(format!("Elements nested deeper than {MAX_DEPTH}")));
    }
    let tag_end = input
        .find('>')
        .ok_or_else(|| xml_error("Malformed tag"))?;
    let head = &input[1..tag_end];
    let self_closing = head.ends_with('/');
    let name = head
        .trim_end_matches('/')
        .split_whitespace()
        .next()
        .ok_or_else(|| xml_error("Missing tag name"))?
        .to_string();

    let mut rest = &input[tag_end + 1..];
    if self_closing {
        return Ok((name, Value::Null, rest));
    }

    let mut children = Map::new();
    let mut text = String::new();

    loop {
        let next = rest
            .find('<')
            .ok_or_else(|| xml_error(format!("Missing closing tag for {name}")))?;
        text.push_str(&rest[..next]);
        rest = &rest[next..];

        if let Some(after) = rest.strip_prefix("</") {
            let end = after
                .find('>')
                .ok_or_else(|| xml_error("Malformed closing tag"))?;
            let closing = after[..end].trim();
            if closing != name {
                return Err(xml_error(format!(
                    "Expected </{name}> but found </{closing}>"
                )));
            }
            rest = &after[end + 1..];
            break;
        }

        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after
                .find("-->")
                .ok_or_else(|| xml_error("Unterminated comment"))?;
            rest = &after[end + 3..];
            continue;
        }

        if let Some(after) = rest.strip_prefix("<![CDATA[") {
            let end = after
                .find("]]>")
                .ok_or_else(|| xml_error("Unterminated CDATA section"))?;
            text.push_str(&after[..end]);
            rest = &after[end + 3..];
            continue;
        }

        let (child_name, child_value, after) = parse_element(rest, depth + 1)?;
        insert_child(&mut children, child_name, child_value);
        rest = after;
    }

    let value = if !children.is_empty() {
        Value::Object(children)
    } else if text.trim().is_empty() {
        Value::Null
    } else {
        Value::String(decode_entities(text.trim()))
    };

    Ok((name, value, rest))
}

/// Repeated siblings collapse into an array
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
