//! XML loader producing a [`Tree`].
//!
//! Accepts CNXML+ and well-formed XHTML. Text before an element's first
//! child lands in `text`, text after an element in its `tail`. When the
//! input holds more than one top-level element they are kept under a
//! synthetic `document` root.

use crate::error::ParseError;
use crate::tree::{NodeId, Tree};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;

const DOCUMENT_ROOT: &str = "document";

/// Parse an XML string into a tree.
pub fn parse_xml(input: &str) -> Result<Tree, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut tree = Tree::new(DOCUMENT_ROOT);
    let mut stack: Vec<NodeId> = vec![tree.root()];

    loop {
        let current = stack[stack.len() - 1];
        match reader.read_event()? {
            Event::Start(e) => {
                let id = element(&mut tree, &reader, &e)?;
                tree.append_child(current, id);
                stack.push(id);
            }
            Event::Empty(e) => {
                let id = element(&mut tree, &reader, &e)?;
                tree.append_child(current, id);
            }
            Event::End(_) => {
                // quick-xml checks end names, so this always closes `current`.
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(&mut tree, current, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                append_text(&mut tree, current, &decode_entity(&entity));
            }
            Event::CData(e) => {
                append_text(&mut tree, current, &String::from_utf8_lossy(&e));
            }
            Event::Comment(e) => {
                let body = reader.decoder().decode(&e)?;
                let id = tree.create_comment(body.into_owned());
                tree.append_child(current, id);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if stack.len() > 1 {
        let open = stack[stack.len() - 1];
        return Err(ParseError::Unclosed(tree.node(open).tag.clone()));
    }

    let root = tree.root();
    let elements: Vec<NodeId> = tree
        .children(root)
        .iter()
        .copied()
        .filter(|&c| !tree.node(c).is_comment())
        .collect();
    let stray_text = !tree.node(root).text.trim().is_empty()
        || tree
            .children(root)
            .iter()
            .any(|&c| !tree.node(c).tail.trim().is_empty());

    match elements[..] {
        [] => Err(ParseError::Empty),
        [only] if !stray_text => {
            tree.reroot(only);
            Ok(tree)
        }
        _ => Ok(tree),
    }
}

fn element(tree: &mut Tree, reader: &Reader<&[u8]>, e: &BytesStart) -> Result<NodeId, ParseError> {
    let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let id = tree.create_element(tag);
    tree.node_mut(id).attrs = attributes(reader, e)?;
    Ok(id)
}

fn attributes(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<BTreeMap<String, String>, ParseError> {
    let mut attrs = BTreeMap::new();
    for attr in e.attributes().flatten() {
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// Append text to `parent`'s last child's tail, or to its own text.
fn append_text(tree: &mut Tree, parent: NodeId, text: &str) {
    match tree.children(parent).last().copied() {
        Some(last) => tree.node_mut(last).tail.push_str(text),
        None => tree.node_mut(parent).text.push_str(text),
    }
}

/// Resolve an entity reference. Unknown names are kept verbatim.
fn decode_entity(entity: &str) -> String {
    let named = match entity {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "thinsp" => "\u{2009}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "minus" => "\u{2212}",
        "times" => "\u{d7}",
        "deg" => "\u{b0}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "hellip" => "\u{2026}",
        s if s.starts_with('#') => {
            let code = match s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => s[1..].parse::<u32>().ok(),
            };
            return code
                .and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string());
        }
        _ => return format!("&{entity};"),
    };
    named.to_string()
}
