//! Field computation and template choice for each [`Variant`].

use super::dispatch::{BlockSpec, Variant};
use super::math::post_process;
use super::table;
use super::{ContentRecord, Renderer};
use crate::config::Dialect;
use crate::error::RenderError;
use crate::escape::unescape;
use crate::tree::{Node, NodeId, Tree};
use regex::Regex;
use std::sync::LazyLock;

/// Display math environments that must not be wrapped again.
static MATH_ENV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\\begin\{(equation|align|eqnarray|gather|multline)\*?\}").unwrap()
});

/// Heading templates by section nesting depth. Anything deeper uses the last.
const SECTION_LEVELS: &[&str] = &["chapter", "section", "subsection", "subsubsection", "bold"];

/// Blocks that typeset as floats; a figure inside one cannot float itself.
const FLOAT_FAMILY: &[&str] = &["exercise", "exercises", "worked_example", "activity"];

const HTML_TITLES: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "title"];

pub(super) fn render(
    r: &Renderer,
    tree: &Tree,
    id: NodeId,
    variant: Variant,
    depth: usize,
) -> Result<String, RenderError> {
    match variant {
        Variant::Generic => generic(r, tree, id, depth, tree.node(id).local_name()),
        Variant::Template(name) => generic(r, tree, id, depth, name),
        Variant::Math => math(r, tree, id),
        Variant::Latex => latex(r, tree, id, depth),
        Variant::Table => table::render_table(r, tree, id, depth),
        Variant::Row => table::render_row(r, tree, id, depth),
        Variant::Figure => figure(r, tree, id, depth),
        Variant::Section => section(r, tree, id, depth),
        Variant::List => list(r, tree, id, depth),
        Variant::Link => link(r, tree, id, depth),
        Variant::Image => image(r, tree, id, depth),
        Variant::Note => note(r, tree, id, depth),
        Variant::Emphasis => emphasis(r, tree, id, depth),
        Variant::Block(shape) => block(r, tree, id, depth, shape),
    }
}

fn structure(node: &Node, message: impl Into<String>) -> RenderError {
    RenderError::Structure {
        tag: node.local_name().to_string(),
        message: message.into(),
    }
}

/// Seeded record with `text` set to the node's inner content.
fn inner_record(r: &Renderer, tree: &Tree, id: NodeId, depth: usize, skip: &[NodeId]) -> Result<ContentRecord, RenderError> {
    let mut record = ContentRecord::seed(tree.node(id));
    record.insert("text", r.render_inner(tree, id, depth, skip)?);
    Ok(record)
}

fn generic(r: &Renderer, tree: &Tree, id: NodeId, depth: usize, template: &str) -> Result<String, RenderError> {
    let record = inner_record(r, tree, id, depth, &[])?;
    r.apply(tree.node(id), template, &record)
}

/// First direct child whose tag or class token is one of `names`.
fn find_hoisted(tree: &Tree, id: NodeId, names: &[&str]) -> Option<NodeId> {
    tree.find_child(id, |n| {
        !n.is_comment() && names.iter().any(|&name| n.local_name() == name || n.has_class(name))
    })
}

/// Inner content of a hoisted child, trimmed.
fn hoist(r: &Renderer, tree: &Tree, child: NodeId, depth: usize) -> Result<String, RenderError> {
    Ok(r.render_inner(tree, child, depth + 1, &[])?.trim().to_string())
}

fn math(r: &Renderer, tree: &Tree, id: NodeId) -> Result<String, RenderError> {
    let node = tree.node(id);
    let latex = post_process(&r.math.to_latex(tree, id)?);

    let mut record = ContentRecord::seed(node);
    record.insert("text", latex);
    record.insert("display", node.attr("display").unwrap_or("inline"));
    r.apply(node, "math", &record)
}

fn latex(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let text = unescape(&r.render_inner(tree, id, depth, &[])?);
    let text = text.trim();

    let default_display = match (r.config.dialect, node.local_name()) {
        (Dialect::Html, "div") => "block",
        _ => "inline",
    };
    let display = node.attr("display").unwrap_or(default_display);
    let mode = match display {
        "block" if MATH_ENV_RE.is_match(text) => "raw",
        "block" if !inside_table(tree, id) => "block",
        _ => "inline",
    };

    let mut record = ContentRecord::seed(node);
    record.insert("text", text);
    record.insert("display", display);
    record.insert("mode", mode);
    r.apply(node, "latex", &record)
}

fn inside_table(tree: &Tree, id: NodeId) -> bool {
    tree.ancestors(id).any(|a| tree.node(a).local_name() == "table")
}

/// Whether `id` sits inside a block that is itself typeset as a float.
fn inside_float(tree: &Tree, id: NodeId) -> bool {
    tree.ancestors(id).any(|a| {
        let node = tree.node(a);
        FLOAT_FAMILY
            .iter()
            .any(|&family| node.local_name() == family || node.has_class(family))
    })
}

fn figure(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let type_child = find_hoisted(tree, id, &["type"]);
    let caption_child = find_hoisted(tree, id, &["caption", "figcaption"]);
    let skip: Vec<NodeId> = type_child.into_iter().chain(caption_child).collect();

    let kind = type_child
        .map(|c| tree.text_content(c).trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| node.attr("type").map(str::to_string))
        .unwrap_or_else(|| "figure".to_string());

    let mut record = inner_record(r, tree, id, depth, &skip)?;
    record.insert("type", kind);
    if let Some(caption) = caption_child {
        record.insert("caption", hoist(r, tree, caption, depth)?);
    }
    record.insert("inside_float", inside_float(tree, id));
    r.apply(node, "figure", &record)
}

/// Number of sectioning ancestors of `id`.
fn section_depth(tree: &Tree, id: NodeId) -> usize {
    tree.ancestors(id)
        .filter(|&a| {
            let node = tree.node(a);
            node.local_name() == "section" || node.has_class("section")
        })
        .count()
}

fn section(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let titles = match r.config.dialect {
        Dialect::Cnxml => &["title"][..],
        Dialect::Html => HTML_TITLES,
    };
    let title = find_hoisted(tree, id, titles).ok_or_else(|| structure(node, "section has no title"))?;

    let level = node
        .attr("type")
        .and_then(|kind| SECTION_LEVELS.iter().copied().find(|&level| level == kind))
        .unwrap_or_else(|| SECTION_LEVELS[section_depth(tree, id).min(SECTION_LEVELS.len() - 1)]);

    let mut record = inner_record(r, tree, id, depth, &[title])?;
    record.insert("title", hoist(r, tree, title, depth)?);
    record.insert("type", level);
    r.apply(node, level, &record)
}

fn list(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let enumerated = node.attr("list-type") == Some("enumerated") || node.local_name() == "ol";
    let template = if enumerated { "list_enumerated" } else { "list_bulleted" };

    let record = inner_record(r, tree, id, depth, &[])?;
    r.apply(node, template, &record)
}

fn link(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let text = r.render_inner(tree, id, depth, &[])?;
    let text = text.trim();
    let href = node.attr("href").map(str::trim);

    let mut record = ContentRecord::seed(node);
    record.insert("text", text);

    let target = node
        .attr("target-id")
        .or_else(|| href.and_then(|h| h.strip_prefix('#')));
    if let (None, Some(target)) = (node.attr("url"), target) {
        record.insert("target", target);
        return r.apply(node, "link_ref", &record);
    }

    let url = node
        .attr("url")
        .or(href)
        .map_or_else(|| unescape(text), str::to_string);
    // A label repeating the URL is dropped.
    if unescape(text) == url {
        record.insert("text", "");
    }
    record.insert("url", url);
    r.apply(node, "link_url", &record)
}

fn image(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let src = node.attr("src").ok_or_else(|| structure(node, "image has no src"))?;
    let resolved = r
        .images
        .resolve(src)
        .ok_or_else(|| structure(node, format!("cannot resolve image {src}")))?;

    let width = node
        .attr("width")
        .and_then(|w| w.trim().parse::<f64>().ok())
        .filter(|w| *w > 0.0 && *w <= 1.0)
        .unwrap_or(r.config.image_width);

    let mut record = inner_record(r, tree, id, depth, &[])?;
    record.insert("src", resolved);
    record.insert("width", format!("{width:.2}"));
    r.apply(node, "image", &record)
}

/// Note kind from the `type` attribute or a `note-<kind>` class token.
fn note_kind(node: &Node) -> Option<&str> {
    node.attr("type").or_else(|| {
        node.class()
            .split_whitespace()
            .find_map(|t| t.strip_prefix("note-").or_else(|| t.strip_prefix("note_")))
    })
}

fn note(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let kind = note_kind(node);
    let template = kind
        .map(|k| format!("note_{k}"))
        .filter(|t| r.templates.has_template(t))
        .unwrap_or_else(|| "note".to_string());

    let mut record = inner_record(r, tree, id, depth, &[])?;
    record.insert("type", kind.unwrap_or(""));
    r.apply(node, &template, &record)
}

fn emphasis(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let effect = node.attr("effect").unwrap_or("italics");
    let template = Some(format!("emphasis_{effect}"))
        .filter(|t| r.templates.has_template(t))
        .unwrap_or_else(|| "emphasis_italics".to_string());

    let record = inner_record(r, tree, id, depth, &[])?;
    r.apply(node, &template, &record)
}

fn block(r: &Renderer, tree: &Tree, id: NodeId, depth: usize, shape: &BlockSpec) -> Result<String, RenderError> {
    let node = tree.node(id);
    let mut skip = Vec::new();
    let mut hoisted = Vec::new();
    for &(field, child) in shape.hoist {
        let value = match find_hoisted(tree, id, &[child]) {
            Some(c) => {
                skip.push(c);
                hoist(r, tree, c, depth)?
            }
            None => String::new(),
        };
        hoisted.push((field, value));
    }

    let mut record = inner_record(r, tree, id, depth, &skip)?;
    for &(attr, default) in shape.defaults {
        if node.attr(attr).is_none() {
            record.insert(attr, default);
        }
    }
    for (field, value) in hoisted {
        record.insert(field, value);
    }
    r.apply(node, shape.template, &record)
}
