//! Normalization of numeric markup.
//!
//! Currency, percentage, number and unit elements are rewritten into plain
//! text runs (plus `sup` elements for exponents outside math) before
//! rendering. Rules run in a fixed order, each over a worklist collected up
//! front and processed innermost-first, so edits never invalidate a live
//! iterator. After the pass none of the matched element kinds remain, which
//! makes a second pass a no-op.

mod number;

pub use number::{format_amount, format_number, format_number_in, parse_literal, round_literal, NumberLiteral};

use crate::config::{CurrencyPosition, NumberPolicy};
use crate::error::NormalizeError;
use crate::tree::{Fragment, Node, NodeId, Tree};

/// Formatting context of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Running text; output is escaped later by the renderer.
    Text,
    /// Inside a `latex` or `math` context; output is raw LaTeX.
    Math,
}

const THIN_SPACE: &str = "\u{2009}";

/// Element kinds rewritten by the pass.
const NUMERIC_TAGS: &[&str] = &["currency", "percentage", "number", "unit", "unit_number"];

/// Run every normalization rule over `tree`.
pub fn normalize(tree: &mut Tree, policy: &NumberPolicy) -> Result<(), NormalizeError> {
    // A numeric root is rewritten like any other node, so it needs a parent.
    let root = tree.node(tree.root()).local_name();
    if NUMERIC_TAGS.iter().any(|&tag| tag == root) {
        tree.wrap_root("document");
    }

    let currencies = normalize_currencies(tree, policy)?;
    let percentages = normalize_percentages(tree)?;
    let reordered = order_unit_numbers(tree);
    let numbers = number::normalize_numbers(tree)?;
    let units = normalize_units(tree)?;
    let unwrapped = unwrap_unit_numbers(tree)?;

    tracing::debug!(
        currencies,
        percentages,
        reordered,
        numbers,
        units,
        unwrapped,
        "Normalization pass completed"
    );
    Ok(())
}

/// Formatting mode at `id`, from the nearest math context among its ancestors.
pub fn mode_at(tree: &Tree, id: NodeId) -> Mode {
    if tree.ancestors(id).any(|a| is_math_context(tree.node(a))) {
        Mode::Math
    } else {
        Mode::Text
    }
}

fn is_math_context(node: &Node) -> bool {
    matches!(node.local_name(), "latex" | "math") || node.has_class("latex") || node.has_class("math")
}

/// Whether `id` sits inside content that must be reproduced literally.
pub(crate) fn is_verbatim(tree: &Tree, id: NodeId) -> bool {
    tree.ancestors(id).any(|a| {
        let node = tree.node(a);
        matches!(node.local_name(), "pre" | "code" | "verbatim" | "shortcode")
            || node.has_class("verbatim")
            || node.has_class("shortcode")
    })
}

/// Elements named `name` below the root, innermost first.
fn collect(tree: &Tree, name: &str) -> Vec<NodeId> {
    let mut found: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|&id| {
            let node = tree.node(id);
            !node.is_comment() && node.local_name() == name
        })
        .collect();
    found.reverse();
    found
}

/// Text of the first direct child named `name`, or of attribute `name`.
fn child_or_attr(tree: &Tree, id: NodeId, name: &str) -> Option<String> {
    tree.find_child(id, |n| n.local_name() == name)
        .map(|c| tree.text_content(c).trim().to_string())
        .or_else(|| tree.node(id).attr(name).map(|v| v.trim().to_string()))
}

fn normalize_currencies(tree: &mut Tree, policy: &NumberPolicy) -> Result<usize, NormalizeError> {
    let mut count = 0;
    for id in collect(tree, "currency") {
        if tree.is_attached(id) {
            normalize_currency(tree, id, policy)?;
            count += 1;
        }
    }
    Ok(count)
}

fn normalize_currency(tree: &mut Tree, id: NodeId, policy: &NumberPolicy) -> Result<(), NormalizeError> {
    let symbol = child_or_attr(tree, id, "symbol").unwrap_or_else(|| policy.currency_symbol.clone());
    let position = child_or_attr(tree, id, "position")
        .map(|p| CurrencyPosition::from_attr(&p))
        .unwrap_or(policy.currency_position);
    let number = tree
        .find_child(id, |n| n.local_name() == "number")
        .ok_or(NormalizeError::MissingCurrencyNumber)?;

    let literal_text = tree.text_content(number);
    let literal = parse_literal(&literal_text)?;
    if literal.exponent.is_some() {
        return Err(NormalizeError::MalformedNumber(literal_text));
    }

    let places = match tree.node(id).attr("precision") {
        Some(precision) => precision
            .trim()
            .parse::<usize>()
            .map_err(|_| NormalizeError::InvalidPrecision(precision.to_string()))?,
        None if literal.fraction.is_none() => policy.integer_precision,
        None => policy.fractional_precision,
    };

    let mode = mode_at(tree, id);
    let amount = format_amount(&literal, places, mode);
    let symbol = symbol.replace('$', r"\$");
    let (symbol, joiner) = match mode {
        Mode::Math => (format!(r"\text{{{symbol}}}"), r"\ "),
        Mode::Text => (symbol, "\u{a0}"),
    };
    let text = match position {
        CurrencyPosition::Front => format!("{symbol}{joiner}{amount}"),
        CurrencyPosition::Back => format!("{amount}{joiner}{symbol}"),
    };

    tree.splice(id, Fragment::text(text))
}

fn normalize_percentages(tree: &mut Tree) -> Result<usize, NormalizeError> {
    let mut count = 0;
    for id in collect(tree, "percentage") {
        if !tree.is_attached(id) {
            continue;
        }
        if let Some(inner) = tree.find_child(id, |n| n.local_name() == "number") {
            let text = tree.node(inner).text.clone();
            let children = tree.children(inner).to_vec();
            tree.splice(inner, Fragment::new(text, children))?;
        }

        let sign = match mode_at(tree, id) {
            Mode::Math => r"\%",
            Mode::Text => "%",
        };
        let node = tree.node_mut(id);
        node.tag = "number".to_string();
        node.tail.insert_str(0, sign);
        count += 1;
    }
    Ok(count)
}

/// Put the number first in `unit_number` elements written unit-first.
fn order_unit_numbers(tree: &mut Tree) -> usize {
    let mut count = 0;
    for id in collect(tree, "unit_number") {
        let elements: Vec<NodeId> = tree
            .children(id)
            .iter()
            .copied()
            .filter(|&c| !tree.node(c).is_comment())
            .collect();
        let [unit, number] = elements[..] else {
            continue;
        };
        if tree.node(unit).local_name() != "unit" || tree.node(number).local_name() != "number" {
            continue;
        }
        let Some(index) = tree.index_in_parent(unit) else {
            continue;
        };

        // The text between and after the pair stays where it was.
        let between = std::mem::take(&mut tree.node_mut(unit).tail);
        let after = std::mem::take(&mut tree.node_mut(number).tail);
        tree.insert_child(id, index, number);
        tree.node_mut(number).tail = between;
        tree.node_mut(unit).tail = after;
        count += 1;
    }
    count
}

enum UnitPart {
    Text(String),
    Exponent(String),
}

fn normalize_units(tree: &mut Tree) -> Result<usize, NormalizeError> {
    let mut count = 0;
    for id in collect(tree, "unit") {
        if !tree.is_attached(id) {
            continue;
        }
        let fragment = if is_verbatim(tree, id) {
            Fragment::new(tree.node(id).text.clone(), tree.children(id).to_vec())
        } else {
            unit_fragment(tree, id)
        };
        tree.splice(id, fragment)?;
        count += 1;
    }
    Ok(count)
}

fn unit_fragment(tree: &mut Tree, id: NodeId) -> Fragment {
    let mode = mode_at(tree, id);
    let parts = unit_parts(tree, id);
    let starts_with_degree = matches!(parts.first(), Some(UnitPart::Text(t)) if t.starts_with(['\u{b0}', '\u{2103}']));
    let spaced = !starts_with_degree && follows_number(tree, id);
    if spaced {
        if let Some(run) = tree.preceding_text_mut(id) {
            run.truncate(run.trim_end().len());
        }
    }

    match mode {
        Mode::Math => {
            let mut out = String::from(if spaced { r"\," } else { "" });
            for part in parts {
                match part {
                    UnitPart::Text(text) if !text.is_empty() => {
                        out.push_str(&format!(r"\text{{{text}}}"));
                    }
                    UnitPart::Text(_) => {}
                    UnitPart::Exponent(exp) => {
                        out.push_str(&format!("^{{{}}}", exp.replace('\u{2212}', "-")));
                    }
                }
            }
            Fragment::text(out)
        }
        Mode::Text => {
            let mut fragment = Fragment::text(if spaced { THIN_SPACE } else { "" });
            for part in parts {
                match part {
                    UnitPart::Text(text) => match fragment.nodes.last() {
                        Some(&last) => tree.node_mut(last).tail.push_str(&text),
                        None => fragment.text.push_str(&text),
                    },
                    UnitPart::Exponent(exp) => {
                        let sup = tree.create_text_element("sup", exp.replace('-', "\u{2212}"));
                        fragment.nodes.push(sup);
                    }
                }
            }
            fragment
        }
    }
}

/// Split a unit into text runs and exponents, trimmed at both ends.
fn unit_parts(tree: &Tree, id: NodeId) -> Vec<UnitPart> {
    let mut parts = vec![UnitPart::Text(tree.node(id).text.clone())];
    for &child in tree.children(id) {
        let node = tree.node(child);
        if node.is_comment() {
            // Dropped, but its tail is still part of the unit.
        } else if matches!(node.local_name(), "sup" | "exponent") {
            parts.push(UnitPart::Exponent(tree.text_content(child).trim().to_string()));
        } else {
            push_text(&mut parts, &tree.text_content(child));
        }
        push_text(&mut parts, &node.tail);
    }

    if let Some(UnitPart::Text(first)) = parts.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(UnitPart::Text(last)) = parts.last_mut() {
        *last = last.trim_end().to_string();
    }
    parts
}

fn push_text(parts: &mut Vec<UnitPart>, text: &str) {
    match parts.last_mut() {
        Some(UnitPart::Text(run)) => run.push_str(text),
        _ => parts.push(UnitPart::Text(text.to_string())),
    }
}

fn follows_number(tree: &Tree, id: NodeId) -> bool {
    let preceding = tree.preceding_text(id);
    let in_unit_number = tree
        .parent(id)
        .is_some_and(|p| tree.node(p).local_name() == "unit_number")
        && (tree.previous_sibling(id).is_some() || !preceding.trim().is_empty());
    in_unit_number || preceding.trim_end().ends_with(|c: char| c.is_ascii_digit())
}

fn unwrap_unit_numbers(tree: &mut Tree) -> Result<usize, NormalizeError> {
    let mut count = 0;
    for id in collect(tree, "unit_number") {
        if !tree.is_attached(id) {
            continue;
        }
        let text = tree.node(id).text.clone();
        let children = tree.children(id).to_vec();
        tree.splice(id, Fragment::new(text, children))?;
        count += 1;
    }
    Ok(count)
}
