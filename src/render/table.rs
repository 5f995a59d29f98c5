//! Tables: structure probing, column layout and generic-table fixups.

use super::{ContentRecord, Renderer};
use crate::error::RenderError;
use crate::escape::{clean_encoding, escape};
use crate::tree::{NodeId, Tree};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static ROW_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^\\])&[ \t]*\n").unwrap());

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

static PAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\par\b").unwrap());

static DISPLAY_MATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]|\$\$(.*?)\$\$").unwrap());

static WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"width=([0-9]*\.?[0-9]+)\\textwidth").unwrap());

/// Markup family of a table, found by looking at its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `row`/`entry` markup.
    Cnxml,
    /// `tr`/`td`/`th` markup.
    Generic,
}

impl TableKind {
    fn row_tag(self) -> &'static str {
        match self {
            Self::Cnxml => "row",
            Self::Generic => "tr",
        }
    }

    /// Family of a row element, whatever the document dialect.
    pub fn of_row(tag: &str) -> Option<Self> {
        match tag {
            "row" => Some(Self::Cnxml),
            "tr" => Some(Self::Generic),
            _ => None,
        }
    }

    /// Separator placed between rendered cells. Generic cells carry their own.
    fn cell_joiner(self) -> &'static str {
        match self {
            Self::Cnxml => " & ",
            Self::Generic => "",
        }
    }
}

/// Detect the table family. `None` when the table has no rows at all.
pub fn probe(tree: &Tree, table: NodeId) -> Option<TableKind> {
    [TableKind::Cnxml, TableKind::Generic]
        .into_iter()
        .find(|kind| !rows(tree, table, kind.row_tag()).is_empty())
}

/// Rows of `table`, not counting rows of nested tables.
fn rows(tree: &Tree, table: NodeId, row_tag: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(table).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        match tree.node(id).local_name() {
            "table" => {}
            name if name == row_tag => found.push(id),
            _ => stack.extend(tree.children(id).iter().rev().copied()),
        }
    }
    found
}

fn is_cell(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.node(id).local_name(), "entry" | "td" | "th")
}

/// Largest number of cells in any row. Irregular rows are tolerated.
pub fn column_count(tree: &Tree, table: NodeId) -> usize {
    let Some(kind) = probe(tree, table) else {
        return 0;
    };
    rows(tree, table, kind.row_tag())
        .into_iter()
        .map(|row| tree.children(row).iter().filter(|&&c| is_cell(tree, c)).count())
        .max()
        .unwrap_or(0)
}

/// Column specification giving every column an equal share of `table_width`.
pub fn column_spec(ncols: usize, table_width: f64) -> String {
    let width = table_width / ncols.max(1) as f64;
    let mut cols = format!("|p{{{width:.2}\\textwidth}}").repeat(ncols);
    cols.push('|');
    cols
}

/// Rewrite rendered `tr`/`td` output into valid `tabular` content.
pub fn fix_generic_table(text: &str, ncols: usize) -> String {
    let text = ROW_END_RE.replace_all(text, "${1} \\\\ \\hline\n");
    let text = PAR_RE.replace_all(&text, "");
    let text = BLANK_LINES_RE.replace_all(&text, "\n");
    let text = DISPLAY_MATH_RE.replace_all(&text, |caps: &Captures| {
        let body = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("${body}$")
    });
    let text = WIDTH_RE.replace_all(&text, |caps: &Captures| {
        let width: f64 = caps[1].parse().unwrap_or(1.0);
        format!("width={:.2}\\textwidth", width / ncols.max(1) as f64)
    });
    text.into_owned()
}

pub(super) fn render_table(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let kind = probe(tree, id).ok_or_else(|| RenderError::Structure {
        tag: node.local_name().to_string(),
        message: "table has no rows".to_string(),
    })?;
    let ncols = column_count(tree, id);
    if ncols == 0 {
        return Err(RenderError::Structure {
            tag: node.local_name().to_string(),
            message: "table has no cells".to_string(),
        });
    }

    let mut text = r.render_inner(tree, id, depth, &[])?;
    if kind == TableKind::Generic {
        text = fix_generic_table(&text, ncols);
    }

    let mut record = ContentRecord::seed(node);
    record.insert("text", text);
    record.insert("ncols", ncols);
    record.insert("cols", column_spec(ncols, r.config().table_width));
    record.insert(
        "kind",
        match kind {
            TableKind::Cnxml => "cnxml",
            TableKind::Generic => "generic",
        },
    );
    r.apply(node, "table", &record)
}

/// Render a row from its cells, dropping whitespace between them.
pub(super) fn render_row(r: &Renderer, tree: &Tree, id: NodeId, depth: usize) -> Result<String, RenderError> {
    let node = tree.node(id);
    let mut cells = Vec::new();
    for &child in node.children() {
        let child_node = tree.node(child);
        if child_node.is_comment() {
            continue;
        }
        let mut cell = r.render_at(tree, child, depth + 1)?;
        if !child_node.tail.trim().is_empty() {
            cell.push_str(&escape(&clean_encoding(&child_node.tail)));
        }
        cells.push(cell);
    }

    let joiner = TableKind::of_row(node.local_name()).map_or(" & ", TableKind::cell_joiner);
    let mut record = ContentRecord::seed(node);
    record.insert("text", cells.join(joiner));
    record.insert("entries", cells.len());
    r.apply(node, node.local_name(), &record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_count_uses_widest_row() {
        let tree = parse_xml(
            "<table><tgroup><tbody>\
             <row><entry/><entry/><entry/></row>\
             <row><entry/><entry/><entry/></row>\
             <row><entry/><entry/><entry/><entry/><entry/></row>\
             <row><entry/><entry/><entry/></row>\
             </tbody></tgroup></table>",
        )
        .unwrap();
        assert_eq!(probe(&tree, tree.root()), Some(TableKind::Cnxml));
        assert_eq!(column_count(&tree, tree.root()), 5);
    }

    #[test]
    fn test_column_count_ignores_nested_tables() {
        let tree = parse_xml(
            "<table><tr><td>a</td><td><table><tr><td/><td/><td/></tr></table></td></tr></table>",
        )
        .unwrap();
        assert_eq!(probe(&tree, tree.root()), Some(TableKind::Generic));
        assert_eq!(column_count(&tree, tree.root()), 2);
    }

    #[test]
    fn test_probe_without_rows() {
        let tree = parse_xml("<table><caption>x</caption></table>").unwrap();
        assert_eq!(probe(&tree, tree.root()), None);
        assert_eq!(column_count(&tree, tree.root()), 0);
    }

    #[test]
    fn test_column_spec() {
        assert_eq!(
            column_spec(2, 0.85),
            r"|p{0.42\textwidth}|p{0.42\textwidth}|"
        );
    }

    #[test]
    fn test_fix_generic_table() {
        let text = "a & b & \n\n\\par c & \\[x^2\\] & \n";
        assert_eq!(
            fix_generic_table(text, 2),
            "a & b  \\\\ \\hline\n c & $x^2$  \\\\ \\hline\n"
        );
    }

    #[test]
    fn test_fix_generic_table_keeps_escaped_ampersand() {
        assert_eq!(fix_generic_table("R\\&\nD", 1), "R\\&\nD");
    }

    #[test]
    fn test_fix_generic_table_rescales_widths() {
        assert_eq!(
            fix_generic_table(r"\includegraphics[width=0.50\textwidth]{a.png}", 2),
            r"\includegraphics[width=0.25\textwidth]{a.png}"
        );
        assert_eq!(fix_generic_table("$$y$$", 1), "$y$");
    }
}
