//! Variant lookup by (dialect, tag, class).
//!
//! Each dialect gets a fixed table built once when the renderer is created.
//! Lookup order is exact `(tag, class)`, then class pattern, then tag, then
//! [`Variant::Generic`].

use crate::config::Dialect;
use crate::tree::Node;
use std::collections::HashMap;

/// Rendering behavior for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Template named after the tag, or `not_implemented`.
    Generic,
    /// Generic rendering through a fixed template.
    Template(&'static str),
    /// MathML through the math transform.
    Math,
    /// Content that is already LaTeX.
    Latex,
    Table,
    /// A table row; CNXML+ entries are joined with `&`.
    Row,
    Figure,
    Section,
    List,
    Link,
    Image,
    Note,
    Emphasis,
    /// A structural block with hoisted sub-nodes.
    Block(&'static BlockSpec),
}

/// A block that lifts named children out into fields of its own.
#[derive(Debug, PartialEq, Eq)]
pub struct BlockSpec {
    pub template: &'static str,
    /// `(field, child)` pairs. The child is a direct child matched by tag or
    /// class token; a missing child yields an empty field.
    pub hoist: &'static [(&'static str, &'static str)],
    /// `(attribute, default)` pairs filled in when the attribute is absent.
    pub defaults: &'static [(&'static str, &'static str)],
}

pub const DEFINITION: BlockSpec = BlockSpec {
    template: "definition",
    hoist: &[("term", "term"), ("meaning", "meaning")],
    defaults: &[],
};

pub const WORKED_EXAMPLE: BlockSpec = BlockSpec {
    template: "worked_example",
    hoist: &[("title", "title")],
    defaults: &[],
};

pub const EXERCISE: BlockSpec = BlockSpec {
    template: "exercise",
    hoist: &[("problem", "problem"), ("solution", "solution")],
    defaults: &[],
};

pub const EXERCISES: BlockSpec = BlockSpec {
    template: "exercises",
    hoist: &[("title", "title")],
    defaults: &[],
};

pub const WORKSTEP: BlockSpec = BlockSpec {
    template: "workstep",
    hoist: &[("title", "title")],
    defaults: &[],
};

pub const ACTIVITY: BlockSpec = BlockSpec {
    template: "activity",
    hoist: &[("title", "title")],
    defaults: &[("type", "activity")],
};

/// Match rule for the `class` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPattern {
    /// One whitespace-separated token equals the string.
    Token(&'static str),
    /// One token starts with the string.
    Prefix(&'static str),
}

impl ClassPattern {
    pub fn matches(&self, class: &str) -> bool {
        let mut tokens = class.split_whitespace();
        match *self {
            Self::Token(token) => tokens.any(|t| t == token),
            Self::Prefix(prefix) => tokens.any(|t| t.starts_with(prefix)),
        }
    }
}

/// Lookup table for one dialect.
#[derive(Debug)]
pub struct VariantTable {
    exact: HashMap<&'static str, Vec<(&'static str, Variant)>>,
    patterns: Vec<(Option<&'static str>, ClassPattern, Variant)>,
    tags: HashMap<&'static str, Variant>,
}

impl VariantTable {
    pub fn new(dialect: Dialect) -> Self {
        let (exact, patterns, tags) = match dialect {
            Dialect::Html => (HTML_EXACT, HTML_PATTERNS, HTML_TAGS),
            Dialect::Cnxml => (CNXML_EXACT, CNXML_PATTERNS, CNXML_TAGS),
        };

        let mut table = Self {
            exact: HashMap::new(),
            patterns: patterns.to_vec(),
            tags: tags.iter().copied().collect(),
        };
        for &(tag, class, variant) in exact {
            table.exact.entry(tag).or_default().push((class, variant));
        }
        table
    }

    /// Variant for a node.
    pub fn lookup(&self, node: &Node) -> Variant {
        let tag = node.local_name();
        let class = node.class().trim();

        if let Some(entries) = self.exact.get(tag) {
            if let Some(&(_, variant)) = entries.iter().find(|(c, _)| *c == class) {
                return variant;
            }
        }

        let by_pattern = self.patterns.iter().find(|(only_tag, pattern, _)| {
            only_tag.map_or(true, |t| t == tag) && pattern.matches(class)
        });
        if let Some(&(_, _, variant)) = by_pattern {
            return variant;
        }

        self.tags.get(tag).copied().unwrap_or(Variant::Generic)
    }
}

type Exact = &'static [(&'static str, &'static str, Variant)];
type Patterns = &'static [(Option<&'static str>, ClassPattern, Variant)];
type Tags = &'static [(&'static str, Variant)];

const HTML_EXACT: Exact = &[
    ("div", "keyconcepts", Variant::Template("keyconcepts")),
    ("div", "newwords", Variant::Template("newwords")),
];

const HTML_PATTERNS: Patterns = &[
    (None, ClassPattern::Token("latex"), Variant::Latex),
    (None, ClassPattern::Token("section"), Variant::Section),
    (None, ClassPattern::Token("figure"), Variant::Figure),
    (None, ClassPattern::Token("definition"), Variant::Block(&DEFINITION)),
    (None, ClassPattern::Token("worked_example"), Variant::Block(&WORKED_EXAMPLE)),
    (None, ClassPattern::Token("exercises"), Variant::Block(&EXERCISES)),
    (None, ClassPattern::Token("exercise"), Variant::Block(&EXERCISE)),
    (None, ClassPattern::Token("workstep"), Variant::Block(&WORKSTEP)),
    (None, ClassPattern::Token("activity"), Variant::Block(&ACTIVITY)),
    (Some("div"), ClassPattern::Prefix("note"), Variant::Note),
];

const HTML_TAGS: Tags = &[
    ("math", Variant::Math),
    ("table", Variant::Table),
    ("tr", Variant::Row),
    ("row", Variant::Row),
    ("a", Variant::Link),
    ("img", Variant::Image),
    ("ul", Variant::List),
    ("ol", Variant::List),
    ("section", Variant::Section),
    ("figure", Variant::Figure),
];

const CNXML_EXACT: Exact = &[];

const CNXML_PATTERNS: Patterns = &[(None, ClassPattern::Token("latex"), Variant::Latex)];

const CNXML_TAGS: Tags = &[
    ("math", Variant::Math),
    ("latex", Variant::Latex),
    ("table", Variant::Table),
    ("row", Variant::Row),
    ("tr", Variant::Row),
    ("figure", Variant::Figure),
    ("section", Variant::Section),
    ("list", Variant::List),
    ("link", Variant::Link),
    ("image", Variant::Image),
    ("note", Variant::Note),
    ("emphasis", Variant::Emphasis),
    ("definition", Variant::Block(&DEFINITION)),
    ("worked_example", Variant::Block(&WORKED_EXAMPLE)),
    ("exercise", Variant::Block(&EXERCISE)),
    ("exercises", Variant::Block(&EXERCISES)),
    ("workstep", Variant::Block(&WORKSTEP)),
    ("activity", Variant::Block(&ACTIVITY)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;
    use pretty_assertions::assert_eq;

    fn lookup(dialect: Dialect, tag: &str, class: Option<&str>) -> Variant {
        let mut tree = Tree::new(tag);
        let root = tree.root();
        if let Some(class) = class {
            tree.node_mut(root).attrs.insert("class".into(), class.into());
        }
        VariantTable::new(dialect).lookup(tree.node(root))
    }

    #[test]
    fn test_exact_before_pattern_before_tag() {
        assert_eq!(
            lookup(Dialect::Html, "div", Some("keyconcepts")),
            Variant::Template("keyconcepts")
        );
        assert_eq!(lookup(Dialect::Html, "div", Some("latex")), Variant::Latex);
        assert_eq!(lookup(Dialect::Html, "table", Some("latex")), Variant::Latex);
        assert_eq!(lookup(Dialect::Html, "table", None), Variant::Table);
        assert_eq!(lookup(Dialect::Html, "p", None), Variant::Generic);
    }

    #[test]
    fn test_class_patterns() {
        assert_eq!(lookup(Dialect::Html, "div", Some("note-visit")), Variant::Note);
        assert_eq!(lookup(Dialect::Html, "span", Some("note-visit")), Variant::Generic);
        assert_eq!(
            lookup(Dialect::Html, "div", Some("boxed exercise")),
            Variant::Block(&EXERCISE)
        );
        assert_eq!(
            lookup(Dialect::Html, "div", Some("exercises")),
            Variant::Block(&EXERCISES)
        );
    }

    #[test]
    fn test_dialects_use_their_own_tables() {
        assert_eq!(lookup(Dialect::Cnxml, "note", None), Variant::Note);
        assert_eq!(lookup(Dialect::Html, "note", None), Variant::Generic);
        assert_eq!(lookup(Dialect::Cnxml, "m:math", None), Variant::Math);
        assert_eq!(
            lookup(Dialect::Cnxml, "activity", None),
            Variant::Block(&ACTIVITY)
        );
    }

    #[test]
    fn test_class_pattern_matches_tokens() {
        assert!(ClassPattern::Token("a").matches("b a c"));
        assert!(!ClassPattern::Token("a").matches("ab"));
        assert!(ClassPattern::Prefix("note").matches("x notebox"));
        assert!(!ClassPattern::Prefix("note").matches(""));
    }
}
