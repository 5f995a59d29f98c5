//! Arena-backed document tree.
//!
//! Nodes follow the element/text/tail model: `text` is the content before the
//! first child, `tail` is the content after the node's end tag and before its
//! next sibling. Nodes live in a single arena owned by [`Tree`] and refer to
//! each other through [`NodeId`], which gives cheap parent links for ancestor
//! queries without shared ownership.

use crate::error::NormalizeError;
use std::collections::BTreeMap;

/// Handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Kind of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Element,
    /// A markup comment. Its `text` holds the comment body.
    Comment,
}

/// A single tree element.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub kind: NodeKind,
    /// Tag name, possibly namespaced (`{uri}name` or `prefix:name`).
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub tail: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Tag name without namespace URI or prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The raw `class` attribute, empty if absent.
    pub fn class(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Whether the whitespace-separated `class` attribute contains `token`.
    pub fn has_class(&self, token: &str) -> bool {
        self.class().split_whitespace().any(|c| c == token)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_comment(&self) -> bool {
        self.kind == NodeKind::Comment
    }
}

/// Strip a `{uri}` or `prefix:` qualifier from a tag name.
pub fn local_name(tag: &str) -> &str {
    let tag = tag.rsplit_once('}').map_or(tag, |(_, name)| name);
    tag.rsplit_once(':').map_or(tag, |(_, name)| name)
}

/// Replacement content for a spliced node: leading text followed by nodes,
/// the same shape as the inside of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub nodes: Vec<NodeId>,
}

impl Fragment {
    pub fn new(text: impl Into<String>, nodes: Vec<NodeId>) -> Self {
        Self {
            text: text.into(),
            nodes,
        }
    }

    /// A fragment consisting only of text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }
}

/// An owned document tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree holding a single root element.
    pub fn new(root_tag: impl Into<String>) -> Self {
        let root = Node {
            tag: root_tag.into(),
            ..Default::default()
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Make `id` the root, discarding everything outside its subtree.
    pub(crate) fn reroot(&mut self, id: NodeId) {
        self.unlink(id);
        self.nodes[id.0].tail.clear();
        self.root = id;
    }

    /// Put the current root under a new element `tag`, which becomes the root.
    pub fn wrap_root(&mut self, tag: impl Into<String>) -> NodeId {
        let old = self.root;
        let wrapper = self.create_element(tag);
        self.nodes[old.0].tail.clear();
        self.append_child(wrapper, old);
        self.root = wrapper;
        wrapper
    }

    /// Borrow a node. Ids are only handed out by this tree, so lookup cannot fail.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(Node {
            tag: tag.into(),
            ..Default::default()
        })
    }

    /// Create a detached element with initial text.
    pub fn create_text_element(&mut self, tag: impl Into<String>, text: impl Into<String>) -> NodeId {
        self.push(Node {
            tag: tag.into(),
            text: text.into(),
            ..Default::default()
        })
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, body: impl Into<String>) -> NodeId {
        self.push(Node {
            kind: NodeKind::Comment,
            text: body.into(),
            ..Default::default()
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.nodes[parent.0].children.len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(
            child != parent && !self.ancestors(parent).any(|a| a == child),
            "insertion would create a cycle"
        );
        self.unlink(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove `id` from its parent's child list without touching any text.
    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Iterate over the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// First direct child matching `pred`.
    pub fn find_child(&self, id: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|&c| pred(&self.nodes[c.0]))
    }

    /// Position of `id` in its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.0].parent?;
        self.nodes[parent.0].children.iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .map(|i| self.nodes[parent.0].children[i])
    }

    /// The text run immediately before `id`: the previous sibling's tail, or
    /// the parent's text when `id` is the first child.
    pub fn preceding_text(&self, id: NodeId) -> &str {
        match (self.previous_sibling(id), self.nodes[id.0].parent) {
            (Some(prev), _) => &self.nodes[prev.0].tail,
            (None, Some(parent)) => &self.nodes[parent.0].text,
            (None, None) => "",
        }
    }

    pub fn preceding_text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match (self.previous_sibling(id), self.nodes[id.0].parent) {
            (Some(prev), _) => Some(&mut self.nodes[prev.0].tail),
            (None, Some(parent)) => Some(&mut self.nodes[parent.0].text),
            (None, None) => None,
        }
    }

    /// Concatenated text of `id` and its descendants, excluding `id`'s own tail.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        if node.kind == NodeKind::Comment {
            return;
        }
        out.push_str(&node.text);
        for &child in &node.children {
            self.collect_text(child, out);
            out.push_str(&self.nodes[child.0].tail);
        }
    }

    /// Replace `target` with the content of `fragment`, keeping the text
    /// around it continuous.
    ///
    /// The fragment's leading text is appended to whatever precedes the
    /// target (previous sibling's tail, or the parent's text). The target's
    /// tail follows the last inserted node, or the leading text when the
    /// fragment has no nodes. Fragment nodes that are attached elsewhere
    /// (typically the target's own children) are moved. The target ends up
    /// detached with an empty tail.
    pub fn splice(&mut self, target: NodeId, fragment: Fragment) -> Result<(), NormalizeError> {
        let parent = self.nodes[target.0]
            .parent
            .ok_or(NormalizeError::SpliceRoot)?;
        let Fragment { text, nodes } = fragment;

        for &node in &nodes {
            debug_assert!(node != target, "a node cannot replace itself");
            self.unlink(node);
        }

        let index = self
            .index_in_parent(target)
            .ok_or(NormalizeError::SpliceRoot)?;
        let tail = std::mem::take(&mut self.nodes[target.0].tail);
        self.unlink(target);

        let mut leading = text;
        if nodes.is_empty() {
            leading.push_str(&tail);
        }
        match index.checked_sub(1) {
            Some(prev) => {
                let prev = self.nodes[parent.0].children[prev];
                self.nodes[prev.0].tail.push_str(&leading);
            }
            None => self.nodes[parent.0].text.push_str(&leading),
        }

        if let Some(&last) = nodes.last() {
            for (offset, &node) in nodes.iter().enumerate() {
                self.nodes[parent.0].children.insert(index + offset, node);
                self.nodes[node.0].parent = Some(parent);
            }
            self.nodes[last.0].tail.push_str(&tail);
        }

        Ok(())
    }

    /// Remove `target` from the tree, merging its tail into the preceding text.
    pub fn detach(&mut self, target: NodeId) -> Result<(), NormalizeError> {
        self.splice(target, Fragment::default())
    }
}

/// Iterator over a node's ancestors.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `<p>A<b>B</b>C<target>T</target>D<i>I</i>E</p>`
    fn sample() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new("p");
        let root = tree.root();
        tree.node_mut(root).text = "A".into();
        let b = tree.create_text_element("b", "B");
        tree.node_mut(b).tail = "C".into();
        let target = tree.create_text_element("target", "T");
        tree.node_mut(target).tail = "D".into();
        let i = tree.create_text_element("i", "I");
        tree.node_mut(i).tail = "E".into();
        for child in [b, target, i] {
            tree.append_child(root, child);
        }
        (tree, root, target)
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("{http://cnx.rice.edu/mathml}math"), "math");
        assert_eq!(local_name("m:math"), "math");
        assert_eq!(local_name("section"), "section");
    }

    #[test]
    fn test_splice_zero_nodes() {
        let (mut tree, root, target) = sample();
        tree.splice(target, Fragment::text("x")).unwrap();

        assert_eq!(tree.children(root).len(), 2);
        assert_eq!(tree.text_content(root), "ABCxDIE");
        assert!(!tree.is_attached(target));
    }

    #[test]
    fn test_splice_zero_nodes_empty_text() {
        let (mut tree, root, target) = sample();
        tree.detach(target).unwrap();
        assert_eq!(tree.text_content(root), "ABCDIE");
    }

    #[test]
    fn test_splice_one_node() {
        let (mut tree, root, target) = sample();
        let sup = tree.create_text_element("sup", "2");
        tree.splice(target, Fragment::new("x", vec![sup])).unwrap();

        assert_eq!(tree.children(root).len(), 3);
        assert_eq!(tree.node(sup).tail, "D");
        assert_eq!(tree.parent(sup), Some(root));
        assert_eq!(tree.text_content(root), "ABCx2DIE");
    }

    #[test]
    fn test_splice_many_nodes() {
        let (mut tree, root, target) = sample();
        let first = tree.create_text_element("sup", "1");
        tree.node_mut(first).tail = "-".into();
        let second = tree.create_text_element("sub", "2");
        tree.splice(target, Fragment::new("", vec![first, second]))
            .unwrap();

        let tags: Vec<_> = tree
            .children(root)
            .iter()
            .map(|&c| tree.node(c).tag.clone())
            .collect();
        assert_eq!(tags, vec!["b", "sup", "sub", "i"]);
        assert_eq!(tree.text_content(root), "ABC1-2DIE");
    }

    #[test]
    fn test_splice_first_child_merges_into_parent_text() {
        let mut tree = Tree::new("p");
        let root = tree.root();
        tree.node_mut(root).text = "Total: ".into();
        let number = tree.create_text_element("number", "12");
        tree.node_mut(number).tail = " items".into();
        tree.append_child(root, number);

        tree.splice(number, Fragment::text("12")).unwrap();

        assert_eq!(tree.node(root).text, "Total: 12 items");
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn test_splice_moves_target_children() {
        let mut tree = Tree::new("p");
        let root = tree.root();
        let wrapper = tree.create_text_element("unit_number", "5");
        let unit = tree.create_text_element("sup", "2");
        tree.node_mut(unit).tail = " m".into();
        tree.append_child(wrapper, unit);
        tree.node_mut(wrapper).tail = "!".into();
        tree.append_child(root, wrapper);

        let text = tree.node(wrapper).text.clone();
        let nodes = tree.children(wrapper).to_vec();
        tree.splice(wrapper, Fragment::new(text, nodes)).unwrap();

        assert_eq!(tree.children(root), &[unit]);
        assert_eq!(tree.node(root).text, "5");
        assert_eq!(tree.node(unit).tail, " m!");
    }

    #[test]
    fn test_splice_root_fails() {
        let mut tree = Tree::new("document");
        let root = tree.root();
        assert_eq!(
            tree.splice(root, Fragment::default()),
            Err(NormalizeError::SpliceRoot)
        );
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut tree = Tree::new("a");
        let root = tree.root();
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        let d = tree.create_element("d");
        tree.append_child(root, b);
        tree.append_child(b, c);
        tree.append_child(root, d);

        assert_eq!(tree.descendants(root), vec![b, c, d]);
        assert_eq!(tree.ancestors(c).collect::<Vec<_>>(), vec![b, root]);
    }

    #[test]
    fn test_class_tokens() {
        let mut tree = Tree::new("div");
        let root = tree.root();
        tree.node_mut(root)
            .attrs
            .insert("class".into(), "worked_example  boxed".into());
        assert!(tree.node(root).has_class("boxed"));
        assert!(!tree.node(root).has_class("worked"));
    }

    #[test]
    fn test_wrap_root() {
        let (mut tree, old, _) = sample();
        let wrapper = tree.wrap_root("document");
        assert_eq!(tree.root(), wrapper);
        assert_eq!(tree.children(wrapper), &[old]);
        assert_eq!(tree.parent(old), Some(wrapper));
        assert_eq!(tree.text_content(wrapper), "ABCTDIE");
        tree.splice(old, Fragment::text("x")).unwrap();
        assert_eq!(tree.node(wrapper).text, "x");
    }
}
