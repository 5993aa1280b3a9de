//! Arena-backed document tree holding the controls that filters operate on.

use std::collections::HashMap;

/// Handle to a node stored in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node inside the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of content stored at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// An element with its tag name and attributes in source order.
///
/// Form state lives in attributes: an input's current value is its `value`
/// attribute and an option is selected while it carries `selected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute value. Boolean attributes carry an empty value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Whether the whitespace separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }
}

/// Mutable document tree with an `id` index.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
            doctype: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn set_doctype<S: Into<String>>(&mut self, doctype: S) {
        self.doctype = Some(doctype.into());
    }

    /// Append an element under `parent`, indexing its `id` attribute.
    pub fn create_element<S: Into<String>>(
        &mut self,
        parent: NodeId,
        tag: S,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let element = Element {
            tag: tag.into().to_ascii_lowercase(),
            attrs,
        };
        let id_attr = element.attr("id").map(str::to_owned);
        let node = self.push_node(parent, NodeKind::Element(element));
        if let Some(id_attr) = id_attr {
            self.index_id(id_attr, node);
        }
        node
    }

    /// Append a text node under `parent`.
    pub fn create_text<S: Into<String>>(&mut self, parent: NodeId, text: S) -> NodeId {
        self.push_node(parent, NodeKind::Text(text.into()))
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            children: Vec::new(),
            kind,
        });
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        id
    }

    fn index_id(&mut self, id: String, node: NodeId) {
        if id.is_empty() {
            return;
        }
        self.id_index.entry(id).or_default().push(node);
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attr(name))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .map(|element| element.has_class(class))
            .unwrap_or(false)
    }

    /// First element carrying the given `id`, in document order.
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).and_then(|nodes| nodes.first().copied())
    }

    /// All nodes below `root` in document (pre-)order, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Elements below `root` with the given tag, in document order.
    pub fn descendants_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| {
                self.tag_name(*node)
                    .map(|name| name.eq_ignore_ascii_case(tag))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Every element in the document carrying `class`, in document order.
    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    /// Concatenated text of every text node below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(_) => self
                .descendants(node)
                .into_iter()
                .filter_map(|child| match self.kind(child) {
                    Some(NodeKind::Text(text)) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Current value of a form control; empty when unset.
    pub fn value(&self, node: NodeId) -> &str {
        self.attr(node, "value").unwrap_or("")
    }

    /// Replace a control's value. Returns `false` when `node` is not an element.
    pub fn set_value<S: Into<String>>(&mut self, node: NodeId, value: S) -> bool {
        match self.element_mut(node) {
            Some(element) => {
                element.set_attr("value", value.into());
                true
            }
            None => false,
        }
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.attr(node, "selected").is_some()
    }

    pub fn set_selected(&mut self, node: NodeId, selected: bool) {
        if let Some(element) = self.element_mut(node) {
            if selected {
                element.set_attr("selected", String::new());
            } else {
                element.remove_attr("selected");
            }
        }
    }

    /// Whether the inline style hides the node with `display: none`.
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.attr(node, "style")
            .map(display_is_none)
            .unwrap_or(false)
    }

    /// Hide the node, or restore its default display by dropping the inline
    /// `display` declaration. Other inline declarations are kept.
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        let style = rewrite_display(element.attr("style").unwrap_or(""), hidden);
        if style.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", style);
        }
    }
}

fn declarations(style: &str) -> impl Iterator<Item = &str> {
    style.split(';').map(str::trim).filter(|decl| !decl.is_empty())
}

fn is_display_declaration(decl: &str) -> bool {
    decl.split_once(':')
        .map(|(property, _)| property.trim().eq_ignore_ascii_case("display"))
        .unwrap_or(false)
}

fn display_is_none(style: &str) -> bool {
    declarations(style)
        .filter(|decl| is_display_declaration(decl))
        .last()
        .and_then(|decl| decl.split_once(':'))
        .map(|(_, value)| value.trim().eq_ignore_ascii_case("none"))
        .unwrap_or(false)
}

fn rewrite_display(style: &str, hidden: bool) -> String {
    let mut kept: Vec<&str> = declarations(style)
        .filter(|decl| !is_display_declaration(decl))
        .collect();
    if hidden {
        kept.push("display: none");
    }
    kept.join("; ")
}
