//! Deterministic in-memory page, suitable for unit tests and early
//! integration.
//!
//! Markup written through [`DomSurface::set_inner_html`] is kept verbatim, so
//! reading it back (and restoring a saved snapshot) is byte-identical. The
//! top-level structure of well-formed fragments is additionally materialized
//! into child nodes so attribute and class lookups inside injected content
//! work; a fragment the reader cannot shape is kept as a single text run.
//! Raw markup stays authoritative for a subtree set wholesale: mutating a
//! materialized child does not rewrite the parent's stored markup.

use std::collections::HashMap;

use parking_lot::RwLock;
use shimmer_core_types::{NodeId, Selector};

use crate::{DomError, DomSurface};

struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    text: Option<String>,
    raw_markup: Option<String>,
}

impl Node {
    fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            classes: Vec::new(),
            text: None,
            raw_markup: None,
        }
    }

    fn text_run(text: String) -> Self {
        Self {
            tag: String::new(),
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            classes: Vec::new(),
            text: Some(text),
            raw_markup: None,
        }
    }

    fn is_element(&self) -> bool {
        !self.tag.is_empty()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_attr(&self, name: &str) -> bool {
        if name == "class" {
            return !self.classes.is_empty();
        }
        self.attributes.iter().any(|(n, _)| n == name)
    }
}

struct Inner {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
}

impl Inner {
    fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    fn insert_node(&mut self, parent: &NodeId, mut node: Node) -> NodeId {
        let id = NodeId::new();
        node.parent = Some(parent.clone());
        self.nodes.insert(id.clone(), node);
        if let Some(parent) = self.get_mut(parent) {
            parent.children.push(id.clone());
        }
        id
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(&child);
            }
        }
    }

    fn detach_children(&mut self, id: &NodeId) {
        let children = match self.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.remove_subtree(&child);
        }
    }

    /// Element handles in document order.
    fn elements_from(&self, start: &NodeId, include_start: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        if include_start {
            stack.push(start.clone());
        } else if let Some(node) = self.get(start) {
            for child in node.children.iter().rev() {
                stack.push(child.clone());
            }
        }
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(&id) {
                for child in node.children.iter().rev() {
                    stack.push(child.clone());
                }
                if node.is_element() {
                    out.push(id);
                }
            }
        }
        out
    }

    fn render(&self, id: &NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        if !node.is_element() {
            return node.text.clone().unwrap_or_default();
        }
        let mut out = format!("<{}", node.tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        if !node.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", node.classes.join(" ")));
        }
        out.push('>');
        out.push_str(&self.render_inner(id));
        out.push_str(&format!("</{}>", node.tag));
        out
    }

    fn render_inner(&self, id: &NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        if let Some(raw) = &node.raw_markup {
            return raw.clone();
        }
        node.children.iter().map(|child| self.render(child)).collect()
    }

    fn materialize(&mut self, parent: &NodeId, parsed: Parsed) {
        match parsed {
            Parsed::Text(text) => {
                self.insert_node(parent, Node::text_run(text));
            }
            Parsed::Element {
                tag,
                attributes,
                classes,
                raw,
                children,
            } => {
                let node = Node {
                    tag,
                    parent: None,
                    children: Vec::new(),
                    attributes,
                    classes,
                    text: None,
                    raw_markup: Some(raw),
                };
                let id = self.insert_node(parent, node);
                for child in children {
                    self.materialize(&id, child);
                }
            }
        }
    }
}

/// In-memory [`DomSurface`] implementation.
pub struct InMemoryDom {
    inner: RwLock<Inner>,
}

impl InMemoryDom {
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), Node::element("body"));
        Self {
            inner: RwLock::new(Inner { nodes, root }),
        }
    }

    /// Handle of the document root (`<body>`).
    pub fn root(&self) -> NodeId {
        self.inner.read().root.clone()
    }

    /// Create a detached element. Attach it with [`InMemoryDom::append_child`].
    pub fn create_element(&self, tag: &str) -> NodeId {
        let id = NodeId::new();
        self.inner
            .write()
            .nodes
            .insert(id.clone(), Node::element(tag));
        id
    }

    pub fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(parent) || !inner.nodes.contains_key(child) {
            return Err(DomError::NodeGone);
        }
        if let Some(old_parent) = inner.get(child).and_then(|node| node.parent.clone()) {
            if let Some(old) = inner.get_mut(&old_parent) {
                old.children.retain(|c| c != child);
            }
        }
        if let Some(node) = inner.get_mut(child) {
            node.parent = Some(parent.clone());
        }
        if let Some(node) = inner.get_mut(parent) {
            node.children.push(child.clone());
            node.raw_markup = None;
        }
        Ok(())
    }

    /// Replace the node's content with a single text run.
    pub fn set_text(&self, node: &NodeId, text: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(node) {
            return Err(DomError::NodeGone);
        }
        inner.detach_children(node);
        inner.insert_node(node, Node::text_run(text.to_string()));
        if let Some(node) = inner.get_mut(node) {
            node.raw_markup = None;
        }
        Ok(())
    }
}

impl DomSurface for InMemoryDom {
    fn query(&self, selector: &Selector) -> Option<NodeId> {
        let inner = self.inner.read();
        let sel = selector.0.as_str();
        inner
            .elements_from(&inner.root, true)
            .into_iter()
            .find(|id| {
                let Some(node) = inner.get(id) else {
                    return false;
                };
                if let Some(id_value) = sel.strip_prefix('#') {
                    node.attr("id") == Some(id_value)
                } else if let Some(class) = sel.strip_prefix('.') {
                    node.classes.iter().any(|c| c == class)
                } else {
                    node.tag == sel
                }
            })
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let inner = self.inner.read();
        let node = inner.get(node)?;
        if name == "class" {
            if node.classes.is_empty() {
                return None;
            }
            return Some(node.classes.join(" "));
        }
        node.attr(name).map(str::to_string)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner.get_mut(node).ok_or(DomError::NodeGone)?;
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_string).collect();
            return Ok(());
        }
        match node.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner.get_mut(node).ok_or(DomError::NodeGone)?;
        if name == "class" {
            node.classes.clear();
            return Ok(());
        }
        node.attributes.retain(|(n, _)| n != name);
        Ok(())
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        let inner = self.inner.read();
        inner
            .get(node)
            .map(|node| node.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&self, node: &NodeId, class: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner.get_mut(node).ok_or(DomError::NodeGone)?;
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, node: &NodeId, class: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner.get_mut(node).ok_or(DomError::NodeGone)?;
        node.classes.retain(|c| c != class);
        Ok(())
    }

    fn inner_html(&self, node: &NodeId) -> Result<String, DomError> {
        let inner = self.inner.read();
        if !inner.nodes.contains_key(node) {
            return Err(DomError::NodeGone);
        }
        Ok(inner.render_inner(node))
    }

    fn set_inner_html(&self, node: &NodeId, markup: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(node) {
            return Err(DomError::NodeGone);
        }
        inner.detach_children(node);
        match FragmentReader::new(markup).parse() {
            Some(parsed) => {
                for node_parsed in parsed {
                    inner.materialize(node, node_parsed);
                }
            }
            None => {
                inner.insert_node(node, Node::text_run(markup.to_string()));
            }
        }
        if let Some(node) = inner.get_mut(node) {
            node.raw_markup = Some(markup.to_string());
            node.text = None;
        }
        Ok(())
    }

    fn closest_with_attribute(&self, node: &NodeId, name: &str) -> Option<NodeId> {
        let inner = self.inner.read();
        let mut current = Some(node.clone());
        while let Some(id) = current {
            let node = inner.get(&id)?;
            if node.is_element() && node.has_attr(name) {
                return Some(id);
            }
            current = node.parent.clone();
        }
        None
    }

    fn descendant_with_attribute(&self, node: &NodeId, name: &str) -> Option<NodeId> {
        let inner = self.inner.read();
        inner
            .elements_from(node, false)
            .into_iter()
            .find(|id| inner.get(id).map(|n| n.has_attr(name)).unwrap_or(false))
    }

    fn first_child_element(&self, node: &NodeId) -> Option<NodeId> {
        let inner = self.inner.read();
        inner
            .get(node)?
            .children
            .iter()
            .find(|child| inner.get(child).map(Node::is_element).unwrap_or(false))
            .cloned()
    }

    fn nodes_with_class(&self, class: &str) -> Vec<NodeId> {
        let inner = self.inner.read();
        inner
            .elements_from(&inner.root, true)
            .into_iter()
            .filter(|id| {
                inner
                    .get(id)
                    .map(|node| node.classes.iter().any(|c| c == class))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn nodes_with_attribute(&self, name: &str) -> Vec<NodeId> {
        let inner = self.inner.read();
        inner
            .elements_from(&inner.root, true)
            .into_iter()
            .filter(|id| inner.get(id).map(|node| node.has_attr(name)).unwrap_or(false))
            .collect()
    }
}

enum Parsed {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        classes: Vec<String>,
        raw: String,
        children: Vec<Parsed>,
    },
    Text(String),
}

/// Minimal well-formed fragment reader: elements, attributes, text runs and
/// comments. Returns `None` on anything it cannot shape; the caller then
/// keeps the markup as one opaque text run.
struct FragmentReader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> FragmentReader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn parse(mut self) -> Option<Vec<Parsed>> {
        let nodes = self.parse_nodes(None)?;
        (self.pos == self.input.len()).then_some(nodes)
    }

    fn parse_nodes(&mut self, until: Option<&str>) -> Option<Vec<Parsed>> {
        let mut nodes = Vec::new();
        loop {
            if self.rest().is_empty() {
                return if until.is_none() { Some(nodes) } else { None };
            }
            if self.rest().starts_with("</") {
                // Caller consumes the close tag.
                return if until.is_some() { Some(nodes) } else { None };
            }
            if self.rest().starts_with("<!--") {
                let end = self.rest().find("-->")?;
                self.pos += end + 3;
                continue;
            }
            if self.rest().starts_with('<') {
                let element = self.parse_element()?;
                nodes.push(element);
                continue;
            }
            let end = self.rest().find('<').unwrap_or(self.rest().len());
            nodes.push(Parsed::Text(self.rest()[..end].to_string()));
            self.pos += end;
        }
    }

    fn parse_element(&mut self) -> Option<Parsed> {
        self.pos += 1;
        let tag = self.read_name()?;
        let mut attributes = Vec::new();
        let mut classes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("/>") {
                self.pos += 2;
                return Some(Parsed::Element {
                    tag,
                    attributes,
                    classes,
                    raw: String::new(),
                    children: Vec::new(),
                });
            }
            if self.rest().starts_with('>') {
                self.pos += 1;
                break;
            }
            let name = self.read_name()?;
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attr_value()?
            } else {
                String::new()
            };
            if name == "class" {
                classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                attributes.push((name, value));
            }
        }
        let content_start = self.pos;
        let children = self.parse_nodes(Some(tag.as_str()))?;
        let raw = self.input[content_start..self.pos].to_string();
        self.pos += 2;
        let close = self.read_name()?;
        if close != tag {
            return None;
        }
        self.skip_whitespace();
        if !self.rest().starts_with('>') {
            return None;
        }
        self.pos += 1;
        Some(Parsed::Element {
            tag,
            attributes,
            classes,
            raw,
            children,
        })
    }

    fn read_name(&mut self) -> Option<String> {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_' || *ch == ':'))
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(rest[..end].to_string())
    }

    fn read_attr_value(&mut self) -> Option<String> {
        let rest = self.rest();
        if let Some(stripped) = rest.strip_prefix('"') {
            let end = stripped.find('"')?;
            self.pos += end + 2;
            return Some(stripped[..end].to_string());
        }
        if let Some(stripped) = rest.strip_prefix('\'') {
            let end = stripped.find('\'')?;
            self.pos += end + 2;
            return Some(stripped[..end].to_string());
        }
        let end = rest
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() || *ch == '>' || *ch == '/')
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(rest[..end].to_string())
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, ch)| !ch.is_whitespace())
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        self.pos += end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_html_round_trips_verbatim() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.append_child(&dom.root(), &region).unwrap();

        let markup = "  <p data-x=\"1\">hello <b>world</b></p> trailing ";
        dom.set_inner_html(&region, markup).unwrap();
        assert_eq!(dom.inner_html(&region).unwrap(), markup);
    }

    #[test]
    fn malformed_markup_kept_as_text() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.append_child(&dom.root(), &region).unwrap();

        let markup = "<div>never closed";
        dom.set_inner_html(&region, markup).unwrap();
        assert_eq!(dom.inner_html(&region).unwrap(), markup);
        assert!(dom.first_child_element(&region).is_none());
    }

    #[test]
    fn parsed_children_expose_attributes_and_classes() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.append_child(&dom.root(), &region).unwrap();

        dom.set_inner_html(
            &region,
            "<div class=\"card shiny\" data-state='{\"n\":1}'>body</div>",
        )
        .unwrap();

        let child = dom.first_child_element(&region).expect("child element");
        assert_eq!(
            dom.attribute(&child, "data-state").as_deref(),
            Some("{\"n\":1}")
        );
        assert!(dom.has_class(&child, "card"));
        assert!(dom.has_class(&child, "shiny"));
    }

    #[test]
    fn descendant_lookup_skips_self_and_recurses() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.set_attribute(&region, "data-state", "outer").unwrap();
        dom.append_child(&dom.root(), &region).unwrap();

        dom.set_inner_html(&region, "<section><span data-state=\"inner\">x</span></section>")
            .unwrap();

        let found = dom
            .descendant_with_attribute(&region, "data-state")
            .expect("nested node");
        assert_eq!(dom.attribute(&found, "data-state").as_deref(), Some("inner"));
    }

    #[test]
    fn query_supports_id_class_and_tag() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.set_attribute(&region, "id", "content").unwrap();
        dom.append_child(&dom.root(), &region).unwrap();
        dom.add_class(&region, "panel").unwrap();

        assert_eq!(dom.query(&Selector("#content".into())), Some(region.clone()));
        assert_eq!(dom.query(&Selector(".panel".into())), Some(region.clone()));
        assert_eq!(dom.query(&Selector("div".into())), Some(region));
        assert!(dom.query(&Selector("#missing".into())).is_none());
    }

    #[test]
    fn closest_walks_ancestors() {
        let dom = InMemoryDom::new();
        let container = dom.create_element("div");
        dom.set_attribute(&container, "data-skeleton", "").unwrap();
        dom.append_child(&dom.root(), &container).unwrap();

        let button = dom.create_element("button");
        dom.append_child(&container, &button).unwrap();

        assert_eq!(
            dom.closest_with_attribute(&button, "data-skeleton"),
            Some(container)
        );
        assert!(dom.closest_with_attribute(&button, "data-other").is_none());
    }

    #[test]
    fn class_mutations_are_idempotent() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.append_child(&dom.root(), &region).unwrap();

        dom.add_class(&region, "skeleton-loading").unwrap();
        dom.add_class(&region, "skeleton-loading").unwrap();
        assert_eq!(
            dom.attribute(&region, "class").as_deref(),
            Some("skeleton-loading")
        );

        dom.remove_class(&region, "skeleton-loading").unwrap();
        dom.remove_class(&region, "skeleton-loading").unwrap();
        assert!(!dom.has_class(&region, "skeleton-loading"));
    }

    #[test]
    fn builder_trees_render_without_raw_markup() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.append_child(&dom.root(), &region).unwrap();

        let span = dom.create_element("span");
        dom.set_text(&span, "hi").unwrap();
        dom.append_child(&region, &span).unwrap();

        assert_eq!(dom.inner_html(&region).unwrap(), "<span>hi</span>");
    }

    #[test]
    fn vanished_nodes_report_node_gone() {
        let dom = InMemoryDom::new();
        let region = dom.create_element("div");
        dom.append_child(&dom.root(), &region).unwrap();
        dom.set_inner_html(&region, "<p>a</p>").unwrap();
        let child = dom.first_child_element(&region).unwrap();

        // Replacing the content drops the old subtree.
        dom.set_inner_html(&region, "<p>b</p>").unwrap();
        assert!(matches!(
            dom.add_class(&child, "x"),
            Err(DomError::NodeGone)
        ));
        assert!(dom.attribute(&child, "id").is_none());
    }
}
