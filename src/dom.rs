//! Page document.
//!
//! The tree is html5ever's reference DOM (`markup5ever_rcdom`); elements are
//! addressed by [`NodeId`] through a registry so renderers and controllers can
//! hold plain copyable handles. Selectors go through the `selectors` matcher
//! (see [`crate::selector`]), serialization through `html5ever::serialize`.
//! Layout boxes are kept in a side map keyed by node.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeBuilderOpts, TreeSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::selector::{self, is_element, parent_handle, ElementRef, SelectorError};

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const EMPTY_PAGE: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

fn key(handle: &Handle) -> usize {
    Rc::as_ptr(handle) as usize
}

pub struct Document {
    dom: RcDom,
    /// Every element ever parsed or created; `NodeId` indexes here. Holding the
    /// handles keeps node addresses stable for `index`.
    nodes: Vec<Handle>,
    index: HashMap<usize, NodeId>,
    rects: HashMap<NodeId, Rect>,
    body: NodeId,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.nodes.len())
            .field("laid_out", &self.rects.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty page with `html`, `head` and `body`.
    pub fn new() -> Self {
        Self::parse(EMPTY_PAGE)
    }

    /// Parse a full HTML page. The parser always produces a `body`.
    pub fn parse(html: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let dom = parse_document(RcDom::default(), opts).one(html);
        let mut doc = Self {
            dom,
            nodes: Vec::new(),
            index: HashMap::new(),
            rects: HashMap::new(),
            body: NodeId(0),
        };
        let document = doc.dom.document.clone();
        doc.register_tree(&document);
        if let Some(body) = doc.query("body") {
            doc.body = body;
        }
        doc
    }

    fn register_tree(&mut self, handle: &Handle) {
        if is_element(handle) {
            self.register(handle.clone());
        }
        let children = handle.children.borrow().clone();
        for child in &children {
            self.register_tree(child);
        }
    }

    fn register(&mut self, handle: Handle) -> NodeId {
        if let Some(&id) = self.index.get(&key(&handle)) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(key(&handle), id);
        self.nodes.push(handle);
        id
    }

    fn handle(&self, id: NodeId) -> &Handle {
        &self.nodes[id.0]
    }

    fn lookup(&self, handle: &Handle) -> Option<NodeId> {
        self.index.get(&key(handle)).copied()
    }

    /// The `body` element; rendering and layout start here.
    pub fn root(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(tag.to_ascii_lowercase()),
        );
        let handle = self
            .dom
            .create_element(name, Vec::new(), ElementFlags::default());
        self.register(handle)
    }

    /// Create an element with an optional class; text is only assigned when non-empty.
    pub fn create_element_with(&mut self, tag: &str, class: Option<&str>, text: &str) -> NodeId {
        let id = self.create_element(tag);
        if let Some(class) = class {
            self.set_attribute(id, "class", class);
        }
        if !text.is_empty() {
            self.set_text(id, text);
        }
        id
    }

    // -------------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let parent = self.handle(parent).clone();
        let child = self.handle(child).clone();
        self.dom.remove_from_parent(&child);
        self.dom.append(&parent, NodeOrText::AppendNode(child));
    }

    pub fn append(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.append_child(parent, child);
        }
    }

    pub fn detach(&mut self, node: NodeId) {
        let handle = self.handle(node).clone();
        self.dom.remove_from_parent(&handle);
    }

    /// Remove every child of `node`, text included (`innerHTML = ''`).
    pub fn clear_children(&mut self, node: NodeId) {
        let removed: Vec<Handle> = self.handle(node).children.borrow_mut().drain(..).collect();
        for child in removed {
            child.parent.set(None);
        }
    }

    /// Element children in order; text nodes are skipped.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.handle(node)
            .children
            .borrow()
            .iter()
            .filter_map(|c| self.lookup(c))
            .collect()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        parent_handle(self.handle(node)).and_then(|p| self.lookup(&p))
    }

    /// Inclusive containment, like `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let ancestor = self.handle(ancestor);
        let mut cur = Some(self.handle(node).clone());
        while let Some(handle) = cur {
            if Rc::ptr_eq(&handle, ancestor) {
                return true;
            }
            cur = parent_handle(&handle);
        }
        false
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cur = self.handle(node).clone();
        while let Some(parent) = parent_handle(&cur) {
            cur = parent;
        }
        Rc::ptr_eq(&cur, &self.dom.document)
    }

    // -------------------------------------------------------------------------
    // Element data
    // -------------------------------------------------------------------------

    pub fn tag(&self, node: NodeId) -> &str {
        match &self.handle(node).data {
            NodeData::Element { name, .. } => &*name.local,
            _ => "",
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &self.handle(node).data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|a| &*a.name.local == name) {
                Some(attr) => attr.value = StrTendril::from_slice(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value: StrTendril::from_slice(value),
                }),
            }
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.handle(node).data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == name)
                .map(|a| String::from(&*a.value)),
            _ => None,
        }
    }

    fn classes(&self, node: NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|v| v.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let mut classes = self.classes(node);
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_attribute(node, "class", &classes.join(" "));
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let mut classes = self.classes(node);
        let before = classes.len();
        classes.retain(|c| c != class);
        if classes.len() != before {
            self.set_attribute(node, "class", &classes.join(" "));
        }
    }

    /// Flip `class`; returns whether it is present afterwards.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    /// The element's direct text children, concatenated.
    pub fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.handle(node).children.borrow().iter() {
            if let NodeData::Text { contents } = &child.data {
                out.push_str(&contents.borrow());
            }
        }
        out
    }

    /// Replace every child with a single text node (`textContent = text`).
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let handle = self.handle(node).clone();
            self.dom
                .append(&handle, NodeOrText::AppendText(StrTendril::from_slice(text)));
        }
    }

    /// All descendant text in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        fn walk(handle: &Handle, out: &mut String) {
            for child in handle.children.borrow().iter() {
                match &child.data {
                    NodeData::Text { contents } => out.push_str(&contents.borrow()),
                    NodeData::Element { .. } => walk(child, out),
                    _ => {}
                }
            }
        }
        let mut out = String::new();
        walk(self.handle(node), &mut out);
        out
    }

    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// First match in document order. An unparsable selector matches nothing.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.try_query(selector).ok().flatten()
    }

    pub fn try_query(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = selector::parse_selector(selector)?;
        Ok(element_descendants(&self.dom.document)
            .into_iter()
            .find(|h| selector::matches(&list, &ElementRef::new(h.clone())))
            .and_then(|h| self.lookup(&h)))
    }

    /// All matches strictly below `scope`, in document order.
    pub fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let Ok(list) = selector::parse_selector(selector) else {
            return Vec::new();
        };
        element_descendants(self.handle(scope))
            .into_iter()
            .filter(|h| selector::matches(&list, &ElementRef::new(h.clone())))
            .filter_map(|h| self.lookup(&h))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Stack every element under `body` vertically: leaves are one block tall,
    /// containers are as tall as their element children. Returns the body height.
    pub fn layout(&mut self, block_height: f64) -> f64 {
        self.rects.clear();
        let root = self.root();
        self.layout_node(root, 0.0, block_height)
    }

    fn layout_node(&mut self, node: NodeId, top: f64, block_height: f64) -> f64 {
        let children = self.children(node);
        let height = if children.is_empty() {
            block_height
        } else {
            let mut cursor = top;
            for child in children {
                cursor += self.layout_node(child, cursor, block_height);
            }
            cursor - top
        };
        self.set_rect(node, Rect { top, height });
        height
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// Outer HTML of `node`.
    pub fn to_html(&self, node: NodeId) -> String {
        write_html(self.handle(node), TraversalScope::IncludeNode)
    }

    /// The whole page, doctype included.
    pub fn html(&self) -> String {
        write_html(&self.dom.document, TraversalScope::ChildrenOnly(None))
    }
}

fn element_descendants(scope: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack: Vec<Handle> = scope.children.borrow().iter().rev().cloned().collect();
    while let Some(handle) = stack.pop() {
        if is_element(&handle) {
            stack.extend(handle.children.borrow().iter().rev().cloned());
            out.push(handle);
        }
    }
    out
}

fn write_html(handle: &Handle, traversal_scope: TraversalScope) -> String {
    let mut out = Vec::new();
    let node: SerializableHandle = handle.clone().into();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };
    if serialize(&mut out, &node, opts).is_err() {
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}
