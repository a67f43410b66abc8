// Host document model.
//
// A parsed HTML page (html5ever + rcdom) together with the location and title
// a browser would expose as `window.location` and `document.title`. Node
// helpers shared by the engine, the rule set and the table classifier live
// here too.

mod range;

pub use range::{Boundary, DomRange, SelectionRange};

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever::serialize::TraversalScope;
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use url::Url;

/// A parsed host document.
pub struct Page {
    dom: RcDom,
    location: String,
    title: String,
}

impl Page {
    /// Parse `html` as a full document located at `location`.
    ///
    /// The title is taken from the document's `<title>` element.
    pub fn parse(html: &str, location: impl Into<String>) -> Self {
        let dom = parse_html(html);
        let title = find_element(&dom.document, "title")
            .map(|t| collapse_spaces(&text_content(&t)))
            .unwrap_or_default();
        Self {
            dom,
            location: location.into(),
            title,
        }
    }

    /// Override the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The document node.
    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    /// The `<body>` element, if the parser produced one.
    pub fn body(&self) -> Option<Handle> {
        find_element(&self.dom.document, "body")
    }

    /// The page location as given (`window.location.href`).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The location parsed as a base URL for resolving relative links.
    pub fn base_url(&self) -> Option<Url> {
        Url::parse(&self.location).ok()
    }

    /// A range covering the whole body content.
    pub fn select_all(&self) -> Option<DomRange> {
        let body = self.body()?;
        Some(DomRange::select_node_contents(&body))
    }

    /// A range starting at the first occurrence of `from` and ending after
    /// the first occurrence of `to` at or after that point.
    pub fn select_between(&self, from: &str, to: &str) -> Option<DomRange> {
        let body = self.body()?;
        let mut texts = Vec::new();
        collect_text_nodes(&body, &mut texts);

        let (start_index, start_offset) = texts.iter().enumerate().find_map(|(i, node)| {
            text_of(node).and_then(|t| t.find(from)).map(|offset| (i, offset))
        })?;

        let (end_node, end_offset) = texts[start_index..].iter().enumerate().find_map(|(i, node)| {
            let text = text_of(node)?;
            let search_from = if i == 0 { start_offset } else { 0 };
            text[search_from..]
                .find(to)
                .map(|offset| (node.clone(), search_from + offset + to.len()))
        })?;

        DomRange::new(
            Boundary::new(texts[start_index].clone(), start_offset),
            Boundary::new(end_node, end_offset),
        )
        .ok()
    }
}

/// Parse an HTML string into an html5ever RcDom.
pub(crate) fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

// ---------------------------------------------------------------------------
// Node helpers
// ---------------------------------------------------------------------------

/// Get the tag name of an element node.
pub(crate) fn tag_name(handle: &Handle) -> Option<&str> {
    if let NodeData::Element { ref name, .. } = handle.data {
        Some(name.local.as_ref())
    } else {
        None
    }
}

/// Whether `handle` is an element with the given tag name.
pub(crate) fn is_tag(handle: &Handle, tag: &str) -> bool {
    tag_name(handle) == Some(tag)
}

/// Get the value of an attribute on an element node.
pub(crate) fn get_attr(handle: &Handle, name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            if attr.name.local.as_ref() == name {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

pub(crate) fn has_attr(handle: &Handle, name: &str) -> bool {
    get_attr(handle, name).is_some()
}

pub(crate) fn is_text(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Text { .. })
}

/// The text of a text node.
pub(crate) fn text_of(handle: &Handle) -> Option<String> {
    if let NodeData::Text { ref contents } = handle.data {
        Some(contents.borrow().to_string())
    } else {
        None
    }
}

/// The parent of a node, if it is still attached.
pub(crate) fn parent(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    handle.parent.set(weak);
    parent
}

/// Position of `handle` among its parent's children.
pub(crate) fn index_in_parent(handle: &Handle) -> Option<usize> {
    let parent = parent(handle)?;
    let children = parent.children.borrow();
    children.iter().position(|c| Rc::ptr_eq(c, handle))
}

pub(crate) fn previous_sibling(handle: &Handle) -> Option<Handle> {
    let parent = parent(handle)?;
    let children = parent.children.borrow();
    let index = children.iter().position(|c| Rc::ptr_eq(c, handle))?;
    index.checked_sub(1).map(|i| children[i].clone())
}

pub(crate) fn next_sibling(handle: &Handle) -> Option<Handle> {
    let parent = parent(handle)?;
    let children = parent.children.borrow();
    let index = children.iter().position(|c| Rc::ptr_eq(c, handle))?;
    children.get(index + 1).cloned()
}

/// Element children of a node, in order.
pub(crate) fn element_children(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|c| tag_name(c).is_some())
        .cloned()
        .collect()
}

pub(crate) fn previous_element_sibling(handle: &Handle) -> Option<Handle> {
    let mut current = previous_sibling(handle);
    while let Some(node) = current {
        if tag_name(&node).is_some() {
            return Some(node);
        }
        current = previous_sibling(&node);
    }
    None
}

pub(crate) fn next_element_sibling(handle: &Handle) -> Option<Handle> {
    let mut current = next_sibling(handle);
    while let Some(node) = current {
        if tag_name(&node).is_some() {
            return Some(node);
        }
        current = next_sibling(&node);
    }
    None
}

/// Whether `ancestor` is `node` or one of its ancestors.
pub(crate) fn is_inclusive_ancestor(ancestor: &Handle, node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if Rc::ptr_eq(&n, ancestor) {
            return true;
        }
        current = parent(&n);
    }
    false
}

/// Nearest inclusive ancestor with the given tag name.
pub(crate) fn closest(handle: &Handle, tag: &str) -> Option<Handle> {
    let mut current = Some(handle.clone());
    while let Some(n) = current {
        if is_tag(&n, tag) {
            return Some(n);
        }
        current = parent(&n);
    }
    None
}

/// Concatenated text of all descendant text nodes.
pub(crate) fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    push_text(handle, &mut out);
    out
}

fn push_text(handle: &Handle, out: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                push_text(child, out);
            }
        }
    }
}

/// First descendant element (in tree order) with the given tag name.
pub(crate) fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if is_tag(child, tag) {
            return Some(child.clone());
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

/// All descendant elements with the given tag name, in tree order.
pub(crate) fn descendants_by_tag(handle: &Handle, tag: &str) -> Vec<Handle> {
    fn walk(handle: &Handle, tag: &str, out: &mut Vec<Handle>) {
        for child in handle.children.borrow().iter() {
            if is_tag(child, tag) {
                out.push(child.clone());
            }
            walk(child, tag, out);
        }
    }
    let mut out = Vec::new();
    walk(handle, tag, &mut out);
    out
}

fn collect_text_nodes(handle: &Handle, out: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if is_text(child) {
            out.push(child.clone());
        } else {
            collect_text_nodes(child, out);
        }
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Detached copies
// ---------------------------------------------------------------------------

/// A detached container for cloned content (serialised children-only).
pub(crate) fn new_fragment() -> Handle {
    Node::new(NodeData::Document)
}

pub(crate) fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// Copy a node without its children. Returns `None` for node kinds that
/// never appear inside a selection (documents, doctypes).
pub(crate) fn shallow_clone(handle: &Handle) -> Option<Handle> {
    let data = match handle.data {
        NodeData::Element {
            ref name,
            ref attrs,
            mathml_annotation_xml_integration_point,
            ..
        } => NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point,
        },
        NodeData::Text { ref contents } => NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        },
        NodeData::Comment { ref contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        NodeData::ProcessingInstruction {
            ref target,
            ref contents,
        } => NodeData::ProcessingInstruction {
            target: target.clone(),
            contents: contents.clone(),
        },
        NodeData::Document | NodeData::Doctype { .. } => return None,
    };
    Some(Node::new(data))
}

pub(crate) fn deep_clone(handle: &Handle) -> Option<Handle> {
    let copy = shallow_clone(handle)?;
    for child in handle.children.borrow().iter() {
        if let Some(child_copy) = deep_clone(child) {
            append_child(&copy, child_copy);
        }
    }
    Some(copy)
}

pub(crate) fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

/// Serialise a node including its own tags (`outerHTML`).
pub(crate) fn outer_html(handle: &Handle) -> String {
    serialize_with(handle, TraversalScope::IncludeNode)
}

/// Serialise a node's children (`innerHTML`).
pub(crate) fn inner_html(handle: &Handle) -> String {
    serialize_with(handle, TraversalScope::ChildrenOnly(None))
}

fn serialize_with(handle: &Handle, traversal_scope: TraversalScope) -> String {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };
    let serializable = SerializableHandle::from(handle.clone());
    if serialize(&mut buf, &serializable, opts).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
