// Whitespace collapsing for the detached conversion tree.
//
// Runs once before conversion. Mirrors how a browser renders inline
// whitespace: runs of ASCII whitespace become a single space, a space that
// follows another space or a block boundary is dropped, and a space right
// before a block boundary or `<br>` is dropped. `<pre>` subtrees are left
// untouched. Emptied text nodes and comments are removed afterwards so that
// sibling lookups in the rules see only meaningful neighbours.

use std::sync::LazyLock;

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;

use super::util::{is_block, is_pre, is_void};
use crate::dom::{is_tag, text_of};

static WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \r\n\t]+").expect("valid regex"));

/// Collapse whitespace under `root` in place.
pub(crate) fn collapse_whitespace(root: &Handle) {
    let mut state = Collapse {
        prev_text: None,
        keep_leading_ws: false,
    };
    state.walk(root);
    if let Some(prev) = state.prev_text.take() {
        trim_trailing_space(&prev);
    }
    remove_empty_nodes(root);
}

struct Collapse {
    /// Last non-empty text node seen in document order.
    prev_text: Option<Handle>,
    /// Set after void and preformatted elements, whose rendered output does
    /// not end in whitespace.
    keep_leading_ws: bool,
}

impl Collapse {
    fn walk(&mut self, node: &Handle) {
        let children: Vec<Handle> = node.children.borrow().clone();
        for child in &children {
            match child.data {
                NodeData::Text { ref contents } => {
                    let collapsed = WS_RUN.replace_all(&contents.borrow(), " ").into_owned();
                    let after_space = self
                        .prev_text
                        .as_ref()
                        .map_or(true, |prev| text_of(prev).is_some_and(|t| t.ends_with(' ')));
                    let text = match collapsed.strip_prefix(' ') {
                        Some(rest) if after_space && !self.keep_leading_ws => rest.to_string(),
                        _ => collapsed,
                    };
                    *contents.borrow_mut() = StrTendril::from_slice(&text);
                    if !text.is_empty() {
                        self.prev_text = Some(child.clone());
                    }
                }
                NodeData::Element { .. } => {
                    self.visit_element(child);
                    if !is_pre(child) && !child.children.borrow().is_empty() {
                        self.walk(child);
                        self.visit_element(child);
                    }
                }
                _ => {}
            }
        }
    }

    /// Called on entering an element and again on leaving it.
    fn visit_element(&mut self, element: &Handle) {
        if is_block(element) || is_tag(element, "br") {
            if let Some(prev) = self.prev_text.take() {
                trim_trailing_space(&prev);
            }
            self.keep_leading_ws = false;
        } else if is_void(element) || is_pre(element) {
            self.prev_text = None;
            self.keep_leading_ws = true;
        } else if self.prev_text.is_some() {
            self.keep_leading_ws = false;
        }
    }
}

fn trim_trailing_space(node: &Handle) {
    if let NodeData::Text { ref contents } = node.data {
        let text = contents.borrow().to_string();
        if let Some(trimmed) = text.strip_suffix(' ') {
            *contents.borrow_mut() = StrTendril::from_slice(trimmed);
        }
    }
}

fn remove_empty_nodes(node: &Handle) {
    node.children.borrow_mut().retain(|child| match child.data {
        NodeData::Text { ref contents } => !contents.borrow().is_empty(),
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => false,
        _ => true,
    });
    let children: Vec<Handle> = node.children.borrow().clone();
    for child in &children {
        remove_empty_nodes(child);
    }
}
