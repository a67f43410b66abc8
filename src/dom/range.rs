// Selection ranges over an rcdom tree.
//
// Mirrors the subset of the DOM `Range` interface the extractor needs:
// boundary-point comparison, `intersectsNode`, and `cloneContents`.

use std::cmp::Ordering;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use super::{
    append_child, closest, deep_clone, index_in_parent, is_inclusive_ancestor, new_fragment,
    new_text, parent, shallow_clone, text_of,
};
use crate::error::SuperCopyError;

/// What the extractor needs from a user selection.
pub trait SelectionRange {
    /// Whether the range is zero-width.
    fn is_collapsed(&self) -> bool;

    /// Copy the selected content into a detached fragment.
    fn clone_contents(&self) -> Handle;

    /// Whether any part of `node` lies inside the range.
    fn intersects_node(&self, node: &Handle) -> bool;

    /// The `<table>` containing both endpoints, if they share one.
    fn common_table_ancestor(&self) -> Option<Handle>;
}

/// A position inside the tree: a child index for elements, a byte offset for
/// text nodes.
#[derive(Clone)]
pub struct Boundary {
    pub node: Handle,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: Handle, offset: usize) -> Self {
        Self { node, offset }
    }

    fn len_of_node(&self) -> usize {
        match text_of(&self.node) {
            Some(text) => text.len(),
            None => self.node.children.borrow().len(),
        }
    }

    fn validate(&self) -> Result<(), SuperCopyError> {
        let len = self.len_of_node();
        let on_char_boundary = text_of(&self.node).map_or(true, |t| t.is_char_boundary(self.offset.min(t.len())));
        if self.offset > len || !on_char_boundary {
            return Err(SuperCopyError::InvalidBoundary {
                offset: self.offset,
                len,
            });
        }
        Ok(())
    }

    /// Tree path of the boundary point: child indices from the root, then the
    /// offset. Lexicographic order on paths is document order on points.
    fn path(&self) -> Vec<usize> {
        let mut path = tree_path(&self.node);
        path.push(self.offset);
        path
    }

    fn same_point(&self, other: &Boundary) -> bool {
        Rc::ptr_eq(&self.node, &other.node) && self.offset == other.offset
    }
}

/// A contiguous selection between two boundary points.
#[derive(Clone)]
pub struct DomRange {
    start: Boundary,
    end: Boundary,
}

impl DomRange {
    /// Build a range; endpoints given in reverse document order are swapped.
    pub fn new(start: Boundary, end: Boundary) -> Result<Self, SuperCopyError> {
        start.validate()?;
        end.validate()?;
        if start.path().cmp(&end.path()) == Ordering::Greater {
            Ok(Self { start: end, end: start })
        } else {
            Ok(Self { start, end })
        }
    }

    /// A range spanning all children of `node`.
    pub fn select_node_contents(node: &Handle) -> Self {
        let len = match text_of(node) {
            Some(text) => text.len(),
            None => node.children.borrow().len(),
        };
        Self {
            start: Boundary::new(node.clone(), 0),
            end: Boundary::new(node.clone(), len),
        }
    }

    pub fn start(&self) -> &Boundary {
        &self.start
    }

    pub fn end(&self) -> &Boundary {
        &self.end
    }

    fn common_ancestor(&self) -> Option<Handle> {
        let mut current = Some(self.start.node.clone());
        while let Some(node) = current {
            if is_inclusive_ancestor(&node, &self.end.node) {
                return Some(node);
            }
            current = parent(&node);
        }
        None
    }

    fn clone_children(&self, source: &Handle, dest: &Handle) {
        let base = tree_path(source);
        let start_path = self.start.path();
        let end_path = self.end.path();

        for (i, child) in source.children.borrow().iter().enumerate() {
            let mut before = base.clone();
            before.push(i);
            let mut after = base.clone();
            after.push(i + 1);

            let fully_contained = start_path <= before && after <= end_path;
            if fully_contained {
                if let Some(copy) = deep_clone(child) {
                    append_child(dest, copy);
                }
                continue;
            }

            let holds_start = is_inclusive_ancestor(child, &self.start.node);
            let holds_end = is_inclusive_ancestor(child, &self.end.node);
            if !holds_start && !holds_end {
                continue;
            }

            if let Some(text) = text_of(child) {
                let from = if holds_start { self.start.offset } else { 0 };
                let to = if holds_end { self.end.offset } else { text.len() };
                if from < to {
                    append_child(dest, new_text(&text[from..to]));
                }
            } else if let Some(copy) = shallow_clone(child) {
                self.clone_children(child, &copy);
                append_child(dest, copy);
            }
        }
    }
}

impl SelectionRange for DomRange {
    fn is_collapsed(&self) -> bool {
        self.start.same_point(&self.end)
    }

    fn clone_contents(&self) -> Handle {
        let fragment = new_fragment();
        if self.is_collapsed() {
            return fragment;
        }
        let Some(ancestor) = self.common_ancestor() else {
            return fragment;
        };

        if let Some(text) = text_of(&ancestor) {
            // Both endpoints inside one text node.
            let slice = &text[self.start.offset..self.end.offset];
            append_child(&fragment, new_text(slice));
        } else {
            self.clone_children(&ancestor, &fragment);
        }
        fragment
    }

    fn intersects_node(&self, node: &Handle) -> bool {
        let Some(parent) = parent(node) else {
            return true;
        };
        let Some(index) = index_in_parent(node) else {
            return false;
        };
        let mut before = tree_path(&parent);
        let mut after = before.clone();
        before.push(index);
        after.push(index + 1);

        before < self.end.path() && self.start.path() < after
    }

    fn common_table_ancestor(&self) -> Option<Handle> {
        let start_table = table_ancestor(&self.start.node)?;
        let end_table = table_ancestor(&self.end.node)?;
        Rc::ptr_eq(&start_table, &end_table).then_some(start_table)
    }
}

fn table_ancestor(node: &Handle) -> Option<Handle> {
    let element = match node.data {
        NodeData::Text { .. } => parent(node)?,
        _ => node.clone(),
    };
    closest(&element, "table")
}

/// Child indices from the root down to `node`.
fn tree_path(node: &Handle) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while let Some(index) = index_in_parent(&current) {
        path.push(index);
        match parent(&current) {
            Some(p) => current = p,
            None => break,
        }
    }
    path.reverse();
    path
}
