// Element classification shared by the engine passes.

use markup5ever_rcdom::Handle;

use crate::dom::{closest, next_sibling, previous_sibling, tag_name, text_content, text_of};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas", "center", "dd",
    "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "html", "isindex", "li",
    "main", "menu", "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

const MEANINGFUL_WHEN_BLANK: &[&str] = &[
    "a", "table", "thead", "tbody", "tfoot", "th", "td", "iframe", "script", "audio", "video",
];

fn is_one_of(node: &Handle, set: &[&str]) -> bool {
    tag_name(node).is_some_and(|tag| set.contains(&tag))
}

pub(crate) fn is_block(node: &Handle) -> bool {
    is_one_of(node, BLOCK_ELEMENTS)
}

pub(crate) fn is_void(node: &Handle) -> bool {
    is_one_of(node, VOID_ELEMENTS)
}

pub(crate) fn is_pre(node: &Handle) -> bool {
    is_one_of(node, &["pre"])
}

fn is_meaningful_when_blank(node: &Handle) -> bool {
    is_one_of(node, MEANINGFUL_WHEN_BLANK)
}

fn has_descendant(node: &Handle, pred: fn(&Handle) -> bool) -> bool {
    node.children
        .borrow()
        .iter()
        .any(|child| pred(child) || has_descendant(child, pred))
}

/// An element with no visible content and nothing that renders without
/// content (images, links, table structure).
pub(crate) fn is_blank(node: &Handle) -> bool {
    !is_void(node)
        && !is_meaningful_when_blank(node)
        && text_content(node).trim().is_empty()
        && !has_descendant(node, is_void)
        && !has_descendant(node, is_meaningful_when_blank)
}

/// Whether text under `node` is code and must not be escaped.
pub(crate) fn is_code(node: &Handle) -> bool {
    closest(node, "code").is_some()
}

/// Whitespace to re-emit around an inline element whose content is trimmed.
pub(crate) struct FlankingWhitespace {
    pub leading: String,
    pub trailing: String,
}

impl FlankingWhitespace {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

fn is_ascii_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Leading/trailing whitespace of an inline element's text, minus the ASCII
/// part already supplied by a neighbour.
pub(crate) fn flanking_whitespace(node: &Handle) -> FlankingWhitespace {
    if is_block(node) {
        return FlankingWhitespace {
            leading: String::new(),
            trailing: String::new(),
        };
    }

    let text = text_content(node);
    let leading_len = text.len() - text.trim_start().len();
    let mut leading = text[..leading_len].to_string();
    let mut trailing = if leading_len == text.len() {
        String::new()
    } else {
        text[text.trim_end().len()..].to_string()
    };

    let leading_ascii = leading.chars().take_while(|c| is_ascii_ws(*c)).count();
    if leading_ascii > 0 && is_flanked_by_whitespace(node, Side::Left) {
        leading = leading.chars().skip(leading_ascii).collect();
    }
    let trailing_ascii = trailing.chars().rev().take_while(|c| is_ascii_ws(*c)).count();
    if trailing_ascii > 0 && is_flanked_by_whitespace(node, Side::Right) {
        let keep = trailing.chars().count() - trailing_ascii;
        trailing = trailing.chars().take(keep).collect();
    }

    FlankingWhitespace { leading, trailing }
}

enum Side {
    Left,
    Right,
}

fn is_flanked_by_whitespace(node: &Handle, side: Side) -> bool {
    let sibling = match side {
        Side::Left => previous_sibling(node),
        Side::Right => next_sibling(node),
    };
    let Some(sibling) = sibling else {
        return false;
    };
    let text = match text_of(&sibling) {
        Some(text) => text,
        None if tag_name(&sibling).is_some() && !is_block(&sibling) => text_content(&sibling),
        None => return false,
    };
    match side {
        Side::Left => text.ends_with(' '),
        Side::Right => text.starts_with(' '),
    }
}
