// Link and image rules, inline and reference variants.
//
// The engine parses its own detached copy of the selection, so relative
// `href`/`src` values are resolved against the page location carried in the
// run context rather than against the parse.

use markup5ever_rcdom::Handle;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::dom::{get_attr, is_tag};
use crate::engine::{Context, Filter, Rule};

pub(super) fn link_rule(reference: bool) -> Rule {
    let replacement = if reference { reference_link } else { inline_link };
    Rule::new(Filter::Predicate(is_link), replacement)
}

pub(super) fn image_rule(reference: bool) -> Rule {
    let replacement = if reference { reference_image } else { inline_image };
    Rule::new(Filter::Tag("img"), replacement)
}

fn is_link(node: &Handle) -> bool {
    is_tag(node, "a") && get_attr(node, "href").is_some_and(|href| !href.is_empty())
}

fn inline_link(content: &str, node: &Handle, cx: &mut Context) -> String {
    let href = resolve_attr(node, "href", cx);
    format!("[{content}](<{href}>)")
}

fn reference_link(content: &str, node: &Handle, cx: &mut Context) -> String {
    let href = resolve_attr(node, "href", cx);
    let id = cx.add_reference(href);
    format!("[{content}][{id}]")
}

fn inline_image(_: &str, node: &Handle, cx: &mut Context) -> String {
    let src = resolve_attr(node, "src", cx);
    if src.is_empty() {
        return String::new();
    }
    format!("![{}](<{src}>)", alt_text(node))
}

fn reference_image(_: &str, node: &Handle, cx: &mut Context) -> String {
    let src = resolve_attr(node, "src", cx);
    if src.is_empty() {
        return String::new();
    }
    let id = cx.add_reference(src);
    format!("![{}][{id}]", alt_text(node))
}

fn alt_text(node: &Handle) -> String {
    get_attr(node, "alt")
        .unwrap_or_default()
        .replace('[', "\\[")
        .replace(']', "\\]")
}

fn resolve_attr(node: &Handle, name: &str, cx: &Context) -> String {
    let raw = get_attr(node, name).unwrap_or_default();
    resolve_and_decode(&raw, cx.base_url.as_ref())
}

/// Resolve `raw` against `base` and percent-decode the result.
///
/// A value that cannot be resolved is returned as written. A resolved URL
/// that does not decode cleanly (a stray `%`, or bytes that are not UTF-8)
/// is returned still encoded.
pub fn resolve_and_decode(raw: &str, base: Option<&Url>) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let resolved = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    let Ok(resolved) = resolved else {
        return raw.to_string();
    };
    let encoded = resolved.as_str();
    if has_malformed_escape(encoded) {
        return encoded.to_string();
    }
    match percent_decode_str(encoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => encoded.to_string(),
    }
}

fn has_malformed_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.iter().enumerate().any(|(i, b)| {
        *b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}
