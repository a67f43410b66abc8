// Base CommonMark rules.
//
// The engine's built-in rule table: ATX headings, fenced code, `-` bullets,
// backslash hard breaks. Rule sets built on top of the engine override these
// by name.

use std::sync::LazyLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use super::rule::{Filter, Rule, RuleTable};
use super::Context;
use crate::dom::{
    element_children, get_attr, index_in_parent, is_tag, next_sibling, parent, tag_name,
    text_content,
};

static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"language-(\S+)").expect("valid regex"));

/// The base rule table.
pub fn commonmark_rules() -> RuleTable {
    RuleTable::new()
        .add("paragraph", Rule::new(Filter::Tag("p"), paragraph))
        .add("lineBreak", Rule::new(Filter::Tag("br"), line_break))
        .add(
            "heading",
            Rule::new(Filter::Tags(&["h1", "h2", "h3", "h4", "h5", "h6"]), heading),
        )
        .add("blockquote", Rule::new(Filter::Tag("blockquote"), blockquote))
        .add("list", Rule::new(Filter::Tags(&["ul", "ol"]), list))
        .add("listItem", Rule::new(Filter::Tag("li"), list_item))
        .add(
            "fencedCodeBlock",
            Rule::new(Filter::Predicate(is_code_block), fenced_code_block),
        )
        .add("horizontalRule", Rule::new(Filter::Tag("hr"), horizontal_rule))
        .add("link", Rule::new(Filter::Predicate(is_link), inline_link))
        .add("emphasis", Rule::new(Filter::Tags(&["em", "i"]), emphasis))
        .add("strong", Rule::new(Filter::Tags(&["strong", "b"]), strong))
        .add("code", Rule::new(Filter::Predicate(is_inline_code), code))
        .add("image", Rule::new(Filter::Tag("img"), image))
        .remove(Filter::Tags(&[
            "script", "style", "noscript", "template", "head", "caption", "colgroup",
        ]))
}

fn paragraph(content: &str, _: &Handle, _: &mut Context) -> String {
    format!("\n\n{content}\n\n")
}

fn line_break(_: &str, _: &Handle, cx: &mut Context) -> String {
    format!("{}\n", cx.options.br)
}

fn heading(content: &str, node: &Handle, _: &mut Context) -> String {
    let level = tag_name(node)
        .and_then(|t| t.strip_prefix('h'))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(1);
    // ATX headings cannot span lines.
    let content = content.replace("\\\n", " ").replace('\n', " ");
    format!("\n\n{} {}\n\n", "#".repeat(level), content)
}

fn blockquote(content: &str, _: &Handle, _: &mut Context) -> String {
    let quoted = content
        .trim_matches('\n')
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{quoted}\n\n")
}

fn list(content: &str, node: &Handle, _: &mut Context) -> String {
    let nested_last = parent(node).is_some_and(|p| {
        is_tag(&p, "li")
            && element_children(&p)
                .last()
                .is_some_and(|last| std::rc::Rc::ptr_eq(last, node))
    });
    if nested_last {
        format!("\n{content}")
    } else {
        format!("\n\n{content}\n\n")
    }
}

/// Ordered-list number for an item: `start` (default 1) plus its position
/// among the list's element children, saturating at `i64::MAX`.
pub(crate) fn ordinal(node: &Handle) -> Option<i64> {
    let list = parent(node).filter(|p| is_tag(p, "ol"))?;
    let index = element_children(&list)
        .iter()
        .position(|c| std::rc::Rc::ptr_eq(c, node))
        .unwrap_or(0) as i64;
    let start = get_attr(&list, "start").and_then(|s| s.trim().parse::<i64>().ok());
    Some(start.map_or(index + 1, |s| s.saturating_add(index)))
}

fn list_item(content: &str, node: &Handle, cx: &mut Context) -> String {
    let prefix = match ordinal(node) {
        Some(n) => format!("{n}.  "),
        None => format!("{}   ", cx.options.bullet),
    };
    let mut content = content.trim_start_matches('\n').to_string();
    if content.ends_with('\n') {
        content = format!("{}\n", content.trim_end_matches('\n'));
    }
    let content = content.replace('\n', "\n    ");
    let newline = if next_sibling(node).is_some() && !content.ends_with('\n') {
        "\n"
    } else {
        ""
    };
    format!("{prefix}{content}{newline}")
}

fn is_code_block(node: &Handle) -> bool {
    is_tag(node, "pre")
}

fn fenced_code_block(_: &str, node: &Handle, cx: &mut Context) -> String {
    let first = node.children.borrow().first().cloned();
    let code_element = first.filter(|c| is_tag(c, "code"));
    let language = code_element
        .as_ref()
        .and_then(|c| get_attr(c, "class"))
        .and_then(|class| {
            LANGUAGE_CLASS
                .captures(&class)
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_default();
    let code = text_content(code_element.as_ref().unwrap_or(node));
    fence_code(&code, &language, &cx.options.fence)
}

/// Wrap `code` in a fence long enough not to be closed by its content.
pub(crate) fn fence_code(code: &str, language: &str, fence: &str) -> String {
    let fence_char = fence.chars().next().unwrap_or('`');
    let longest_run = code
        .lines()
        .map(|line| line.chars().take_while(|c| *c == fence_char).count())
        .filter(|run| *run >= 3)
        .max()
        .unwrap_or(0);
    let size = (longest_run + 1).max(fence.chars().count()).max(3);
    let fence: String = std::iter::repeat(fence_char).take(size).collect();
    let code = code.strip_suffix('\n').unwrap_or(code);
    format!("\n\n{fence}{language}\n{code}\n{fence}\n\n")
}

fn horizontal_rule(_: &str, _: &Handle, cx: &mut Context) -> String {
    format!("\n\n{}\n\n", cx.options.rule)
}

fn is_link(node: &Handle) -> bool {
    is_tag(node, "a") && get_attr(node, "href").is_some_and(|h| !h.is_empty())
}

fn inline_link(content: &str, node: &Handle, _: &mut Context) -> String {
    let href = get_attr(node, "href")
        .unwrap_or_default()
        .replace('(', "\\(")
        .replace(')', "\\)");
    match get_attr(node, "title") {
        Some(title) => format!("[{content}]({href} \"{}\")", title.replace('"', "\\\"")),
        None => format!("[{content}]({href})"),
    }
}

fn emphasis(content: &str, _: &Handle, cx: &mut Context) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    format!("{0}{1}{0}", cx.options.em, content)
}

fn strong(content: &str, _: &Handle, cx: &mut Context) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    format!("{0}{1}{0}", cx.options.strong, content)
}

fn is_inline_code(node: &Handle) -> bool {
    if !is_tag(node, "code") {
        return false;
    }
    let only_child_of_pre = parent(node).is_some_and(|p| is_tag(&p, "pre"))
        && index_in_parent(node) == Some(0)
        && next_sibling(node).is_none();
    !only_child_of_pre
}

fn code(content: &str, _: &Handle, _: &mut Context) -> String {
    if content.is_empty() {
        return String::new();
    }
    let content = content.replace("\r\n", " ").replace(['\r', '\n'], " ");
    let padded = content.starts_with('`')
        || content.ends_with('`')
        || (content.starts_with(' ') && content.ends_with(' ') && !content.trim().is_empty());
    let extra = if padded { " " } else { "" };
    let runs = backtick_runs(&content);
    let mut delimiter = "`".to_string();
    while runs.contains(&delimiter.len()) {
        delimiter.push('`');
    }
    format!("{delimiter}{extra}{content}{extra}{delimiter}")
}

fn backtick_runs(s: &str) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0;
    for c in s.chars() {
        if c == '`' {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

fn image(_: &str, node: &Handle, _: &mut Context) -> String {
    let src = get_attr(node, "src").unwrap_or_default();
    if src.is_empty() {
        return String::new();
    }
    let alt = get_attr(node, "alt").unwrap_or_default();
    match get_attr(node, "title") {
        Some(title) => format!("![{alt}]({src} \"{title}\")"),
        None => format!("![{alt}]({src})"),
    }
}
