// GitHub-flavoured Markdown rules: pipe tables with raw-HTML fallback,
// task-list checkboxes, highlighted code blocks, strikethrough.

use std::sync::LazyLock;

use markup5ever_rcdom::Handle;
use regex::Regex;
use tracing::debug;

use crate::dom::{
    element_children, get_attr, has_attr, is_tag, next_sibling, parent, previous_element_sibling,
    text_content, text_of,
};
use crate::engine::{fence_code, Context, Filter, Rule, RuleTable};
use crate::table::{is_first_heading_row, TableClassification};

static HIGHLIGHT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"highlight-(?:text|source)-([a-z0-9]+)").expect("valid regex"));

/// Register the GFM rules and the raw-HTML fallback for tables.
pub(super) fn register(rules: RuleTable) -> RuleTable {
    rules
        .add(
            "highlightedCodeBlock",
            Rule::new(Filter::Predicate(is_highlighted_code_block), highlighted_code_block),
        )
        .add(
            "strikethrough",
            Rule::new(Filter::Tags(&["del", "s", "strike"]), strikethrough),
        )
        .add("tableCell", Rule::new(Filter::Tags(&["th", "td"]), table_cell))
        .add("tableRow", Rule::new(Filter::Tag("tr"), table_row))
        .add("table", Rule::new(Filter::Predicate(is_convertible_table), table))
        .add(
            "tableSection",
            Rule::new(Filter::Tags(&["thead", "tbody", "tfoot"]), table_section),
        )
        .add(
            "taskListItems",
            Rule::new(Filter::Predicate(is_task_checkbox), task_checkbox),
        )
        .keep(Filter::Predicate(is_raw_table))
}

fn is_highlighted_code_block(node: &Handle) -> bool {
    let first_is_pre = node
        .children
        .borrow()
        .first()
        .is_some_and(|first| is_tag(first, "pre"));
    is_tag(node, "div")
        && first_is_pre
        && get_attr(node, "class").is_some_and(|class| HIGHLIGHT_CLASS.is_match(&class))
}

fn highlighted_code_block(_: &str, node: &Handle, cx: &mut Context) -> String {
    let language = get_attr(node, "class")
        .and_then(|class| {
            HIGHLIGHT_CLASS
                .captures(&class)
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_default();
    let code = node
        .children
        .borrow()
        .first()
        .map(text_content)
        .unwrap_or_default();
    fence_code(&code, &language, &cx.options.fence)
}

fn strikethrough(content: &str, _: &Handle, _: &mut Context) -> String {
    format!("~~{content}~~")
}

// Tables

/// Table filter. Logs the classification of each table that reaches the
/// output.
fn is_convertible_table(node: &Handle) -> bool {
    if !is_tag(node, "table") {
        return false;
    }
    let classification = TableClassification::classify(node);
    debug!(
        convertible = classification.is_convertible,
        has_heading_row = !classification.heading_rows.is_empty(),
        has_merged_data_cell = classification.has_merged_data_cell,
        rows = classification.row_count,
        cols = classification.column_count,
        "table → {}",
        if classification.is_convertible { "markdown" } else { "raw HTML" }
    );
    classification.is_convertible
}

fn is_raw_table(node: &Handle) -> bool {
    is_tag(node, "table") && !TableClassification::classify(node).is_convertible
}

fn table(content: &str, _: &Handle, _: &mut Context) -> String {
    format!("\n\n{}\n\n", content.replacen("\n\n", "\n", 1))
}

fn table_section(content: &str, _: &Handle, _: &mut Context) -> String {
    content.to_string()
}

/// Only the first heading row is followed by the separator line; later
/// heading rows render as ordinary rows.
fn table_row(content: &str, node: &Handle, _: &mut Context) -> String {
    if !is_first_heading_row(node) {
        return format!("\n{content}");
    }
    let border: String = element_children(node)
        .iter()
        .map(|cell| {
            let marker = match get_attr(cell, "align")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str()
            {
                "left" => ":--",
                "right" => "--:",
                "center" => ":-:",
                _ => "---",
            };
            render_cell(marker, cell)
        })
        .collect();
    format!("\n{content}\n{border}")
}

fn table_cell(content: &str, node: &Handle, _: &mut Context) -> String {
    let flat = content.replace("\\\n", " ").replace('\n', " ");
    render_cell(&escape_pipes(flat.trim()), node)
}

fn render_cell(content: &str, node: &Handle) -> String {
    if previous_element_sibling(node).is_none() {
        format!("| {content} |")
    } else {
        format!(" {content} |")
    }
}

/// Escape every `|` not already preceded by an odd run of backslashes.
fn escape_pipes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut backslashes = 0;
    for c in s.chars() {
        if c == '|' && backslashes % 2 == 0 {
            out.push('\\');
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        out.push(c);
    }
    out
}

// Task lists

fn is_task_checkbox(node: &Handle) -> bool {
    is_tag(node, "input")
        && get_attr(node, "type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
        && parent(node).is_some_and(|p| is_tag(&p, "li"))
}

fn task_checkbox(_: &str, node: &Handle, _: &mut Context) -> String {
    let mark = if has_attr(node, "checked") { "[x]" } else { "[ ]" };
    let followed_by_space = next_sibling(node)
        .and_then(|next| text_of(&next))
        .is_some_and(|text| text.starts_with(char::is_whitespace));
    if followed_by_space {
        mark.to_string()
    } else {
        format!("{mark} ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_pipes() {
        assert_eq!(escape_pipes("a|b"), r"a\|b");
        assert_eq!(escape_pipes(r"a\|b"), r"a\|b");
        assert_eq!(escape_pipes(r"a\\|b"), r"a\\\|b");
    }
}
