// The conversion rule set layered over the base CommonMark rules.
//
// Overrides keep the output lint-clean: one space after list markers,
// trailing `<br>` dropped instead of leaving a bare backslash, `*` emphasis
// inside words. Links and images resolve against the page location and come
// in inline or reference flavour.

mod gfm;
mod links;

use markup5ever_rcdom::Handle;

use crate::dom::{next_element_sibling, next_sibling, previous_sibling, text_of};
use crate::engine::{
    commonmark_rules, markdown_escape, ordinal, Context, Filter, Rule, RuleTable, Rules,
};
use crate::LinkStyle;

pub use links::resolve_and_decode;

/// The composed rule table for one conversion.
pub fn rule_set(link_style: LinkStyle) -> Rules {
    let reference = link_style == LinkStyle::Reference;
    let overrides = gfm::register(RuleTable::new())
        .add("lineBreak", Rule::new(Filter::Tag("br"), line_break))
        .add("listItem", Rule::new(Filter::Tag("li"), list_item))
        .add("emphasis", Rule::new(Filter::Tags(&["em", "i"]), emphasis))
        .add("link", links::link_rule(reference))
        .add("image", links::image_rule(reference));
    Rules::compose(commonmark_rules(), overrides)
}

/// Base escaping plus `{` and `}`.
pub fn escape(text: &str) -> String {
    markdown_escape(text).replace('{', "\\{").replace('}', "\\}")
}

fn line_break(_: &str, node: &Handle, cx: &mut Context) -> String {
    let mut next = next_sibling(node);
    while let Some(sibling) = next {
        let skip = text_of(&sibling).is_some_and(|text| text.trim().is_empty());
        if !skip {
            return format!("{}\n", cx.options.br);
        }
        next = next_sibling(&sibling);
    }
    String::new()
}

fn list_item(content: &str, node: &Handle, cx: &mut Context) -> String {
    let prefix = match ordinal(node) {
        Some(n) => format!("{n}. "),
        None => format!("{} ", cx.options.bullet),
    };
    let is_paragraph = content.ends_with('\n');
    let mut body = content.trim_matches('\n').to_string();
    if is_paragraph {
        body.push('\n');
    }

    let indent = " ".repeat(prefix.len());
    let body = body
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i > 0 && !line.is_empty() {
                format!("{indent}{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let newline = if next_element_sibling(node).is_some() { "\n" } else { "" };
    format!("{prefix}{body}{newline}")
}

fn emphasis(content: &str, node: &Handle, _: &mut Context) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let before = previous_sibling(node)
        .and_then(|prev| text_of(&prev))
        .is_some_and(|text| text.ends_with(is_word));
    let after = next_sibling(node)
        .and_then(|next| text_of(&next))
        .is_some_and(|text| text.starts_with(is_word));
    let delimiter = if before || after { "*" } else { "_" };
    format!("{delimiter}{content}{delimiter}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn convert(html: &str, link_style: LinkStyle, base: Option<&str>) -> (String, Context) {
        let base = base.map(|b| url::Url::parse(b).unwrap());
        let mut cx = Context::new(base);
        let engine = Engine::new(rule_set(link_style)).with_escape(escape);
        let markdown = engine.convert(html, &mut cx);
        (markdown, cx)
    }

    fn inline(html: &str) -> String {
        convert(html, LinkStyle::Inline, Some("https://example.com/docs/page")).0
    }

    #[test]
    fn test_overrides_shadow_base_rules() {
        let names = rule_set(LinkStyle::Inline).names();
        assert_eq!(names.iter().filter(|n| **n == "listItem").count(), 1);
        assert!(names.contains(&"table"));
        assert!(names.contains(&"paragraph"));
    }

    #[test]
    fn test_inline_links_and_images_resolve() {
        assert_eq!(
            inline("<p><a href=\"/x y\">go</a> <img src=\"img.png\" alt=\"[A]\"></p>"),
            "[go](<https://example.com/x y>) ![\\[A\\]](<https://example.com/docs/img.png>)"
        );
    }

    #[test]
    fn test_anchor_without_href_is_text() {
        assert_eq!(inline("<p><a name=\"x\">plain</a></p>"), "plain");
    }

    #[test]
    fn test_image_without_src_dropped() {
        assert_eq!(inline("<p>a<img alt=\"x\">b</p>"), "ab");
    }

    #[test]
    fn test_reference_links_numbered() {
        let (markdown, cx) = convert(
            "<p><a href=\"/a\">A</a> and <img src=\"/b.png\" alt=\"B\"></p>",
            LinkStyle::Reference,
            Some("https://e.co/"),
        );
        assert_eq!(markdown, "[A][1] and ![B][2]");
        let defs: Vec<String> = cx.references.iter().map(ToString::to_string).collect();
        assert_eq!(defs, vec!["[1]: <https://e.co/a>", "[2]: <https://e.co/b.png>"]);
    }

    #[test]
    fn test_emphasis_delimiter_in_words() {
        assert_eq!(inline("<p>foo<em>bar</em>baz</p>"), "foo*bar*baz");
        assert_eq!(inline("<p>a <i>b</i> c</p>"), "a _b_ c");
        assert_eq!(inline("<p>a<em> </em>b</p>"), "a b");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(inline("<p>a<br>b</p>"), "a\\\nb");
        assert_eq!(inline("<p>a<br></p>"), "a");
        assert_eq!(inline("<p>a<br> </p>"), "a");
    }

    #[test]
    fn test_list_items_single_space() {
        assert_eq!(inline("<ul><li>a</li><li>b</li></ul>"), "- a\n- b");
        assert_eq!(inline("<ol start=\"9\"><li>a</li><li>b</li></ol>"), "9. a\n10. b");
        assert_eq!(inline("<ol start=\"x\"><li>a</li></ol>"), "1. a");
    }

    #[test]
    fn test_nested_and_paragraph_list_items() {
        assert_eq!(
            inline("<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"),
            "- a\n  - b\n- c"
        );
        assert_eq!(
            inline("<ol><li><p>one</p><p>more</p></li><li><p>two</p></li></ol>"),
            "1. one\n\n   more\n\n2. two"
        );
    }

    #[test]
    fn test_braces_escaped() {
        assert_eq!(inline("<p>{a}</p>"), "\\{a\\}");
        assert_eq!(inline("<p><code>{a}</code></p>"), "`{a}`");
    }

    #[test]
    fn test_convertible_table() {
        assert_eq!(
            inline(
                "<table><tr><th align=\"right\">A</th><th>B</th></tr>\
                 <tr><td>1</td><td>2</td></tr></table>"
            ),
            "| A | B |\n| --: | --- |\n| 1 | 2 |"
        );
    }

    #[test]
    fn test_table_cells_flatten_breaks_and_escape_pipes() {
        assert_eq!(
            inline("<table><tr><th>A</th></tr><tr><td>x<br>y|z</td></tr></table>"),
            "| A |\n| --- |\n| x y\\|z |"
        );
    }

    #[test]
    fn test_table_without_heading_kept_as_html() {
        let html = "<table><tbody><tr><td>1</td></tr></tbody></table>";
        assert_eq!(inline(html), html);
    }

    #[test]
    fn test_table_with_merged_cell_kept_as_html() {
        let html = "<table><tbody><tr><th>A</th><th>B</th></tr>\
                    <tr><td colspan=\"2\">1</td></tr></tbody></table>";
        assert_eq!(inline(html), html);
    }

    #[test]
    fn test_task_list_items() {
        assert_eq!(
            inline(
                "<ul><li><input type=\"checkbox\" checked> done</li>\
                 <li><input type=\"checkbox\">todo</li></ul>"
            ),
            "- [x] done\n- [ ] todo"
        );
    }

    #[test]
    fn test_highlighted_code_block() {
        assert_eq!(
            inline("<div class=\"highlight highlight-source-js\"><pre>let a = 1;</pre></div>"),
            "```js\nlet a = 1;\n```"
        );
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(inline("<p><del>gone</del> <s>old</s></p>"), "~~gone~~ ~~old~~");
    }
}
