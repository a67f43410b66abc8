// End-to-end API tests for super-copy.

use pretty_assertions::assert_eq;
use pulldown_cmark::{Event, LinkType, Parser, Tag};
use super_copy::{
    align_tables, assemble, convert_html, copy_selection, extract_html, Boundary, Citation,
    ConversionOptions, DomRange, LinkStyle, Page, SelectionRange, Settings,
};

fn page(html: &str) -> Page {
    Page::parse(html, "https://example.com/articles/one").with_title("Article")
}

#[test]
fn test_empty_input() {
    let conversion = convert_html("", &ConversionOptions::new(), None);
    assert_eq!(conversion.markdown, "");
}

#[test]
fn test_collapsed_selection_is_noop() {
    let page = page("<p>text</p>");
    let body = page.body().unwrap();
    let range = DomRange::new(Boundary::new(body.clone(), 1), Boundary::new(body, 1)).unwrap();
    assert!(range.is_collapsed());
    assert!(copy_selection(&range, &page, &Settings::new()).is_none());
}

#[test]
fn test_whitespace_selection_is_noop() {
    let page = page("<p>a</p>\n\n<p>b</p>");
    let body = page.body().unwrap();
    // The whitespace text node between the paragraphs.
    let range = DomRange::new(Boundary::new(body.clone(), 1), Boundary::new(body, 2)).unwrap();
    assert!(extract_html(&range).is_none());
}

#[test]
fn test_out_of_bounds_boundary_rejected() {
    let page = page("<p>text</p>");
    let body = page.body().unwrap();
    assert!(DomRange::new(Boundary::new(body.clone(), 0), Boundary::new(body, 9)).is_err());
}

#[test]
fn test_backwards_selection_matches_forwards() {
    let page = page("<p>alpha <em>beta</em> gamma</p>");
    let forwards = page.select_between("alpha", "gamma").unwrap();
    let backwards = DomRange::new(forwards.end().clone(), forwards.start().clone()).unwrap();
    let settings = Settings::new();
    assert_eq!(
        copy_selection(&backwards, &page, &settings),
        copy_selection(&forwards, &page, &settings)
    );
}

#[test]
fn test_reference_definitions_resolve() {
    let page = page(
        "<p><a href=\"/a\">one</a>, <a href=\"b\">two</a> and \
         <img src=\"//cdn.example.com/c.png\" alt=\"three\"></p>",
    );
    let range = page.select_all().unwrap();
    let settings = Settings::new().with_link_style(LinkStyle::Reference);
    let text = copy_selection(&range, &page, &settings).unwrap();

    let targets: Vec<String> = Parser::new(&text)
        .filter_map(|event| match event {
            Event::Start(Tag::Link {
                link_type: LinkType::Reference,
                dest_url,
                ..
            })
            | Event::Start(Tag::Image {
                link_type: LinkType::Reference,
                dest_url,
                ..
            }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        targets,
        vec![
            "https://example.com/a",
            "https://example.com/articles/b",
            "https://cdn.example.com/c.png",
        ]
    );
    assert!(text.ends_with(
        "\n\n[1]: <https://example.com/a>\n[2]: <https://example.com/articles/b>\n\
         [3]: <https://cdn.example.com/c.png>"
    ));
}

#[test]
fn test_reference_ids_follow_first_use() {
    let conversion = convert_html(
        "<p><a href=\"https://x.org/1\">a</a><a href=\"https://x.org/1\">b</a></p>",
        &ConversionOptions::new().with_link_style(LinkStyle::Reference),
        None,
    );
    assert_eq!(conversion.markdown, "[a][1][b][2]");
    let ids: Vec<usize> = conversion.references.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_inline_output_has_no_definitions() {
    let conversion = convert_html(
        "<p><a href=\"https://x.org/\">x</a></p>",
        &ConversionOptions::new(),
        None,
    );
    assert_eq!(conversion.markdown, "[x](<https://x.org/>)");
    assert!(conversion.references.is_empty());
}

#[test]
fn test_convertible_table_has_one_separator_after_first_row() {
    let conversion = convert_html(
        "<table><tr><th>Key</th><th>Value</th></tr>\
         <tr><td>a</td><td>1</td></tr><tr><td>b</td><td>2</td><td>extra</td></tr></table>",
        &ConversionOptions::new(),
        None,
    );
    let lines: Vec<&str> = conversion.markdown.lines().collect();
    let separators: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim_matches(['|', ' ', '-', ':']).is_empty())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(separators, vec![1]);
    for line in &lines {
        assert_eq!(line.matches('|').count(), 4, "line: {line:?}");
    }
    assert_eq!(align_tables(&conversion.markdown), conversion.markdown);
}

#[test]
fn test_merged_table_kept_verbatim() {
    let table = "<table><tbody><tr><th>A</th><th>B</th></tr>\
                 <tr><td rowspan=\"2\">x</td><td>y</td></tr><tr><td>z</td></tr></tbody></table>";
    let conversion = convert_html(table, &ConversionOptions::new(), None);
    assert_eq!(conversion.markdown, table);
    assert!(!conversion.markdown.contains("| ---"));
}

#[test]
fn test_headingless_table_kept_verbatim() {
    let table = "<table><tbody><tr><td>1</td><td>2</td></tr></tbody></table>";
    let conversion = convert_html(table, &ConversionOptions::new(), None);
    assert_eq!(conversion.markdown, table);
}

#[test]
fn test_table_selection_end_to_end() {
    let page = Page::parse(
        "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>22</td></tr></table>",
        "https://e.co/",
    )
    .with_title("Test");
    let range = page.select_between("1", "22").unwrap();
    assert_eq!(
        copy_selection(&range, &page, &Settings::new()).unwrap(),
        "> | A   | B   |\n> | --- | --- |\n> | 1   | 22  |\n>\n> \\~ [Test](<https://e.co/>)"
    );
}

#[test]
fn test_blank_lines_get_trimmed_prefix() {
    let page = page("<p>one</p><p>two</p>");
    let range = page.select_all().unwrap();
    let text = copy_selection(&range, &page, &Settings::new()).unwrap();
    assert_eq!(
        text,
        "> one\n>\n> two\n>\n> \\~ [Article](<https://example.com/articles/one>)"
    );
    assert!(text.lines().all(|line| !line.ends_with(' ')));
}

#[test]
fn test_custom_prefix() {
    let text = assemble("a\n\nb", "// ", &Citation::new("T", "https://t/"), &[]);
    assert_eq!(text, "// a\n//\n// b\n//\n// \\~ [T](<https://t/>)");
}

#[test]
fn test_output_is_valid_markdown_blockquote() {
    let page = page("<h2>Title</h2><ul><li>a</li><li>b</li></ul>");
    let range = page.select_all().unwrap();
    let text = copy_selection(&range, &page, &Settings::new()).unwrap();
    let quotes = Parser::new(&text)
        .filter(|event| matches!(event, Event::Start(Tag::BlockQuote(_))))
        .count();
    assert_eq!(quotes, 1);
}
