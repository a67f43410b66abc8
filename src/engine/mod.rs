// Rule engine: turns an HTML string into Markdown by walking the parsed tree
// and asking a rule table how to render each element.
//
// Architecture:
//   HTML string → html5ever parse → collapse whitespace → process(body) → trim
//
// An element's rule is looked up first. Rules and the default rendering
// receive the element's converted children; kept and removed elements are
// never descended into.
// Neighbouring outputs are joined so that at most one blank line separates
// blocks.

mod commonmark;
pub mod escape;
mod rule;
mod util;
mod whitespace;

use std::fmt;

use markup5ever_rcdom::{Handle, NodeData};
use url::Url;

use crate::dom::{find_element, outer_html, parse_html};

pub use commonmark::commonmark_rules;
pub(crate) use commonmark::{fence_code, ordinal};
pub use escape::markdown_escape;
pub use rule::{Filter, Replacement, Rule, RuleMatch, RuleTable, Rules};
pub(crate) use util::is_block;
use util::FlankingWhitespace;

/// Markdown syntax choices shared by the base rules.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Unordered list marker.
    pub bullet: char,
    /// Code fence.
    pub fence: String,
    pub strong: String,
    pub em: String,
    /// Thematic break.
    pub rule: String,
    /// Hard line break marker, emitted before the newline.
    pub br: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            bullet: '-',
            fence: "```".to_string(),
            strong: "**".to_string(),
            em: "_".to_string(),
            rule: "* * *".to_string(),
            br: "\\".to_string(),
        }
    }
}

/// A reference-style link definition collected during conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// 1-based, in first-use order.
    pub id: usize,
    pub target: String,
}

impl fmt::Display for ReferenceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: <{}>", self.id, self.target)
    }
}

/// Per-run state handed to every replacement function.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub options: EngineOptions,
    /// Location that relative `href`/`src` values resolve against.
    pub base_url: Option<Url>,
    pub references: Vec<ReferenceEntry>,
}

impl Context {
    pub fn new(base_url: Option<Url>) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Record a reference definition and return its id.
    pub fn add_reference(&mut self, target: impl Into<String>) -> usize {
        let id = self.references.len() + 1;
        self.references.push(ReferenceEntry {
            id,
            target: target.into(),
        });
        id
    }
}

/// Escaping hook applied to text nodes outside `<code>`.
pub type EscapeFn = fn(&str) -> String;

/// A configured converter.
pub struct Engine {
    rules: Rules,
    escape: EscapeFn,
}

impl Engine {
    pub fn new(rules: Rules) -> Self {
        Self {
            rules,
            escape: markdown_escape,
        }
    }

    /// Replace the text escaping function.
    pub fn with_escape(mut self, escape: EscapeFn) -> Self {
        self.escape = escape;
        self
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Convert an HTML string to Markdown.
    pub fn convert(&self, html: &str, cx: &mut Context) -> String {
        let dom = parse_html(html);
        let Some(body) = find_element(&dom.document, "body") else {
            return String::new();
        };
        whitespace::collapse_whitespace(&body);
        let output = self.process(&body, cx);
        post_process(&output)
    }

    fn process(&self, parent: &Handle, cx: &mut Context) -> String {
        let children: Vec<Handle> = parent.children.borrow().clone();
        let mut output = String::new();
        for child in &children {
            let replacement = match child.data {
                NodeData::Text { ref contents } => {
                    let text = contents.borrow().to_string();
                    if util::is_code(child) {
                        text
                    } else {
                        (self.escape)(&text)
                    }
                }
                NodeData::Element { .. } => self.replacement_for_node(child, cx),
                _ => String::new(),
            };
            join_into(&mut output, &replacement);
        }
        output
    }

    /// Children are converted only for nodes whose rule uses the content;
    /// kept and removed subtrees never touch the run context.
    fn replacement_for_node(&self, node: &Handle, cx: &mut Context) -> String {
        let whitespace = util::flanking_whitespace(node);
        let block = is_block(node);
        let rendered = match self.rules.for_node(node) {
            RuleMatch::Blank => {
                if block {
                    "\n\n".to_string()
                } else {
                    String::new()
                }
            }
            RuleMatch::Rule(rule) => {
                let content = self.content(node, &whitespace, cx);
                rule.replace(&content, node, cx)
            }
            RuleMatch::Keep => {
                let html = outer_html(node);
                if block {
                    format!("\n\n{html}\n\n")
                } else {
                    html
                }
            }
            RuleMatch::Remove => String::new(),
            RuleMatch::Default => {
                let content = self.content(node, &whitespace, cx);
                if block {
                    format!("\n\n{content}\n\n")
                } else {
                    content
                }
            }
        };
        format!("{}{}{}", whitespace.leading, rendered, whitespace.trailing)
    }

    fn content(&self, node: &Handle, whitespace: &FlankingWhitespace, cx: &mut Context) -> String {
        let content = self.process(node, cx);
        if whitespace.is_empty() {
            content
        } else {
            content.trim().to_string()
        }
    }
}

/// Append `replacement`, merging the newlines at the seam into at most two.
fn join_into(output: &mut String, replacement: &str) {
    let kept = output.trim_end_matches('\n').len();
    let trailing = output.len() - kept;
    output.truncate(kept);

    let body = replacement.trim_start_matches('\n');
    let leading = replacement.len() - body.len();

    let newlines = trailing.max(leading).min(2);
    output.extend(std::iter::repeat('\n').take(newlines));
    output.push_str(body);
}

fn post_process(output: &str) -> String {
    output
        .trim_start_matches(['\t', '\r', '\n'])
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(Rules::compose(commonmark_rules(), RuleTable::new()))
    }

    fn convert(html: &str) -> String {
        engine().convert(html, &mut Context::new(None))
    }

    fn shout(content: &str, _: &Handle, _: &mut Context) -> String {
        content.to_uppercase()
    }

    #[test]
    fn test_join_caps_newlines() {
        let mut out = "a\n\n\n".to_string();
        join_into(&mut out, "\n\n\nb");
        assert_eq!(out, "a\n\nb");

        let mut out = "a".to_string();
        join_into(&mut out, "\nb");
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn test_flanking_whitespace_moves_outside_markers() {
        assert_eq!(convert("<p>a<strong> b </strong>c</p>"), "a **b** c");
    }

    #[test]
    fn test_text_escaped_outside_code() {
        assert_eq!(convert("<p>*hi*</p>"), r"\*hi\*");
    }

    #[test]
    fn test_unknown_block_gets_blank_lines() {
        assert_eq!(convert("<div>a</div><div>b</div>"), "a\n\nb");
        assert_eq!(convert("<p><span>a</span><span>b</span></p>"), "ab");
    }

    #[test]
    fn test_keep_emits_outer_html() {
        let rules = Rules::compose(commonmark_rules(), RuleTable::new().keep(Filter::Tag("sup")));
        let out = Engine::new(rules).convert("<p>x<sup>2</sup></p>", &mut Context::new(None));
        assert_eq!(out, "x<sup>2</sup>");
    }

    #[test]
    fn test_override_rule_and_escape_hook() {
        let rules = Rules::compose(
            commonmark_rules(),
            RuleTable::new().add("paragraph", Rule::new(Filter::Tag("p"), shout)),
        );
        let engine = Engine::new(rules).with_escape(|t| t.replace('a', "@"));
        assert_eq!(engine.convert("<p>banana</p>", &mut Context::new(None)), "B@N@N@");
    }

    #[test]
    fn test_references_numbered_in_order() {
        let mut cx = Context::new(None);
        assert_eq!(cx.add_reference("https://a/"), 1);
        assert_eq!(cx.add_reference("https://b/"), 2);
        assert_eq!(cx.references[1].to_string(), "[2]: <https://b/>");
    }

    fn counted(content: &str, _: &Handle, cx: &mut Context) -> String {
        let id = cx.add_reference(content);
        format!("{content}[{id}]")
    }

    #[test]
    fn test_kept_and_removed_subtrees_add_no_references() {
        let rules = Rules::compose(
            commonmark_rules(),
            RuleTable::new()
                .add("counted", Rule::new(Filter::Tag("a"), counted))
                .keep(Filter::Tag("figure"))
                .remove(Filter::Tag("aside")),
        );
        let mut cx = Context::new(None);
        let out = Engine::new(rules).convert(
            "<figure><a>x</a></figure><aside><a>y</a></aside><p><a>z</a></p>",
            &mut cx,
        );
        assert_eq!(out, "<figure><a>x</a></figure>\n\nz[1]");
        assert_eq!(cx.references.len(), 1);
        assert_eq!(cx.references[0].target, "z");
    }

    #[test]
    fn test_blank_elements_dropped() {
        assert_eq!(convert("<p>a</p><p> </p><p>b</p>"), "a\n\nb");
        assert_eq!(convert(""), "");
    }
}
