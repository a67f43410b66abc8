// Markdown metacharacter escaping for text nodes.
//
// Applied to every text node outside `<code>`. Characters that start
// Markdown syntax anywhere are always escaped; line-start constructs
// (headings, list markers, quotes, setext underlines) only at the start of
// the text node.

use std::sync::LazyLock;

use regex::Regex;

struct Escape {
    pattern: Regex,
    replacement: &'static str,
}

static ESCAPES: LazyLock<Vec<Escape>> = LazyLock::new(|| {
    [
        (r"\\", r"\\"),
        (r"\*", r"\*"),
        (r"^-", r"\-"),
        (r"^\+ ", r"\+ "),
        (r"^(=+)", r"\$1"),
        (r"^(#{1,6}) ", r"\$1 "),
        (r"`", r"\`"),
        (r"^~~~", r"\~~~"),
        (r"\[", r"\["),
        (r"\]", r"\]"),
        (r"^>", r"\>"),
        (r"_", r"\_"),
        (r"^(\d+)\. ", r"$1\. "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Escape {
        pattern: Regex::new(pattern).expect("valid escape pattern"),
        replacement,
    })
    .collect()
});

/// Escape Markdown metacharacters in literal text.
pub fn markdown_escape(text: &str) -> String {
    ESCAPES.iter().fold(text.to_string(), |acc, escape| {
        escape
            .pattern
            .replace_all(&acc, escape.replacement)
            .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_metacharacters() {
        assert_eq!(markdown_escape("a*b_c`d"), r"a\*b\_c\`d");
        assert_eq!(markdown_escape("[x]"), r"\[x\]");
        assert_eq!(markdown_escape(r"back\slash"), r"back\\slash");
    }

    #[test]
    fn test_line_start_constructs() {
        assert_eq!(markdown_escape("# title"), r"\# title");
        assert_eq!(markdown_escape("- item"), r"\- item");
        assert_eq!(markdown_escape("+ item"), r"\+ item");
        assert_eq!(markdown_escape("> quote"), r"\> quote");
        assert_eq!(markdown_escape("1. first"), r"1\. first");
        assert_eq!(markdown_escape("==="), r"\===");
        assert_eq!(markdown_escape("~~~"), r"\~~~");
    }

    #[test]
    fn test_mid_text_line_constructs_untouched() {
        assert_eq!(markdown_escape("a - b > c 1. d"), "a - b > c 1. d");
    }
}
