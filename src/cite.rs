// Output assembly: line prefix, attribution line, reference definitions.

use crate::engine::ReferenceEntry;

/// Where the selection came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// The attribution line, without prefix: `\~ [title](<url>)`.
    pub fn line(&self) -> String {
        format!("\\~ [{}](<{}>)", escape_title(&self.title), self.url)
    }
}

fn escape_title(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

/// Prefix every line of `markdown`. Blank lines get the prefix with its
/// trailing whitespace removed.
pub fn apply_prefix(markdown: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return markdown.to_string();
    }
    let blank = prefix.trim_end();
    markdown
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                blank.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the final clipboard text.
///
/// The body and citation carry the prefix; reference definitions follow
/// unprefixed after a blank line.
pub fn assemble(
    markdown: &str,
    prefix: &str,
    citation: &Citation,
    references: &[ReferenceEntry],
) -> String {
    let body = markdown.trim_end_matches('\n');
    let mut out = apply_prefix(body, prefix);
    out.push('\n');
    out.push_str(prefix.trim_end());
    out.push('\n');
    out.push_str(prefix);
    out.push_str(&citation.line());

    if !references.is_empty() {
        out.push_str("\n\n");
        let definitions: Vec<String> = references.iter().map(ToString::to_string).collect();
        out.push_str(&definitions.join("\n"));
    }
    out
}
