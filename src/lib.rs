// super-copy: convert a selected HTML fragment to Markdown with a citation.
//
// Architecture:
//   selection → extract → HTML string → rule engine → align tables
//             → prefix + citation + reference definitions → clipboard sink
//
// The rule engine walks its own html5ever parse of the extracted HTML; the
// conversion rules (links, emphasis, list items, GFM tables, task lists)
// are registered over a base CommonMark rule table.

mod align;
mod cite;
mod clipboard;
pub mod dom;
pub mod engine;
mod error;
mod extract;
pub mod rules;
mod table;

use std::fmt;
use std::str::FromStr;

use tracing::trace;
use url::Url;

pub use align::align_tables;
pub use cite::{apply_prefix, assemble, Citation};
#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{deliver, ClipboardSink, StdoutSink};
pub use dom::{Boundary, DomRange, Page, SelectionRange};
pub use engine::ReferenceEntry;
pub use error::SuperCopyError;
pub use extract::extract_html;
pub use table::TableClassification;

/// How links and images are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkStyle {
    /// `[text](<url>)`
    #[default]
    Inline,
    /// `[text][1]` with `[1]: <url>` collected at the end.
    Reference,
}

impl LinkStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStyle::Inline => "inline",
            LinkStyle::Reference => "reference",
        }
    }
}

impl fmt::Display for LinkStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkStyle {
    type Err = SuperCopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(LinkStyle::Inline),
            "reference" => Ok(LinkStyle::Reference),
            other => Err(SuperCopyError::InvalidOption {
                field: "linkStyle".to_string(),
                allowed: "\"inline\", \"reference\"".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Options for the conversion step.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub link_style: LinkStyle,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link_style(mut self, link_style: LinkStyle) -> Self {
        self.link_style = link_style;
        self
    }
}

/// User settings read once per copy.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Prepended to every output line. Default: `"> "`.
    pub prefix: String,
    pub link_style: LinkStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: "> ".to_string(),
            link_style: LinkStyle::Inline,
        }
    }
}

impl Settings {
    /// Create settings with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line prefix. An empty prefix leaves lines untouched.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the link style.
    pub fn with_link_style(mut self, link_style: LinkStyle) -> Self {
        self.link_style = link_style;
        self
    }

    pub fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions::new().with_link_style(self.link_style)
    }
}

/// Result of converting one HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Markdown with aligned tables, before prefixing.
    pub markdown: String,
    /// Reference definitions, empty for inline links.
    pub references: Vec<ReferenceEntry>,
}

/// Convert an HTML fragment to Markdown.
///
/// Relative links and images resolve against `base_url`.
///
/// # Examples
///
/// ```
/// use super_copy::{convert_html, ConversionOptions};
///
/// let conversion = convert_html("Hello <b>world</b>", &ConversionOptions::new(), None);
/// assert_eq!(conversion.markdown, "Hello **world**");
/// ```
pub fn convert_html(
    html: &str,
    options: &ConversionOptions,
    base_url: Option<&Url>,
) -> Conversion {
    let engine =
        engine::Engine::new(rules::rule_set(options.link_style)).with_escape(rules::escape);
    let mut cx = engine::Context::new(base_url.cloned());
    let markdown = align_tables(&engine.convert(html, &mut cx));
    trace!(
        link_style = %options.link_style,
        references = cx.references.len(),
        bytes = markdown.len(),
        "converted selection"
    );
    Conversion {
        markdown,
        references: cx.references,
    }
}

/// Run the whole pipeline for a selection on `page`.
///
/// Returns `None` when the selection is collapsed or holds only whitespace.
///
/// # Examples
///
/// ```
/// use super_copy::{copy_selection, Page, Settings};
///
/// let page = Page::parse("<p>Hello <b>world</b></p>", "https://e.co/").with_title("Test");
/// let range = page.select_all().unwrap();
/// let text = copy_selection(&range, &page, &Settings::new()).unwrap();
/// assert_eq!(text, "> Hello **world**\n>\n> \\~ [Test](<https://e.co/>)");
/// ```
pub fn copy_selection<R: SelectionRange + ?Sized>(
    range: &R,
    page: &Page,
    settings: &Settings,
) -> Option<String> {
    let html = extract_html(range)?;
    let base_url = page.base_url();
    let conversion = convert_html(&html, &settings.conversion_options(), base_url.as_ref());
    let citation = Citation::new(page.title(), page.location());
    Some(assemble(
        &conversion.markdown,
        &settings.prefix,
        &citation,
        &conversion.references,
    ))
}
