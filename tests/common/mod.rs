// Shared test helpers for super-copy.

use std::fs;
use std::path::Path;

use super_copy::{copy_selection, LinkStyle, Page, Settings};

/// A fixture's page, selection and settings.
pub struct Fixture {
    pub html: String,
    pub expected_md: String,
    pub settings: Settings,
    pub url: String,
    pub title: Option<String>,
    /// Select from the first occurrence of `from` to the end of `to`.
    pub selection: Option<(String, String)>,
}

impl Fixture {
    /// Run the whole copy pipeline over the fixture page.
    pub fn run(&self) -> Option<String> {
        let mut page = Page::parse(&self.html, self.url.as_str());
        if let Some(title) = &self.title {
            page = page.with_title(title.as_str());
        }
        let range = match &self.selection {
            Some((from, to)) => page.select_between(from, to),
            None => page.select_all(),
        }
        .expect("fixture selection not found");
        copy_selection(&range, &page, &self.settings)
    }
}

/// Load a test fixture's input HTML, expected Markdown, and options.
///
/// Fixture directories contain `index.html`, `index.md`, and optionally
/// `index.json` with `prefix`, `linkStyle`, `url`, `title`, `from` and `to`.
pub fn load_fixture(name: &str) -> Fixture {
    let base = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-fixtures")
        .join(name);
    let html = fs::read_to_string(base.join("index.html"))
        .unwrap_or_else(|_| panic!("Missing fixture: {}/index.html", name));
    let md = fs::read_to_string(base.join("index.md"))
        .unwrap_or_else(|_| panic!("Missing fixture: {}/index.md", name));

    let mut settings = Settings::default();
    let mut url = "about:blank".to_string();
    let mut title = None;
    let mut from = None;
    let mut to = None;

    if let Ok(json_str) = fs::read_to_string(base.join("index.json")) {
        let val: serde_json::Value = serde_json::from_str(&json_str)
            .unwrap_or_else(|e| panic!("Bad fixture options {}/index.json: {e}", name));
        if let Some(s) = val.get("prefix").and_then(|v| v.as_str()) {
            settings = settings.with_prefix(s);
        }
        if let Some(s) = val.get("linkStyle").and_then(|v| v.as_str()) {
            let style: LinkStyle = s.parse().expect("valid linkStyle");
            settings = settings.with_link_style(style);
        }
        if let Some(s) = val.get("url").and_then(|v| v.as_str()) {
            url = s.to_string();
        }
        title = val.get("title").and_then(|v| v.as_str()).map(str::to_string);
        from = val.get("from").and_then(|v| v.as_str()).map(str::to_string);
        to = val.get("to").and_then(|v| v.as_str()).map(str::to_string);
    }

    Fixture {
        html,
        expected_md: md.trim_end_matches('\n').to_string(),
        settings,
        url,
        title,
        selection: from.zip(to),
    }
}
