use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use super_copy::{copy_selection, deliver, ClipboardSink, LinkStyle, Page, Settings, StdoutSink};

/// Copy part of an HTML page as Markdown with a citation.
///
/// Reads the page from stdin and prints the result.
#[derive(Parser)]
#[command(name = "super-copy", version)]
struct Cli {
    /// Prepended to every output line
    #[arg(long, default_value = "> ")]
    prefix: String,

    /// Link style: inline or reference
    #[arg(long, default_value = "inline")]
    link_style: LinkStyle,

    /// Page location, used for the citation and to resolve relative links
    #[arg(long, default_value = "about:blank")]
    url: String,

    /// Citation title (defaults to the page's <title>)
    #[arg(long)]
    title: Option<String>,

    /// Start the selection at the first occurrence of this text
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// End the selection after the first later occurrence of this text
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Copy to the system clipboard instead of printing
    #[cfg(feature = "clipboard")]
    #[arg(long)]
    clipboard: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut html = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut html) {
        eprintln!("super-copy: failed to read stdin: {err}");
        return ExitCode::FAILURE;
    }

    let mut page = Page::parse(&html, cli.url.as_str());
    if let Some(title) = &cli.title {
        page = page.with_title(title.as_str());
    }

    let range = match (&cli.from, &cli.to) {
        (Some(from), Some(to)) => page.select_between(from, to),
        _ => page.select_all(),
    };
    let Some(range) = range else {
        eprintln!("super-copy: selection not found");
        return ExitCode::FAILURE;
    };

    let settings = Settings::new()
        .with_prefix(cli.prefix.as_str())
        .with_link_style(cli.link_style);
    let Some(text) = copy_selection(&range, &page, &settings) else {
        return ExitCode::SUCCESS;
    };

    let mut sink = match sink(&cli) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("super-copy: {err}");
            return ExitCode::FAILURE;
        }
    };
    if deliver(sink.as_mut(), &text) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(feature = "clipboard")]
fn sink(cli: &Cli) -> Result<Box<dyn ClipboardSink>, super_copy::SuperCopyError> {
    if cli.clipboard {
        return Ok(Box::new(super_copy::SystemClipboard::new()?));
    }
    Ok(Box::new(StdoutSink))
}

#[cfg(not(feature = "clipboard"))]
fn sink(_: &Cli) -> Result<Box<dyn ClipboardSink>, super_copy::SuperCopyError> {
    Ok(Box::new(StdoutSink))
}
