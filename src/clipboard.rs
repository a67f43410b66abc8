// Delivery of the finished text.

use std::io::Write;

use tracing::error;

use crate::error::SuperCopyError;

/// Destination for the converted text.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), SuperCopyError>;
}

/// Writes the text to standard output, followed by a newline.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ClipboardSink for StdoutSink {
    fn write_text(&mut self, text: &str) -> Result<(), SuperCopyError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")
            .and_then(|()| stdout.flush())
            .map_err(|e| SuperCopyError::Delivery(e.to_string()))
    }
}

/// The system clipboard.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, SuperCopyError> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| SuperCopyError::Delivery(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), SuperCopyError> {
        self.clipboard
            .set_text(text)
            .map_err(|e| SuperCopyError::Delivery(e.to_string()))
    }
}

/// Write `text` to `sink` once. A failure is logged and reported as `false`.
pub fn deliver<S: ClipboardSink + ?Sized>(sink: &mut S, text: &str) -> bool {
    match sink.write_text(text) {
        Ok(()) => true,
        Err(err) => {
            error!(%err, "clipboard write failed");
            false
        }
    }
}
