use thiserror::Error;
use tracing::info;

use super::ExportPayload;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Clipboard is not available on this system")]
    Unavailable,

    #[error("Failed to copy newsletter: {0}")]
    Write(String),
}

/// Platform clipboard seam.
pub trait Clipboard {
    /// Whether `text/html` with a `text/plain` alternative can be written.
    fn supports_rich(&self) -> bool;
    fn write_rich(&mut self, html: &str, text: &str) -> Result<(), ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard. Keep it alive for as long as the copied content
/// should stay available; on X11 the selection dies with its owner.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner = arboard::Clipboard::new().map_err(|_| ClipboardError::Unavailable)?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn supports_rich(&self) -> bool {
        true
    }

    fn write_rich(&mut self, html: &str, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_html(html, Some(text))
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    Rich,
    PlainText,
}

impl CopyMode {
    pub fn message(&self) -> &'static str {
        match self {
            CopyMode::Rich => "Copied! Paste directly into beehiiv.",
            CopyMode::PlainText => "Copied as plain text.",
        }
    }
}

/// Write the payload as rich content when supported, plain text otherwise.
pub fn copy_payload(
    clipboard: Option<&mut dyn Clipboard>,
    payload: &ExportPayload,
) -> Result<CopyMode, ClipboardError> {
    let clipboard = clipboard.ok_or(ClipboardError::Unavailable)?;

    let mode = if clipboard.supports_rich() {
        clipboard.write_rich(&payload.html, &payload.text)?;
        CopyMode::Rich
    } else {
        clipboard.write_text(&payload.text)?;
        CopyMode::PlainText
    };

    info!(?mode, bytes = payload.html.len(), "Export copied to clipboard");
    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeClipboard {
        rich: bool,
        fail: bool,
        html: Option<String>,
        text: Option<String>,
    }

    impl Clipboard for FakeClipboard {
        fn supports_rich(&self) -> bool {
            self.rich
        }

        fn write_rich(&mut self, html: &str, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Write("denied".to_string()));
            }
            self.html = Some(html.to_string());
            self.text = Some(text.to_string());
            Ok(())
        }

        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Write("denied".to_string()));
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn payload() -> ExportPayload {
        ExportPayload {
            html: "<p>Hi</p>".to_string(),
            text: "Hi".to_string(),
            omitted: Vec::new(),
        }
    }

    #[test]
    fn test_rich_clipboard_gets_both_formats() {
        let mut clipboard = FakeClipboard {
            rich: true,
            ..FakeClipboard::default()
        };
        let mode = copy_payload(Some(&mut clipboard), &payload()).unwrap();
        assert_eq!(mode, CopyMode::Rich);
        assert_eq!(clipboard.html.as_deref(), Some("<p>Hi</p>"));
        assert_eq!(clipboard.text.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_plain_clipboard_gets_text_only() {
        let mut clipboard = FakeClipboard::default();
        let mode = copy_payload(Some(&mut clipboard), &payload()).unwrap();
        assert_eq!(mode, CopyMode::PlainText);
        assert_eq!(clipboard.html, None);
        assert_eq!(clipboard.text.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_missing_clipboard_is_an_error() {
        let err = copy_payload(None, &payload()).unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable));
        assert_eq!(err.to_string(), "Clipboard is not available on this system");
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut clipboard = FakeClipboard {
            rich: true,
            fail: true,
            ..FakeClipboard::default()
        };
        let err = copy_payload(Some(&mut clipboard), &payload()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to copy newsletter: denied");
    }
}
