// src/core/detector.rs
//! Clipboard change detection by change-token polling
//!
//! The clipboard backend exposes a counter that increments on every write.
//! Comparing counters avoids reading and hashing the payload on every tick.

use tracing::{debug, trace};

use crate::core::types::{PollOutcome, SourceApp};

/// A shared clipboard resource
pub trait ClipboardSource: Send {
    /// Opaque counter that changes whenever the clipboard content changes
    fn change_token(&self) -> i64;

    /// Current plain-text payload, `None` if the clipboard holds no readable text
    fn current_text(&self) -> Option<String>;
}

/// Reports which application owns focus right now
pub trait ForegroundAppSource: Send {
    fn foreground_app(&self) -> Option<SourceApp>;
}

impl<T: ClipboardSource + ?Sized> ClipboardSource for Box<T> {
    fn change_token(&self) -> i64 {
        (**self).change_token()
    }

    fn current_text(&self) -> Option<String> {
        (**self).current_text()
    }
}

impl<T: ForegroundAppSource + ?Sized> ForegroundAppSource for Box<T> {
    fn foreground_app(&self) -> Option<SourceApp> {
        (**self).foreground_app()
    }
}

/// Foreground source for environments without a notion of focused app
#[derive(Debug, Default, Clone, Copy)]
pub struct NoForegroundApp;

impl ForegroundAppSource for NoForegroundApp {
    fn foreground_app(&self) -> Option<SourceApp> {
        None
    }
}

/// Polls a [`ClipboardSource`] and reports changes since the previous poll
pub struct ChangeDetector<C> {
    source: C,
    last_token: i64,
}

impl<C: ClipboardSource> ChangeDetector<C> {
    /// Create a detector, taking the current token as baseline.
    ///
    /// Whatever is on the clipboard at this point is never reported.
    pub fn new(source: C) -> Self {
        let last_token = source.change_token();
        debug!(token = last_token, "Clipboard baseline captured");
        Self { source, last_token }
    }

    pub fn last_token(&self) -> i64 {
        self.last_token
    }

    /// Compare the change token against the last one seen.
    ///
    /// A moved token whose payload is unreadable, not text, or empty yields
    /// [`PollOutcome::NoText`]. The monitor writes nothing for it, exactly as
    /// for an unchanged token, but still counts it as a change. The token is
    /// consumed either way, so the same payload is never read twice.
    pub fn poll(&mut self) -> PollOutcome {
        let token = self.source.change_token();
        if token == self.last_token {
            return PollOutcome::Unchanged;
        }

        trace!(from = self.last_token, to = token, "Clipboard token changed");
        self.last_token = token;

        match self.source.current_text() {
            Some(text) if !text.is_empty() => PollOutcome::Text(text),
            _ => PollOutcome::NoText,
        }
    }

    pub fn into_source(self) -> C {
        self.source
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory clipboard shared between a test and the code under test
    #[derive(Clone, Default)]
    pub(crate) struct FakeClipboard {
        state: Arc<Mutex<(i64, Option<String>)>>,
    }

    impl FakeClipboard {
        pub(crate) fn with_text(text: &str) -> Self {
            let clipboard = Self::default();
            clipboard.copy(text);
            clipboard
        }

        pub(crate) fn copy(&self, text: &str) {
            let mut state = self.state.lock().unwrap();
            state.0 += 1;
            state.1 = Some(text.to_string());
        }

        pub(crate) fn copy_non_text(&self) {
            let mut state = self.state.lock().unwrap();
            state.0 += 1;
            state.1 = None;
        }
    }

    impl ClipboardSource for FakeClipboard {
        fn change_token(&self) -> i64 {
            self.state.lock().unwrap().0
        }

        fn current_text(&self) -> Option<String> {
            self.state.lock().unwrap().1.clone()
        }
    }

    #[test]
    fn test_existing_content_is_baseline() {
        let clipboard = FakeClipboard::with_text("already here");
        let mut detector = ChangeDetector::new(clipboard.clone());

        assert_eq!(detector.last_token(), 1);
        assert_eq!(detector.poll(), PollOutcome::Unchanged);
    }

    #[test]
    fn test_change_reported_once() {
        let clipboard = FakeClipboard::default();
        let mut detector = ChangeDetector::new(clipboard.clone());

        clipboard.copy("hello");
        assert_eq!(detector.poll(), PollOutcome::Text("hello".to_string()));
        assert_eq!(detector.poll(), PollOutcome::Unchanged);
        assert_eq!(detector.poll(), PollOutcome::Unchanged);
    }

    #[test]
    fn test_recopying_same_text_is_a_change() {
        let clipboard = FakeClipboard::default();
        let mut detector = ChangeDetector::new(clipboard.clone());

        clipboard.copy("same");
        assert_eq!(detector.poll(), PollOutcome::Text("same".to_string()));
        clipboard.copy("same");
        assert_eq!(detector.poll(), PollOutcome::Text("same".to_string()));
    }

    #[test]
    fn test_non_text_payload() {
        let clipboard = FakeClipboard::default();
        let mut detector = ChangeDetector::new(clipboard.clone());

        clipboard.copy_non_text();
        assert_eq!(detector.poll(), PollOutcome::NoText);
        assert_eq!(detector.last_token(), 1);
        assert_eq!(detector.poll(), PollOutcome::Unchanged);

        clipboard.copy("");
        assert_eq!(detector.poll(), PollOutcome::NoText);
    }
}
