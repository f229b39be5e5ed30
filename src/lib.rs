//! Clipboard Monitor Library
//!
//! Polls the system clipboard, classifies each new text value and records
//! unique entries in a local SQLite database.
//!
//! Data flows one way: clipboard → [`ChangeDetector`] → [`Classifier`] →
//! [`EntryStore`], driven by a [`ClipboardMonitor`].

#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod core;
pub mod listeners;
pub mod platform;

pub use config::MonitorConfig;
pub use crate::core::classifier::{Classifier, LanguageIdentifier};
pub use crate::core::detector::{ChangeDetector, ClipboardSource, ForegroundAppSource};
pub use crate::core::monitor::{ClipboardMonitor, MonitorHandle, MonitorState};
pub use crate::core::store::{EntryStore, InsertOutcome, LazyStore};
pub use crate::core::types::{ClipboardEntry, ContentType, EntryListener, SourceApp};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::core::classifier::{Classifier, LanguageIdentifier, WhatlangIdentifier};
    pub use crate::core::detector::{
        ChangeDetector, ClipboardSource, ForegroundAppSource, NoForegroundApp,
    };
    pub use crate::core::error::{ConfigError, StoreError};
    pub use crate::core::monitor::{ClipboardMonitor, MonitorHandle, MonitorState, POLL_INTERVAL};
    pub use crate::core::store::{EntryStore, InsertOutcome, LazyStore};
    pub use crate::core::types::{
        ClipboardEntry, ContentMetadata, ContentType, EntryListener, MonitorStats, PollOutcome,
        SourceApp, StoredEntry,
    };
}
