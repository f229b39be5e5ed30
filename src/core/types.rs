// src/core/types.rs
//! Common types and traits for clipboard capture

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the application that owned focus when a change was detected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceApp {
    pub name: Option<String>,
    pub bundle_id: Option<String>,
}

impl SourceApp {
    pub fn new(name: impl Into<String>, bundle_id: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            bundle_id: Some(bundle_id.into()),
        }
    }
}

impl fmt::Display for SourceApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.name.as_deref().unwrap_or("Unknown"),
            self.bundle_id.as_deref().unwrap_or("unknown")
        )
    }
}

/// Classification of captured text, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Url,
    Email,
    DateContaining,
    NumericContaining,
    LongText,
    ShortText,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Url => "url",
            ContentType::Email => "email",
            ContentType::DateContaining => "date_containing",
            ContentType::NumericContaining => "numeric_containing",
            ContentType::LongText => "long_text",
            ContentType::ShortText => "short_text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(ContentType::Url),
            "email" => Ok(ContentType::Email),
            "date_containing" => Ok(ContentType::DateContaining),
            "numeric_containing" => Ok(ContentType::NumericContaining),
            "long_text" => Ok(ContentType::LongText),
            "short_text" => Ok(ContentType::ShortText),
            other => Err(format!("unknown content type: {other}")),
        }
    }
}

/// Metadata derived from a text payload by the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub content_hash: String,
    pub character_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub content_type: ContentType,
    pub is_url: bool,
    pub is_email: bool,
    pub language_detected: Option<String>,
}

/// A single captured clipboard value. Created once per detected change, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub content: String,
    pub content_hash: String,
    pub app_name: Option<String>,
    pub app_bundle_id: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub character_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub content_type: ContentType,
    pub is_url: bool,
    pub is_email: bool,
    pub language_detected: Option<String>,
}

impl ClipboardEntry {
    /// Assemble an entry from already classified content
    pub fn from_parts(
        content: String,
        metadata: ContentMetadata,
        source_app: Option<SourceApp>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let (app_name, app_bundle_id) = match source_app {
            Some(app) => (app.name, app.bundle_id),
            None => (None, None),
        };

        Self {
            content,
            content_hash: metadata.content_hash,
            app_name,
            app_bundle_id,
            captured_at,
            character_count: metadata.character_count,
            word_count: metadata.word_count,
            line_count: metadata.line_count,
            content_type: metadata.content_type,
            is_url: metadata.is_url,
            is_email: metadata.is_email,
            language_detected: metadata.language_detected,
        }
    }

    /// Short hash prefix for log lines
    pub fn short_hash(&self) -> &str {
        let end = self.content_hash.len().min(12);
        &self.content_hash[..end]
    }
}

/// An entry read back from the store together with its surrogate key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: i64,
    #[serde(flatten)]
    pub entry: ClipboardEntry,
}

/// Result of a single detector poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Change token is the same as last time
    Unchanged,
    /// Token moved but the clipboard holds no readable text
    NoText,
    /// Token moved and the clipboard holds this text
    Text(String),
}

/// Counters accumulated by the monitor loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub ticks: u64,
    pub changes: u64,
    pub stored: u64,
    pub duplicates: u64,
    pub non_text: u64,
    pub failures: u64,
}

/// Trait for captured-entry listeners
pub trait EntryListener: Send {
    /// Called after a new entry has been written to the store
    fn on_entry_captured(&mut self, entry: &ClipboardEntry);

    /// Called when monitoring starts
    fn on_monitoring_started(&mut self) {}

    /// Called when monitoring stops
    fn on_monitoring_stopped(&mut self, _stats: &MonitorStats) {}
}
