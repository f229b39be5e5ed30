// src/listeners.rs
//! Console listeners that echo captured entries

use serde_json::json;

use crate::core::types::{ClipboardEntry, EntryListener, MonitorStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Human,
}

/// Prints every stored entry to stdout
pub struct ConsoleLogger {
    format: LogFormat,
    preview_chars: usize,
    entry_count: usize,
}

impl ConsoleLogger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            preview_chars: 80,
            entry_count: 0,
        }
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    /// Render one entry in the configured format
    pub fn render(&self, entry: &ClipboardEntry) -> String {
        match self.format {
            LogFormat::Json => entry_json(entry).to_string(),
            LogFormat::Human => {
                let mut out = format!(
                    "📋 #{} [{}] {} chars, {} words, {} lines",
                    self.entry_count,
                    entry.content_type,
                    entry.character_count,
                    entry.word_count,
                    entry.line_count
                );
                if let Some(app) = entry.app_name.as_deref().or(entry.app_bundle_id.as_deref()) {
                    out.push_str(&format!("\n   From: {}", app));
                }
                if let Some(lang) = &entry.language_detected {
                    out.push_str(&format!("\n   Language: {}", lang));
                }
                out.push_str(&format!(
                    "\n   \"{}\"",
                    safe_truncate(&single_line(&entry.content), self.preview_chars)
                ));
                out
            }
        }
    }
}

impl EntryListener for ConsoleLogger {
    fn on_entry_captured(&mut self, entry: &ClipboardEntry) {
        self.entry_count += 1;
        println!("{}", self.render(entry));
    }

    fn on_monitoring_started(&mut self) {
        if self.format == LogFormat::Json {
            let start_event = json!({
                "event_type": "monitoring_started",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            println!("{}", start_event);
        }
    }

    fn on_monitoring_stopped(&mut self, stats: &MonitorStats) {
        match self.format {
            LogFormat::Json => {
                let stop_event = json!({
                    "event_type": "monitoring_stopped",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "stats": stats,
                });
                println!("{}", stop_event);
            }
            LogFormat::Human => {
                println!(
                    "📊 {} new entries, {} duplicates, {} non-text changes",
                    stats.stored, stats.duplicates, stats.non_text
                );
            }
        }
    }
}

/// JSON view of an entry as written to the store
pub fn entry_json(entry: &ClipboardEntry) -> serde_json::Value {
    json!({
        "timestamp": entry.captured_at.to_rfc3339(),
        "content": entry.content,
        "content_hash": entry.content_hash,
        "app_name": entry.app_name,
        "app_bundle_id": entry.app_bundle_id,
        "character_count": entry.character_count,
        "word_count": entry.word_count,
        "line_count": entry.line_count,
        "content_type": entry.content_type,
        "is_url": entry.is_url,
        "is_email": entry.is_email,
        "language_detected": entry.language_detected,
    })
}

/// Unicode-aware truncation with an ellipsis
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect::<String>() + "..."
    }
}

fn single_line(s: &str) -> String {
    s.replace('\n', "⏎")
}
