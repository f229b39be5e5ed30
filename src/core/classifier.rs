// src/core/classifier.rs
//! Content fingerprinting and classification
//!
//! Everything here is pure string work over already-valid UTF-8. The only
//! field allowed to vary between library versions is the detected language,
//! which is delegated to a [`LanguageIdentifier`].

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::core::types::{ContentMetadata, ContentType};

/// Texts with more characters than this are classified as long text
pub const LONG_TEXT_THRESHOLD: usize = 100;

/// Language detection is only attempted above this many characters
pub const MIN_LANGUAGE_CHARS: usize = 10;

/// Best-effort dominant language detection
pub trait LanguageIdentifier: Send + Sync {
    /// Return a language code, or `None` when no language is confidently dominant
    fn detect_dominant_language(&self, text: &str) -> Option<String>;
}

/// Statistical detector backed by `whatlang`, reporting ISO 639-3 codes
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangIdentifier;

impl LanguageIdentifier for WhatlangIdentifier {
    fn detect_dominant_language(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        if !info.is_reliable() {
            return None;
        }
        Some(info.lang().code().to_string())
    }
}

/// Identifier that never reports a language
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLanguageDetection;

impl LanguageIdentifier for NoLanguageDetection {
    fn detect_dominant_language(&self, _text: &str) -> Option<String> {
        None
    }
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Anchored at the start only: anything may follow a valid scheme + host prefix.
    RE.get_or_init(|| {
        Regex::new(r"^https?://[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*(:[0-9]+)?([/?#][^\s]*)?")
            .expect("url regex is valid")
    })
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email regex is valid")
    })
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("date regex is valid"))
}

fn digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("digits regex is valid"))
}

/// SHA-256 of the text, lowercase hex
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

/// Non-empty tokens between runs of whitespace
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of segments produced by splitting on `\n`.
///
/// A trailing newline yields a trailing empty segment, so `"a\n"` has two lines.
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

pub fn is_url(text: &str) -> bool {
    url_regex().is_match(text)
}

/// Whole-string match only; an address embedded in other text does not count
pub fn is_email(text: &str) -> bool {
    email_regex().is_match(text)
}

/// First matching rule wins
pub fn content_type(
    text: &str,
    is_url: bool,
    is_email: bool,
    character_count: usize,
) -> ContentType {
    if is_url {
        ContentType::Url
    } else if is_email {
        ContentType::Email
    } else if date_regex().is_match(text) {
        ContentType::DateContaining
    } else if digits_regex().is_match(text) {
        ContentType::NumericContaining
    } else if text.contains('\n') || character_count > LONG_TEXT_THRESHOLD {
        ContentType::LongText
    } else {
        ContentType::ShortText
    }
}

/// Derives [`ContentMetadata`] from raw clipboard text
pub struct Classifier {
    language: Box<dyn LanguageIdentifier>,
    min_language_chars: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_identifier(WhatlangIdentifier)
    }
}

impl Classifier {
    pub fn with_identifier<L: LanguageIdentifier + 'static>(identifier: L) -> Self {
        Self {
            language: Box::new(identifier),
            min_language_chars: MIN_LANGUAGE_CHARS,
        }
    }

    /// Classifier whose output is fully deterministic (no language detection)
    pub fn without_language() -> Self {
        Self::with_identifier(NoLanguageDetection)
    }

    pub fn with_min_language_chars(mut self, min_chars: usize) -> Self {
        self.min_language_chars = min_chars;
        self
    }

    pub fn classify(&self, text: &str) -> ContentMetadata {
        let character_count = character_count(text);
        let is_url = is_url(text);
        let is_email = is_email(text);
        let content_type = content_type(text, is_url, is_email, character_count);

        let language_detected = if character_count > self.min_language_chars {
            self.language.detect_dominant_language(text)
        } else {
            None
        };

        ContentMetadata {
            content_hash: fingerprint(text),
            character_count,
            word_count: word_count(text),
            line_count: line_count(text),
            content_type,
            is_url,
            is_email,
            language_detected,
        }
    }
}
