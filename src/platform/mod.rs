// src/platform/mod.rs
//! OS clipboard and focus bindings

#[cfg(target_os = "macos")]
pub mod macos;

use anyhow::Result;

use crate::core::detector::{ClipboardSource, ForegroundAppSource};

/// Clipboard and foreground-app sources for the current OS
#[cfg(target_os = "macos")]
pub fn system_sources() -> Result<(Box<dyn ClipboardSource>, Box<dyn ForegroundAppSource>)> {
    Ok((Box::new(macos::MacPasteboard), Box::new(macos::MacForegroundApp)))
}

#[cfg(not(target_os = "macos"))]
pub fn system_sources() -> Result<(Box<dyn ClipboardSource>, Box<dyn ForegroundAppSource>)> {
    Err(anyhow::anyhow!(
        "Clipboard monitoring is only supported on macOS"
    ))
}
