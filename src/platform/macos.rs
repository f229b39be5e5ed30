// src/platform/macos.rs
//! NSPasteboard and NSWorkspace backed collaborators
//!
//! `changeCount` on the general pasteboard is the change token; it increments
//! every time any application writes to the clipboard.

#![allow(unused_unsafe)]

use objc2_app_kit::{NSPasteboard, NSWorkspace};
use objc2_foundation::NSString;

use crate::core::detector::{ClipboardSource, ForegroundAppSource};
use crate::core::types::SourceApp;

const PLAIN_TEXT_TYPE: &str = "public.utf8-plain-text";

/// The system general pasteboard
#[derive(Debug, Default, Clone, Copy)]
pub struct MacPasteboard;

impl ClipboardSource for MacPasteboard {
    fn change_token(&self) -> i64 {
        unsafe {
            let pasteboard = NSPasteboard::generalPasteboard();
            pasteboard.changeCount() as i64
        }
    }

    fn current_text(&self) -> Option<String> {
        unsafe {
            let pasteboard = NSPasteboard::generalPasteboard();
            let text_type = NSString::from_str(PLAIN_TEXT_TYPE);
            pasteboard
                .stringForType(&text_type)
                .map(|text| text.to_string())
        }
    }
}

/// Frontmost application as reported by NSWorkspace
#[derive(Debug, Default, Clone, Copy)]
pub struct MacForegroundApp;

impl ForegroundAppSource for MacForegroundApp {
    fn foreground_app(&self) -> Option<SourceApp> {
        unsafe {
            let workspace = NSWorkspace::sharedWorkspace();
            let app = workspace.frontmostApplication()?;

            let name = app.localizedName().map(|n| n.to_string());
            let bundle_id = app.bundleIdentifier().map(|b| b.to_string());

            if name.is_none() && bundle_id.is_none() {
                return None;
            }
            Some(SourceApp { name, bundle_id })
        }
    }
}
