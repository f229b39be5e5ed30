// src/bin/classify.rs
//! Classify text from stdin the same way the monitor classifies clipboard content

use std::io::Read;

use anyhow::{Context, Result};
use clipboard_monitor::prelude::*;

fn main() -> Result<()> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin as UTF-8 text")?;

    if text.is_empty() {
        anyhow::bail!("No input: pipe some text into clipboard-classify");
    }

    let metadata = Classifier::default().classify(&text);
    println!("{}", serde_json::to_string_pretty(&metadata)?);

    Ok(())
}
