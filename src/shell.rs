//! Host page shell.
//!
//! The runtime only populates the page; the markup it expects ships as static
//! HTML with placeholder identity text, the way the page looks before any data
//! loads. A host may supply its own page instead.

use std::path::Path;

use anyhow::{Context, Result};

use crate::dom::Document;

pub const SHELL_HTML: &str = include_str!("../assets/index.html");

/// The bundled page.
pub fn document() -> Document {
    Document::parse(SHELL_HTML)
}

/// A host-provided page read from disk.
pub async fn from_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read page shell {}", path.display()))?;
    Ok(Document::parse(&html))
}
