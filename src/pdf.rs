use std::path::Path;

use anyhow::{Context, Result};

/// Plain text of every page, in document order.
pub fn read_text(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from {}", path.display()))
}
