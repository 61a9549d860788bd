//! Source file parsing and text extraction.

use crate::types::Document;
use ragchat_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Pdf,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("pdf") => Self::Pdf,
            Some("txt") | Some("text") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse a source file into a [`Document`] of plain text.
///
/// Missing, unreadable, binary or unparseable files fail with
/// [`AppError::Ingestion`].
pub fn parse_file(path: &Path) -> AppResult<Document> {
    let content_type = ContentType::from_path(path);

    let text = match content_type {
        ContentType::Pdf => extract_pdf(path)?,
        ContentType::Markdown => clean_markdown(&read_text(path)?),
        ContentType::Html => clean_html(&read_text(path)?),
        ContentType::PlainText => read_text(path)?,
        ContentType::Unknown => {
            let raw = read_text(path)?;
            if !is_likely_text(&raw) {
                tracing::warn!("Skipping likely binary file: {:?}", path);
                return Err(AppError::Ingestion(format!(
                    "Binary file not supported: {:?}",
                    path
                )));
            }
            raw
        }
    };

    Ok(Document {
        source_id: path.display().to_string(),
        content_type: content_type.as_str().to_string(),
        text,
    })
}

fn read_text(path: &Path) -> AppResult<String> {
    fs::read_to_string(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))
}

fn extract_pdf(path: &Path) -> AppResult<String> {
    let bytes =
        fs::read(path).map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

    pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| AppError::Ingestion(format!("Failed to parse PDF {:?}: {}", path, e)))
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        // Remove markdown headers
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags, scripts and styles.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;
            // Tags separate words
            result.push(' ');

            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    // Collapse whitespace
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

/// Check if text is likely text rather than binary.
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}
