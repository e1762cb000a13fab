//! Document ingestion.
//!
//! Turns uploaded bytes into something a model can read: images are passed
//! through as base64, PDFs have their text layer extracted, everything else
//! is decoded as text.  Ingestion never fails; unreadable input becomes a
//! placeholder the extraction prompt can still reason about.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::llm::ImageContent;

/// Share of control characters above which decoded text is treated as
/// binary.
const MAX_CONTROL_RATIO: f64 = 0.3;

const PDF_MEDIA_TYPE: &str = "application/pdf";

/// An uploaded document in model-consumable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentContent {
    /// An image to embed as a content block.
    Image { media_type: String, base64: String },
    /// Text to place inline in the prompt.
    Text { text: String },
}

impl DocumentContent {
    /// The image payload, if this is an image.
    pub fn as_image(&self) -> Option<ImageContent> {
        match self {
            Self::Image { media_type, base64 } => Some(ImageContent {
                media_type: media_type.clone(),
                data: base64.clone(),
            }),
            Self::Text { .. } => None,
        }
    }

    /// Short description for logs and status replies.
    pub fn describe(&self) -> String {
        match self {
            Self::Image { media_type, base64 } => {
                format!("{media_type} image ({} base64 chars)", base64.len())
            }
            Self::Text { text } => format!("text ({} chars)", text.chars().count()),
        }
    }
}

/// Convert raw bytes with a declared media type.
pub fn ingest(bytes: &[u8], media_type: &str) -> DocumentContent {
    let media_type = media_type.trim().to_ascii_lowercase();

    if media_type.starts_with("image/") && !bytes.is_empty() {
        tracing::debug!(media_type = %media_type, bytes = bytes.len(), "ingested image");
        return DocumentContent::Image {
            base64: STANDARD.encode(bytes),
            media_type,
        };
    }

    if media_type == PDF_MEDIA_TYPE {
        if let Some(text) = pdf_text(bytes) {
            tracing::debug!(bytes = bytes.len(), chars = text.len(), "extracted pdf text");
            return DocumentContent::Text { text };
        }
    }

    let text = match decode_text(bytes) {
        Some(text) => text,
        None => {
            tracing::warn!(media_type = %media_type, bytes = bytes.len(), "document is not readable text");
            unreadable(&media_type, bytes.len())
        }
    };
    DocumentContent::Text { text }
}

/// Convert a base64 payload or a `data:<type>;base64,<data>` URL.
///
/// The media type inside a data URL is used when `media_type` is empty.
pub fn ingest_encoded(payload: &str, media_type: &str) -> DocumentContent {
    let payload = payload.trim();
    let (declared, data) = match parse_data_url(payload) {
        Some((url_type, data)) if media_type.trim().is_empty() => (url_type.to_owned(), data),
        Some((_, data)) => (media_type.to_owned(), data),
        None => (media_type.to_owned(), payload),
    };

    match STANDARD.decode(data) {
        Ok(bytes) => ingest(&bytes, &declared),
        Err(e) => {
            tracing::warn!(media_type = %declared, error = %e, "payload is not valid base64");
            DocumentContent::Text {
                text: unreadable(&declared.trim().to_ascii_lowercase(), data.len()),
            }
        }
    }
}

fn parse_data_url(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let media_type = meta.strip_suffix(";base64")?;
    Some((media_type, data))
}

/// Text layer of a PDF, one block per page.
///
/// `None` when the file cannot be parsed or carries no text (a scanned
/// page with no text layer).
fn pdf_text(bytes: &[u8]) -> Option<String> {
    let pages = match std::panic::catch_unwind(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "pdf text extraction failed");
            return None;
        }
        Err(_) => {
            tracing::warn!("pdf text extraction panicked");
            return None;
        }
    };

    let text = pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    if text.is_empty() {
        tracing::warn!(pages = pages.len(), "pdf has no text layer");
        return None;
    }
    Some(text)
}

fn decode_text(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).ok()?;

    let total = text.chars().count();
    if total == 0 {
        return None;
    }
    let control = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    if control as f64 / total as f64 > MAX_CONTROL_RATIO {
        return None;
    }
    Some(text.to_owned())
}

fn unreadable(media_type: &str, len: usize) -> String {
    let media_type = if media_type.is_empty() {
        "unknown type"
    } else {
        media_type
    };
    format!("[Unreadable document: {media_type}, {len} bytes]")
}
