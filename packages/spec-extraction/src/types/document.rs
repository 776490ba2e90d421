//! PDF documents handed to the extraction strategies.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ExtractionError, Result};

/// Document info dictionary entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

/// An in-memory PDF with its content hash and structural metadata.
///
/// Cheap to clone; the bytes are shared.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    bytes: Arc<[u8]>,

    /// Where the document came from (URL or path)
    pub source: String,

    /// Lowercase hex SHA-256 of the bytes
    pub sha256: String,

    /// Page count, 0 when the structure could not be parsed
    pub page_count: usize,

    pub metadata: PdfMetadata,
}

impl PdfDocument {
    /// Wrap raw bytes.
    ///
    /// Only the `%PDF-` header is mandatory. A broken cross-reference table
    /// leaves `page_count` at 0 and lets each strategy decide for itself.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, source: impl Into<String>) -> Result<Self> {
        let bytes: Vec<u8> = bytes.into();
        let source = source.into();

        if !looks_like_pdf(&bytes) {
            return Err(ExtractionError::InvalidDocument {
                reason: format!("{} does not start with %PDF-", source),
            });
        }

        let sha256 = format!("{:x}", Sha256::digest(&bytes));

        let (page_count, metadata) = match lopdf::Document::load_mem(&bytes) {
            Ok(doc) => (doc.get_pages().len(), read_metadata(&doc)),
            Err(e) => {
                debug!(source = %source, error = %e, "PDF structure unreadable, continuing without metadata");
                (0, PdfMetadata::default())
            }
        };

        Ok(Self {
            bytes: Arc::from(bytes),
            source,
            sha256,
            page_count,
            metadata,
        })
    }

    /// Read a PDF from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes, path.display().to_string())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check the `%PDF-` magic, tolerating leading whitespace/BOM junk some servers prepend.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(1024)];
    window.windows(5).any(|w| w == b"%PDF-")
}

fn read_metadata(doc: &lopdf::Document) -> PdfMetadata {
    let info = match doc.trailer.get(b"Info") {
        Ok(lopdf::Object::Reference(id)) => doc.get_object(*id).ok(),
        Ok(obj) => Some(obj),
        Err(_) => None,
    };

    let Some(lopdf::Object::Dictionary(dict)) = info else {
        return PdfMetadata::default();
    };

    let get_string = |key: &[u8]| -> Option<String> {
        match dict.get(key).ok()? {
            lopdf::Object::String(bytes, _) => {
                let s = decode_pdf_string(bytes);
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            _ => None,
        }
    };

    PdfMetadata {
        title: get_string(b"Title"),
        author: get_string(b"Author"),
        subject: get_string(b"Subject"),
        keywords: get_string(b"Keywords"),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
