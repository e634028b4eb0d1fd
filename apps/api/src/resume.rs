//! Resume ingestion — turns an uploaded file into plain text.
//!
//! PDFs are extracted with `pdf-extract` on the blocking pool; anything else
//! must be UTF-8 text.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("file is empty")]
    Empty,

    #[error("file is not valid UTF-8 text")]
    NotUtf8(#[from] std::string::FromUtf8Error),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("PDF extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// An uploaded resume as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeUpload {
    fn is_pdf(&self) -> bool {
        self.bytes.starts_with(PDF_MAGIC)
            || self.content_type.as_deref() == Some("application/pdf")
            || self
                .file_name
                .as_deref()
                .map(|n| n.to_ascii_lowercase().ends_with(".pdf"))
                .unwrap_or(false)
    }
}

/// Reads an uploaded resume to text. Whitespace-only results count as empty.
pub async fn read_resume_text(upload: ResumeUpload) -> Result<String, ResumeError> {
    if upload.bytes.is_empty() {
        return Err(ResumeError::Empty);
    }

    let text = if upload.is_pdf() {
        debug!("Extracting text from PDF resume ({} bytes)", upload.bytes.len());
        let bytes = upload.bytes;
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await?
            .map_err(|e| ResumeError::Pdf(e.to_string()))?
    } else {
        String::from_utf8(upload.bytes.to_vec())?
    };

    // Strip a UTF-8 BOM left by some editors.
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(ResumeError::Empty);
    }
    Ok(text.to_string())
}
