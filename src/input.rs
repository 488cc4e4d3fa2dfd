//! Input validation: turns "text or document" into one content string.
//!
//! A request must carry exactly one of a raw email body or a PDF upload.
//! Whatever it carries comes out as a trimmed, non-empty string; every
//! rejection is an `InvalidInput` with a message fit for the client.

use thiserror::Error;

use crate::extract::{ExtractError, extract_pdf_text};

/// Media types accepted for document uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["application/pdf"];

/// Largest accepted document upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A client-caused input rejection.
#[derive(Debug, Error)]
pub enum InvalidInput {
    #[error("Either email_text or file must be provided")]
    Missing,

    #[error("Provide either email_text or file, not both")]
    Ambiguous,

    #[error("email_text cannot be empty")]
    EmptyText,

    #[error("Invalid file type{}. Allowed: {}", found_suffix(.found), ALLOWED_CONTENT_TYPES.join(", "))]
    UnsupportedMediaType { found: Option<String> },

    #[error("File too large. Maximum size: {}MB", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge { size: usize },

    #[error("{0}")]
    Document(#[from] ExtractError),
}

fn found_suffix(found: &Option<String>) -> String {
    match found {
        Some(ct) => format!(" '{ct}'"),
        None => String::new(),
    }
}

/// An uploaded document as received from the transport.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: None,
            content_type: Some(content_type.into()),
            bytes,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Validate the request shape and produce the email content.
///
/// Forms submit an empty text input next to the file input, so an empty
/// `email_text` is ignored when a document is present. Whitespace-only text
/// plus a document is still ambiguous.
pub fn validate_and_extract(
    email_text: Option<&str>,
    document: Option<&DocumentUpload>,
) -> Result<String, InvalidInput> {
    let email_text = email_text.filter(|text| document.is_none() || !text.is_empty());

    match (email_text, document) {
        (None, None) => Err(InvalidInput::Missing),
        (Some(_), Some(_)) => Err(InvalidInput::Ambiguous),
        (Some(text), None) => {
            let content = text.trim();
            if content.is_empty() {
                return Err(InvalidInput::EmptyText);
            }
            Ok(content.to_string())
        }
        (None, Some(upload)) => extract_document(upload),
    }
}

fn extract_document(upload: &DocumentUpload) -> Result<String, InvalidInput> {
    let media_type = upload
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

    let allowed = media_type
        .as_deref()
        .is_some_and(|mt| ALLOWED_CONTENT_TYPES.contains(&mt));
    if !allowed {
        return Err(InvalidInput::UnsupportedMediaType {
            found: upload.content_type.clone(),
        });
    }

    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(InvalidInput::TooLarge {
            size: upload.bytes.len(),
        });
    }

    let text = extract_pdf_text(&upload.bytes)?;
    let content = text.trim();
    if content.is_empty() {
        return Err(ExtractError::NoExtractableText.into());
    }

    tracing::debug!(
        filename = upload.filename.as_deref().unwrap_or("<unnamed>"),
        chars = content.chars().count(),
        "Extracted email text from document"
    );
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::pdf_with_pages;

    #[test]
    fn neither_input_is_missing() {
        assert!(matches!(
            validate_and_extract(None, None),
            Err(InvalidInput::Missing)
        ));
    }

    #[test]
    fn both_inputs_are_ambiguous() {
        let upload = DocumentUpload::new("application/pdf", pdf_with_pages(&["hello"]));
        assert!(matches!(
            validate_and_extract(Some("hello"), Some(&upload)),
            Err(InvalidInput::Ambiguous)
        ));
        assert!(matches!(
            validate_and_extract(Some("  "), Some(&upload)),
            Err(InvalidInput::Ambiguous)
        ));
    }

    #[test]
    fn empty_text_beside_document_is_ignored() {
        let upload = DocumentUpload::new("application/pdf", pdf_with_pages(&["Send the invoice"]));
        let content = validate_and_extract(Some(""), Some(&upload)).unwrap();
        assert!(content.contains("invoice"));
    }

    #[test]
    fn whitespace_text_is_empty() {
        assert!(matches!(
            validate_and_extract(Some("  \n\t "), None),
            Err(InvalidInput::EmptyText)
        ));
        assert!(matches!(
            validate_and_extract(Some(""), None),
            Err(InvalidInput::EmptyText)
        ));
    }

    #[test]
    fn text_is_trimmed() {
        let content = validate_and_extract(Some("  Qual o status do meu pedido?\n"), None).unwrap();
        assert_eq!(content, "Qual o status do meu pedido?");
    }

    #[test]
    fn wrong_media_type_rejected() {
        let upload = DocumentUpload::new("image/png", vec![0x89, b'P', b'N', b'G']);
        let err = validate_and_extract(None, Some(&upload)).unwrap_err();
        assert!(matches!(err, InvalidInput::UnsupportedMediaType { .. }));
        let msg = err.to_string();
        assert!(msg.contains("image/png"));
        assert!(msg.contains("application/pdf"));
    }

    #[test]
    fn missing_media_type_rejected() {
        let upload = DocumentUpload {
            filename: Some("mail.pdf".into()),
            content_type: None,
            bytes: pdf_with_pages(&["hello"]),
        };
        assert!(matches!(
            validate_and_extract(None, Some(&upload)),
            Err(InvalidInput::UnsupportedMediaType { found: None })
        ));
    }

    #[test]
    fn oversized_document_rejected_before_extraction() {
        // Not a PDF at all: if extraction ran, this would be UnreadableDocument.
        let upload = DocumentUpload::new("application/pdf", vec![0u8; MAX_UPLOAD_BYTES + 1]);
        let err = validate_and_extract(None, Some(&upload)).unwrap_err();
        assert!(matches!(err, InvalidInput::TooLarge { .. }));
        assert_eq!(err.to_string(), "File too large. Maximum size: 10MB");
    }

    #[test]
    fn extractor_failures_keep_their_message() {
        let upload = DocumentUpload::new("application/pdf", pdf_with_pages(&[]));
        let err = validate_and_extract(None, Some(&upload)).unwrap_err();
        assert!(matches!(err, InvalidInput::Document(ExtractError::EmptyDocument)));
        assert_eq!(err.to_string(), "PDF has no pages");
    }

    #[test]
    fn media_type_parameters_are_ignored() {
        let upload = DocumentUpload::new(
            "Application/PDF; charset=binary",
            pdf_with_pages(&["Please send the invoice"]),
        )
        .with_filename("mail.pdf");
        let content = validate_and_extract(None, Some(&upload)).unwrap();
        assert!(content.contains("invoice"));
        assert_eq!(content, content.trim());
    }
}
