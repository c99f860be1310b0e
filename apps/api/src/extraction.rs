//! Text Extractor — converts one uploaded document into plain text.
//!
//! Format-specific, dispatched on the declared media type. Unsupported types
//! fail with a descriptive per-file error; they never abort the run.

use docx_rs::read_docx;

use crate::errors::StageError;
use crate::models::candidate::UploadedDocument;

pub const MEDIA_TYPE_TEXT: &str = "text/plain";
pub const MEDIA_TYPE_PDF: &str = "application/pdf";
pub const MEDIA_TYPE_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Extracts plain text from an uploaded document based on its declared media
/// type. Returns an error for unsupported formats and for documents that
/// yield no text at all (a blank resume cannot be parsed downstream).
pub fn extract_text(document: &UploadedDocument) -> Result<String, StageError> {
    let text = match document.media_type.as_str() {
        MEDIA_TYPE_TEXT => String::from_utf8(document.content.to_vec())
            .map_err(|e| StageError::Extraction(format!("invalid UTF-8 text file: {e}")))?,
        MEDIA_TYPE_PDF => extract_pdf(&document.content)?,
        MEDIA_TYPE_DOCX => extract_docx(&document.content)?,
        other => return Err(StageError::UnsupportedFormat(other.to_string())),
    };

    if text.trim().is_empty() {
        return Err(StageError::Extraction(format!(
            "no text could be extracted from '{}'",
            document.filename
        )));
    }

    Ok(text)
}

fn extract_pdf(content: &[u8]) -> Result<String, StageError> {
    pdf_extract::extract_text_from_mem(content)
        .map_err(|e| StageError::Extraction(format!("PDF extraction failed: {e}")))
}

/// Walks the docx paragraph tree and concatenates run text, one paragraph per
/// line.
fn extract_docx(content: &[u8]) -> Result<String, StageError> {
    let docx = read_docx(content)
        .map_err(|e| StageError::Extraction(format!("Word document extraction failed: {e}")))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}
