//! Résumé text extraction for question generation.
//!
//! Extraction never fails: missing or unreadable résumés degrade to sentinel
//! text so the prompt can still be built.

use tracing::warn;

/// No résumé was uploaded.
pub const NO_RESUME_TEXT: &str = "无简历内容";
/// The file parsed as a PDF but contained no extractable text (e.g. a scan).
pub const EMPTY_PDF_TEXT: &str = "无法从PDF中提取文本内容";
/// The file could not be read as a PDF nor as plain text.
pub const UNREADABLE_RESUME_TEXT: &str = "无法解析简历内容";

/// Extracts plain text from a stored résumé blob on the blocking pool.
pub async fn extract_resume_text(content: Option<Vec<u8>>) -> String {
    let bytes = match content {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return NO_RESUME_TEXT.to_string(),
    };

    match tokio::task::spawn_blocking(move || extract_blocking(&bytes)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Résumé extraction task failed: {e}");
            UNREADABLE_RESUME_TEXT.to_string()
        }
    }
}

fn extract_blocking(bytes: &[u8]) -> String {
    // pdf-extract panics on some malformed inputs; contain it to this résumé.
    let parsed = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

    match parsed {
        Ok(Ok(text)) if !text.trim().is_empty() => text,
        Ok(Ok(_)) => EMPTY_PDF_TEXT.to_string(),
        Ok(Err(e)) => {
            warn!("PDF extraction failed, falling back to plain text: {e}");
            decode_plain_text(bytes)
        }
        Err(_) => {
            warn!("PDF extraction panicked, falling back to plain text");
            decode_plain_text(bytes)
        }
    }
}

/// Treats the blob as UTF-8 text, dropping invalid byte sequences.
fn decode_plain_text(bytes: &[u8]) -> String {
    let text: String = String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect();

    if text.trim().is_empty() {
        UNREADABLE_RESUME_TEXT.to_string()
    } else {
        text
    }
}
