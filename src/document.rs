use log::{debug, info, warn};
use mime_guess::from_path;
use pdf_extract::extract_text;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::LoadError;

/// Page separator emitted by PDF text extraction
const PAGE_BREAK: char = '\u{c}';

/// Where a piece of text came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    /// File name of the source document
    pub source: String,
    /// 1-based page number
    pub page: usize,
}

impl Provenance {
    /// Identifier reported to API callers in `sources`
    pub fn id(&self) -> String {
        self.page.to_string()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {})", self.source, self.page)
    }
}

/// A page worth of extracted text
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub provenance: Provenance,
}

/// Represents a loaded document split into pages
#[derive(Debug, Clone)]
pub struct Document {
    /// The document's file name (used as document ID)
    pub document_id: String,
    /// The document's MIME type
    pub mime_type: String,
    /// Non-blank pages in document order
    pub segments: Vec<Segment>,
}

impl Document {
    /// Load a document from a file path
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self, LoadError> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        // Detect MIME type
        let mime_type = from_path(path).first_or_octet_stream().to_string();
        debug!("Detected MIME type: {}", mime_type);

        let content = read_document_content(path, &mime_type)?;
        let segments = split_pages(&content, &file_name);

        if segments.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        info!(
            "Loaded {} page(s) from {}",
            segments.len(),
            path.display()
        );

        Ok(Document {
            document_id: file_name,
            mime_type,
            segments,
        })
    }
}

/// Read raw content from a document based on its MIME type
pub fn read_document_content<P: AsRef<Path>>(
    file_path: P,
    mime_type: &str,
) -> Result<String, LoadError> {
    let path = file_path.as_ref();

    match mime_type {
        mime if mime.starts_with("application/pdf") => {
            info!("Processing PDF document: {}", path.display());
            extract_text(path).map_err(|e| LoadError::Pdf {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }

        mime if mime.starts_with("text/") => {
            info!("Processing text document: {}", path.display());
            fs::read_to_string(path).map_err(|source| LoadError::Read {
                path: path.to_path_buf(),
                source,
            })
        }

        _ => Err(LoadError::Unsupported {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
        }),
    }
}

/// Split raw content on page breaks into normalized, non-blank segments.
/// Page numbers follow the raw page order, so dropped blank pages leave gaps.
pub fn split_pages(content: &str, source: &str) -> Vec<Segment> {
    content
        .split(PAGE_BREAK)
        .enumerate()
        .filter_map(|(idx, page)| {
            let text = normalize_whitespace(page);
            if text.is_empty() {
                warn!("Skipping blank page {} of {}", idx + 1, source);
                return None;
            }
            Some(Segment {
                text,
                provenance: Provenance {
                    source: source.to_string(),
                    page: idx + 1,
                },
            })
        })
        .collect()
}

/// Normalize whitespace in text (remove multiple consecutive spaces, newlines, etc.)
fn normalize_whitespace(text: &str) -> String {
    let result = text.replace('\r', "");

    let mut prev_char = ' ';
    let mut newline_count = 0;
    let mut normalized = String::with_capacity(result.len());

    for c in result.chars() {
        if c == '\n' {
            newline_count += 1;
        } else {
            if newline_count > 0 {
                // Add at most two newlines (paragraph break)
                if newline_count >= 2 {
                    normalized.push_str("\n\n");
                } else {
                    normalized.push('\n');
                }
                newline_count = 0;
            }

            if !(c == ' ' && prev_char == ' ') {
                normalized.push(c);
            }

            prev_char = c;
        }
    }

    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_whitespace() {
        let text = "This  has   multiple    spaces.\n\n\nAnd multiple newlines.\r\nAnd Windows line endings.\n\n";
        let expected =
            "This has multiple spaces.\n\nAnd multiple newlines.\nAnd Windows line endings.";
        assert_eq!(normalize_whitespace(text), expected);
    }

    #[test]
    fn test_split_pages_numbers_from_one_and_skips_blank_pages() {
        let content = "Experience\nAcme Corp\u{c}   \n \u{c}Skills\nPython, Go";
        let segments = split_pages(content, "cv.txt");

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Experience\nAcme Corp");
        assert_eq!(segments[0].provenance.page, 1);
        assert_eq!(segments[1].text, "Skills\nPython, Go");
        assert_eq!(segments[1].provenance.page, 3);
        assert_eq!(segments[1].provenance.source, "cv.txt");
        assert_eq!(segments[1].provenance.id(), "3");
        assert_eq!(segments[1].provenance.to_string(), "cv.txt (page 3)");
    }

    #[test]
    fn test_from_file_reads_text_document() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Jane Doe\nBackend engineer\u{c}Skills\nRust, Python").unwrap();

        let document = Document::from_file(file.path()).unwrap();

        assert!(document.mime_type.starts_with("text/"));
        assert_eq!(document.segments.len(), 2);
        assert_eq!(document.segments[0].text, "Jane Doe\nBackend engineer");
        assert_eq!(document.segments[1].provenance.page, 2);
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = Document::from_file("/definitely/not/here/cv.pdf").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_from_file_rejects_unsupported_format() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let err = Document::from_file(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported { .. }));
    }

    #[test]
    fn test_from_file_rejects_blank_document() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "  \n\n \u{c}\n").unwrap();
        let err = Document::from_file(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[test]
    fn test_from_file_reports_corrupt_pdf() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "this is not a pdf").unwrap();
        let err = Document::from_file(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Pdf { .. }));
    }
}
