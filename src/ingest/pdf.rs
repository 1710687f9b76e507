//! PDF text extraction.
//!
//! Extracts per-page text using `lopdf`. Each page becomes a [`PageText`]
//! labelled with its 1-based page number, matching the `page_label`
//! metadata that vector tools filter on.

use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;

use memmap2::Mmap;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::IngestError;

/// Text of a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number as a string.
    pub label: String,
    /// Extracted, whitespace-normalised text.
    pub text: String,
}

/// Loads a PDF and extracts the text of every page.
///
/// Pages whose text cannot be extracted are skipped with a warning. Pages
/// with no text are dropped.
///
/// # Errors
///
/// Returns [`IngestError::Read`] if the file cannot be opened,
/// [`IngestError::PdfParse`] if it is not a readable PDF, and
/// [`IngestError::Empty`] if no page yields any text.
pub fn load_pages(path: &Path) -> Result<Vec<PageText>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // SAFETY: the mapping is read-only and does not outlive this function.
    #[allow(unsafe_code)]
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let doc = lopdf::Document::load_mem(&mmap[..]).map_err(|e| IngestError::PdfParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(path = %path.display(), page_count = page_numbers.len(), "extracting PDF text");

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page_num in page_numbers {
        match doc.extract_text(&[page_num]) {
            Ok(raw) => {
                let text = clean_text(&raw);
                if !text.is_empty() {
                    pages.push(PageText {
                        label: page_num.to_string(),
                        text,
                    });
                }
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "failed to extract text from page, skipping");
            }
        }
    }

    if pages.is_empty() {
        return Err(IngestError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(pages)
}

/// A word broken by a hyphen at the end of a line.
static LINE_HYPHEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\p{L})-[ \t]*\r?\n\s*(\p{Ll})").ok());

/// Rejoins line-broken words, collapses runs of whitespace and strips
/// byte-order marks.
fn clean_text(text: &str) -> String {
    let text = text.replace('\u{FEFF}', "");
    let joined = match LINE_HYPHEN.as_ref() {
        Some(re) => re.replace_all(&text, "$1$2"),
        None => text.as_str().into(),
    };
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Hello   World\n\nTest"), "Hello World Test");
        assert_eq!(clean_text("\u{FEFF}Title"), "Title");
        assert_eq!(clean_text("  \n\t "), "");
    }

    #[test]
    fn test_clean_text_rejoins_hyphenated_words() {
        assert_eq!(clean_text("evalu-\nation results"), "evaluation results");
        assert_eq!(clean_text("multi-\n  agent"), "multiagent");
        // Hyphens inside a line and before capitals are kept
        assert_eq!(clean_text("multi-agent Meta-\nGPT"), "multi-agent Meta- GPT");
    }

    #[test]
    fn test_load_pages_not_a_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|_| unreachable!());
        file.write_all(b"plain text, not a PDF")
            .unwrap_or_else(|_| unreachable!());
        let result = load_pages(file.path());
        assert!(matches!(result, Err(IngestError::PdfParse { .. })));
    }

    #[test]
    fn test_load_pages_missing_file() {
        let result = load_pages(Path::new("/no/such/file.pdf"));
        assert!(matches!(result, Err(IngestError::Read { .. })));
    }
}
