//! Document ingestion: PDF page extraction and sentence-aware splitting.
//!
//! ```text
//! Document (PDF path)
//!   ├── pdf::load_pages     → Vec<PageText> (one per page, with page label)
//!   └── SentenceSplitter    → Vec<Node> (chunked per page, metadata attached)
//! ```

pub mod pdf;
pub mod splitter;

pub use pdf::{PageText, load_pages};
pub use splitter::{SentenceSplitter, estimate_tokens};

use tracing::debug;

use crate::core::{Document, FILE_NAME_KEY, FILE_PATH_KEY, Node, PAGE_LABEL_KEY};
use crate::error::IngestError;

/// Reads a PDF and splits every page into nodes.
///
/// Node ids are `{doc}-p{page}-{n}`; each node carries the page label,
/// file name and file path of its source.
pub fn load_document_nodes(
    document: &Document,
    splitter: &SentenceSplitter,
) -> Result<Vec<Node>, IngestError> {
    let pages = load_pages(document.path())?;
    let nodes = nodes_from_pages(document, &pages, splitter);
    debug!(
        document = document.name(),
        pages = pages.len(),
        nodes = nodes.len(),
        "document split into nodes"
    );
    Ok(nodes)
}

/// Splits already-extracted pages into nodes.
pub fn nodes_from_pages(
    document: &Document,
    pages: &[PageText],
    splitter: &SentenceSplitter,
) -> Vec<Node> {
    let file_name = document.file_name();
    let file_path = document.path().to_string_lossy().into_owned();

    pages
        .iter()
        .flat_map(|page| {
            splitter
                .split_text(&page.text)
                .into_iter()
                .enumerate()
                .map(|(n, text)| {
                    Node::new(format!("{}-p{}-{n}", document.name(), page.label), text)
                        .with_metadata(PAGE_LABEL_KEY, page.label.clone())
                        .with_metadata(FILE_NAME_KEY, file_name.clone())
                        .with_metadata(FILE_PATH_KEY, file_path.clone())
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_from_pages_metadata() {
        let doc = Document::new("data/metagpt.pdf");
        let pages = vec![
            PageText {
                label: "1".to_string(),
                text: "MetaGPT is a multi-agent framework.".to_string(),
            },
            PageText {
                label: "2".to_string(),
                text: "It encodes SOPs into prompts.".to_string(),
            },
        ];
        let nodes = nodes_from_pages(&doc, &pages, &SentenceSplitter::default());
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "metagpt-p1-0");
        assert_eq!(nodes[1].page_label(), Some("2"));
        assert_eq!(
            nodes[0].metadata.get(FILE_NAME_KEY).map(String::as_str),
            Some("metagpt.pdf")
        );
        assert_eq!(
            nodes[0].metadata.get(FILE_PATH_KEY).map(String::as_str),
            Some("data/metagpt.pdf")
        );
    }

    #[test]
    fn test_nodes_from_pages_chunks_long_page() {
        let doc = Document::new("long.pdf");
        let pages = vec![PageText {
            label: "7".to_string(),
            text: "A sentence about evaluation datasets. ".repeat(200),
        }];
        let splitter = SentenceSplitter::new(64, 8);
        let nodes = nodes_from_pages(&doc, &pages, &splitter);
        assert!(nodes.len() > 1);
        assert!(nodes.iter().all(|n| n.page_label() == Some("7")));
        assert_eq!(nodes[1].id, "long-p7-1");
    }

    #[test]
    fn test_load_document_nodes_missing_file() {
        let doc = Document::new("/definitely/not/here.pdf");
        let result = load_document_nodes(&doc, &SentenceSplitter::default());
        assert!(matches!(result, Err(IngestError::Read { .. })));
    }
}
