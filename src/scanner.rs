use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, StoryError};

/// Page separator emitted by `pdftotext` and similar converters.
const FORM_FEED: char = '\x0c';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    /// Plain text, pages separated by form feeds
    Text,
}

/// A source document discovered in the input directory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name, used as `source_id` in every record and citation
    pub source_id: String,
    pub kind: DocumentKind,
    pub path: PathBuf,
}

impl SourceDocument {
    /// Read the document as a list of page texts, index 0 = page 1.
    ///
    /// Pages without text (scanned images, blank pages) come back as empty
    /// strings so that page numbering is preserved.
    pub fn pages(&self) -> Result<Vec<String>> {
        match self.kind {
            DocumentKind::Pdf => {
                let bytes = fs::read(&self.path).map_err(|e| StoryError::io(&self.path, e))?;
                pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| StoryError::Pdf {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
            DocumentKind::Text => {
                let content =
                    fs::read_to_string(&self.path).map_err(|e| StoryError::io(&self.path, e))?;
                Ok(split_pages(&content))
            }
        }
    }
}

/// Scan the input directory (non-recursive) for PDF and text documents.
///
/// Results are sorted by file name so that extraction order, and therefore
/// every downstream tie-break, is reproducible.
pub fn scan_documents(root: &Path) -> Vec<SourceDocument> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.path().to_path_buf();
            let kind = document_kind(&path)?;
            let source_id = path.file_name()?.to_str()?.to_string();
            Some(SourceDocument {
                source_id,
                kind,
                path,
            })
        })
        .collect()
}

fn document_kind(path: &Path) -> Option<DocumentKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(DocumentKind::Pdf),
        "txt" => Some(DocumentKind::Text),
        _ => None,
    }
}

/// Split form-feed separated text into pages.
fn split_pages(content: &str) -> Vec<String> {
    let mut pages: Vec<String> = content.split(FORM_FEED).map(str::to_string).collect();
    // pdftotext terminates the last page with a form feed too
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
