use std::path::Path;

use crate::error::ExtractError;
use crate::model::{PageContent, TableGrid};

/// A decoded, page-addressable document.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    fn page_text(&self, index: usize) -> Result<String, ExtractError>;

    fn page_tables(&self, index: usize) -> Result<Vec<TableGrid>, ExtractError>;

    fn page(&self, index: usize) -> Result<PageContent, ExtractError> {
        Ok(PageContent {
            index,
            text: self.page_text(index)?,
            tables: self.page_tables(index)?,
        })
    }
}

/// Opens documents for the batch; failures are reported per document.
pub trait DocumentSource {
    type Document: PdfDocument;

    fn open(&self, path: &Path) -> Result<Self::Document, ExtractError>;
}

/// Pages that were already extracted elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    pages: Vec<PageContent>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new(pages: Vec<PageContent>) -> Self {
        Self { pages }
    }

    fn get(&self, index: usize) -> Result<&PageContent, ExtractError> {
        self.pages.get(index).ok_or(ExtractError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}

impl PdfDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        Ok(self.get(index)?.text.clone())
    }

    fn page_tables(&self, index: usize) -> Result<Vec<TableGrid>, ExtractError> {
        Ok(self.get(index)?.tables.clone())
    }

    fn page(&self, index: usize) -> Result<PageContent, ExtractError> {
        self.get(index).cloned()
    }
}
