/*!
 * Document access.
 *
 * The core only needs to open a document into memory and save it back.
 * `JsonDocumentStore` persists the structured model as a JSON snapshot and
 * writes atomically so a failed save never leaves a truncated file behind.
 */

use std::path::Path;
use log::debug;

use super::{Document, DocumentFormat};
use crate::errors::DocumentError;
use crate::file_utils::FileManager;

/// Loads and persists documents
pub trait DocumentStore: Send + Sync {
    /// Read a document into memory
    fn open(&self, path: &Path) -> Result<Document, DocumentError>;

    /// Persist a document
    fn save(&self, document: &Document, path: &Path) -> Result<(), DocumentError>;
}

/// Store backed by JSON snapshots of the document model
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentStore {
    /// Reject files above this size, in megabytes
    pub max_file_size_mb: Option<u64>,
}

impl JsonDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size_limit(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb: Some(max_file_size_mb) }
    }
}

impl DocumentStore for JsonDocumentStore {
    fn open(&self, path: &Path) -> Result<Document, DocumentError> {
        let expected = DocumentFormat::from_path(path)
            .ok_or_else(|| DocumentError::UnsupportedFormat(path.display().to_string()))?;
        if let Some(limit) = self.max_file_size_mb {
            FileManager::validate_input(path, limit)?;
        }

        let content = std::fs::read(path)?;
        let document: Document =
            serde_json::from_slice(&content).map_err(|e| DocumentError::Parse(e.to_string()))?;

        if document.format() != expected {
            return Err(DocumentError::KindMismatch {
                expected: expected.name(),
                found: document.format().name(),
            });
        }
        debug!("Opened {} document {:?}", expected, path);
        Ok(document)
    }

    fn save(&self, document: &Document, path: &Path) -> Result<(), DocumentError> {
        let content = serde_json::to_vec_pretty(document).map_err(|e| DocumentError::Parse(e.to_string()))?;
        FileManager::write_atomic(path, &content)?;
        Ok(())
    }
}
