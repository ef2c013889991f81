use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::document::DocumentFormat;
use crate::errors::DocumentError;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated document
    // @params: input_file, output_dir, target_language
    // `report.xlsx` becomes `report.fr.xlsx`; `deck.pptx.json` becomes `deck.fr.pptx.json`
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let file_name = input_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let (stem, extension) = match file_name.strip_suffix(".json") {
            Some(inner) => match inner.rsplit_once('.') {
                Some((stem, ext)) => (stem.to_string(), format!("{}.json", ext)),
                None => (inner.to_string(), "json".to_string()),
            },
            None => match file_name.rsplit_once('.') {
                Some((stem, ext)) => (stem.to_string(), ext.to_string()),
                None => (file_name.clone(), String::new()),
            },
        };

        let mut output_filename = format!("{}.{}", stem, target_language);
        if !extension.is_empty() {
            output_filename.push('.');
            output_filename.push_str(&extension);
        }

        output_dir.as_ref().join(output_filename)
    }

    /// Find every supported document below a directory
    pub fn find_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && DocumentFormat::from_path(path).is_some() {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    // @checks: Input is an existing regular file within the size limit
    pub fn validate_input<P: AsRef<Path>>(path: P, max_size_mb: u64) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(DocumentError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }

        let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
        if size_mb > max_size_mb as f64 {
            return Err(DocumentError::TooLarge { size_mb, limit_mb: max_size_mb });
        }
        Ok(())
    }

    /// Write bytes through a temp file in the same directory, then rename over
    /// the target, so readers never observe a half-written file
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> std::io::Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(())
    }
}
