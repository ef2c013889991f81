/*!
 * Tests for file utilities
 */

use std::path::PathBuf;

use officetrans::errors::DocumentError;
use officetrans::file_utils::FileManager;

use crate::common;

#[test]
fn test_generateOutputPath_withPlainDocument_shouldInsertLanguage() {
    let out = FileManager::generate_output_path("/data/plan.docx", "/data", "ja");
    assert_eq!(out, PathBuf::from("/data/plan.ja.docx"));

    let out = FileManager::generate_output_path("/data/README", "/out", "ja");
    assert_eq!(out, PathBuf::from("/out/README.ja"));
}

#[test]
fn test_findDocuments_shouldWalkTreeAndSkipUnsupported() {
    let dir = common::create_temp_dir().unwrap();
    let nested = dir.path().join("q1").join("sales");
    FileManager::ensure_dir(&nested).unwrap();
    common::create_test_file(dir.path(), "a.xlsx.json", "{}").unwrap();
    common::create_test_file(&nested, "b.pptx", "").unwrap();
    common::create_test_file(&nested, "notes.txt", "hello").unwrap();

    let documents = FileManager::find_documents(dir.path()).unwrap();

    assert_eq!(documents.len(), 2);
    assert!(documents.iter().all(|p| !p.ends_with("notes.txt")));
}

#[test]
fn test_validateInput_shouldEnforceSizeLimit() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("big.pdf");
    std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

    assert!(matches!(FileManager::validate_input(&path, 1), Err(DocumentError::TooLarge { .. })));
    assert!(FileManager::validate_input(&path, 5).is_ok());
    assert!(FileManager::validate_input(dir.path(), 5).is_err());
    assert!(FileManager::validate_input(dir.path().join("missing.pdf"), 5).is_err());
}

#[test]
fn test_writeAtomic_shouldReplaceContentAndCreateParents() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("out").join("doc.json");

    FileManager::write_atomic(&path, b"first").unwrap();
    FileManager::write_atomic(&path, b"second").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
    assert_eq!(leftovers, 1);
}
