use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Reads OCR output from a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.base_path.join(prefix);
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                files.push(Path::new(prefix).join(name).to_string_lossy().into_owned());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_files_is_sorted_and_relative() {
        let temp_dir = TempDir::new().unwrap();
        let ocr_dir = temp_dir.path().join("ocr");
        std::fs::create_dir_all(ocr_dir.join("nested")).unwrap();
        std::fs::write(ocr_dir.join("output-21-to-40.json"), b"{}").unwrap();
        std::fs::write(ocr_dir.join("output-1-to-20.json"), b"{}").unwrap();

        let storage = LocalStorage::new(temp_dir.path());
        let files = storage.list_files("ocr").await.unwrap();

        assert_eq!(
            files,
            vec![
                Path::new("ocr").join("output-1-to-20.json").to_string_lossy().into_owned(),
                Path::new("ocr").join("output-21-to-40.json").to_string_lossy().into_owned(),
            ]
        );

        let data = storage.read_file(&files[0]).await.unwrap();
        assert_eq!(data, b"{}");
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let err = storage.list_files("missing").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::RagError::IoError(_)));
    }
}
