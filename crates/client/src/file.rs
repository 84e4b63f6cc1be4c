//! Files queued for upload.

use std::path::Path;

use bytes::Bytes;
use docket_shared::upload::FileDescriptor;

use crate::error::ClientError;

/// One file held in memory for upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    /// Name sent to the server.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// Contents.
    pub data: Bytes,
}

impl LocalFile {
    /// File from in-memory bytes.
    #[must_use]
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
            data,
        }
    }

    /// Reads `path`, naming the file after its last component.
    pub async fn read(path: &Path) -> Result<Self, ClientError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned());
        let file_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(file_name, file_type, Bytes::from(data)))
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// What the presign request says about this file.
    #[must_use]
    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor {
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
            file_size: self.size(),
        }
    }
}

/// Sum of sizes, saturating.
#[must_use]
pub fn batch_size(files: &[LocalFile]) -> u64 {
    files.iter().fold(0u64, |acc, f| acc.saturating_add(f.size()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.PDF", "application/pdf")]
    #[case("scan.jpeg", "image/jpeg")]
    #[case("deck.pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation")]
    #[case("notes", "application/octet-stream")]
    #[case("archive.tar.zip", "application/zip")]
    #[tokio::test]
    async fn test_read_guesses_type_from_extension(#[case] name: &str, #[case] expected: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        tokio::fs::write(&path, b"x").await.unwrap();

        let file = LocalFile::read(&path).await.unwrap();
        assert_eq!(file.file_type, expected);
    }

    #[tokio::test]
    async fn test_read_names_file_after_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        let file = LocalFile::read(&path).await.unwrap();
        assert_eq!(file.file_name, "invoice.pdf");
        assert_eq!(file.file_type, "application/pdf");
        assert_eq!(file.size(), 8);
    }
}
