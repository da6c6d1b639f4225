//! Per-request staging of uploaded files.

use crate::error::Result;
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Extension used when the uploaded filename has no usable one.
const FALLBACK_EXTENSION: &str = "wav";

/// An upload written to a unique file under the uploads directory.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `bytes` to a fresh file in `dir`, keeping the original extension.
    pub async fn write(
        dir: &Path,
        request_id: Uuid,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<Self> {
        let suffix = format!(".{}", extension_of(original_name));
        let file = tempfile::Builder::new()
            .prefix(&format!("{}-", request_id))
            .suffix(&suffix)
            .tempfile_in(dir)?;

        tokio::fs::write(file.path(), bytes).await?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("song.MP3"), "mp3");
        assert_eq!(extension_of("recorded_audio.wav"), "wav");
        assert_eq!(extension_of("blob"), "wav");
        assert_eq!(extension_of("weird.ex$t"), "wav");
        assert_eq!(extension_of("../../etc/passwd"), "wav");
    }

    #[tokio::test]
    async fn test_staged_files_are_unique_and_removed() {
        let dir = tempfile::tempdir().unwrap();

        let a = StagedUpload::write(dir.path(), Uuid::new_v4(), "clip.wav", b"first")
            .await
            .unwrap();
        let b = StagedUpload::write(dir.path(), Uuid::new_v4(), "clip.wav", b"second")
            .await
            .unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"second");

        let path = a.path().to_path_buf();
        drop(a);
        assert!(!path.exists());
        assert!(b.path().exists());
    }
}
