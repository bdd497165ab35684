use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::info;

use crate::error::AppError;

/// Stores uploaded image payloads in the content directory under
/// collision-resistant generated names.
///
/// No MIME, size or dimension checks happen here: whatever bytes the form
/// carried are written verbatim. A file written here is not rolled back if
/// the SQL statement that should reference it fails afterwards.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        UploadStore { dir: dir.into() }
    }

    /// Create the content directory if it does not exist yet.
    pub async fn init(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        info!("Upload directory ready at {}", self.dir.display());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one uploaded payload to disk and return the generated filename
    /// the post record should store.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String, AppError> {
        let filename = generate_filename(original_name);
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, data).await?;

        info!(
            "Stored upload '{}' as {} ({} bytes)",
            original_name,
            filename,
            data.len()
        );
        Ok(filename)
    }
}

/// Generate a stored filename as `<unix-millis>-<random-suffix><ext>`,
/// keeping the original extension (dot included) when there is one.
pub fn generate_filename(original_name: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    format!("{}-{}{}", timestamp, suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_filename_keeps_extension() {
        let name = generate_filename("cat.png");
        assert!(name.ends_with(".png"));

        let name = generate_filename("archive.tar.gz");
        assert!(name.ends_with(".gz"));
    }

    #[test]
    fn test_generated_filename_without_extension() {
        let name = generate_filename("README");
        assert!(!name.contains('.'));
        assert!(name.contains('-'));
    }

    #[test]
    fn test_generated_filenames_are_distinct() {
        let mut names: Vec<String> = (0..50).map(|_| generate_filename("a.jpg")).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 50);
    }

    #[tokio::test]
    async fn test_save_writes_bytes_under_generated_name() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let store = UploadStore::new(tmp.path());
        store.init().await.expect("Failed to init upload dir");

        let filename = store
            .save("photo.jpeg", b"not really a jpeg")
            .await
            .expect("Failed to save upload");

        assert!(filename.ends_with(".jpeg"));
        let written = std::fs::read(tmp.path().join(&filename)).expect("File missing");
        assert_eq!(written, b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_init_creates_nested_directory() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let nested = tmp.path().join("content").join("uploads");
        let store = UploadStore::new(&nested);

        store.init().await.expect("Failed to init upload dir");
        assert!(nested.is_dir());
    }
}
