use std::path::{Path, PathBuf};

use crawler_ids::CollectionId;

/// A per-candidate scratch install directory: scoped acquisition with
/// guaranteed termination. Never shared between candidates; removed on
/// drop regardless of how the collection run ended.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub async fn provision(base_dir: &Path, collection_id: &CollectionId) -> std::io::Result<Self> {
        let path = base_dir.join(format!("crawl-{}", collection_id.as_str()));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provision_creates_and_drop_removes_directory() {
        let base = tempfile::tempdir().unwrap();
        let id = CollectionId::new();
        let path = {
            let scratch = ScratchDir::provision(base.path(), &id).await.unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
