//! Local filesystem storage adapter. Uploaded artifacts land under the
//! configured root and are addressed by `file://` URL.

use async_trait::async_trait;
use std::path::PathBuf;

use opsflow_core::error::OpsFlowError;
use opsflow_core::traits::StorageAdapter;
use opsflow_core::types::ArtifactFile;
use opsflow_core::Result;

pub struct LocalStorageAdapter {
    root: PathBuf,
}

impl LocalStorageAdapter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl StorageAdapter for LocalStorageAdapter {
    async fn upload(&self, file: &ArtifactFile) -> Result<String> {
        let dir = match &file.folder {
            Some(folder) => self.root.join(folder),
            None => self.root.clone(),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Storage mkdir: {e}")))?;

        let path = dir.join(&file.filename);
        tokio::fs::write(&path, &file.content)
            .await
            .map_err(|e| OpsFlowError::Adapter(format!("Storage write: {e}")))?;

        let absolute = path
            .canonicalize()
            .map_err(|e| OpsFlowError::Adapter(format!("Storage path: {e}")))?;
        let url = format!("file://{}", absolute.display());
        tracing::info!(filename = %file.filename, %url, "artifact stored");
        Ok(url)
    }
}
