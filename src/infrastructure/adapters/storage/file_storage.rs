//! File Storage - 合成结果的文件系统存储
//!
//! 实现 OutputStoragePort trait，每次合成一个 `<uuid>.wav`，过期后由 `prune_expired` 清理

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{OutputStorageError, OutputStoragePort, StoredOutput};

/// 文件系统输出存储
pub struct FileOutputStorage {
    /// 存储根目录
    base_dir: PathBuf,
}

impl FileOutputStorage {
    /// 创建新的文件存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, OutputStorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| OutputStorageError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }

    /// 删除修改时间早于 `max_age` 的合成结果，返回删除数量
    pub async fn prune_expired(&self, max_age: Duration) -> Result<usize, OutputStorageError> {
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| OutputStorageError::IoError(e.to_string()))?;
        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| OutputStorageError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("wav") {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat output");
                    continue;
                }
            };
            if now.duration_since(modified).unwrap_or_default() < max_age {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove output")
                }
            }
        }

        Ok(removed)
    }
}

#[async_trait]
impl OutputStoragePort for FileOutputStorage {
    fn output_path(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.wav", id))
    }

    async fn save_output(&self, data: &[u8]) -> Result<StoredOutput, OutputStorageError> {
        let id = Uuid::new_v4();
        let path = self.output_path(id);

        fs::write(&path, data)
            .await
            .map_err(|e| OutputStorageError::IoError(e.to_string()))?;

        tracing::debug!(output_id = %id, size = data.len(), "Saved synthesized audio");

        Ok(StoredOutput {
            id,
            path,
            size_bytes: data.len() as u64,
        })
    }

    async fn read_output(&self, id: Uuid) -> Result<Vec<u8>, OutputStorageError> {
        match fs::read(self.output_path(id)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OutputStorageError::NotFound(id))
            }
            Err(e) => Err(OutputStorageError::IoError(e.to_string())),
        }
    }
}
