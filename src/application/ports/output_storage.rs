//! Output Storage Port - 出站端口
//!
//! 合成结果（临时输出文件）的存储抽象

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// 输出存储错误
#[derive(Debug, Error)]
pub enum OutputStorageError {
    #[error("Output not found: {0}")]
    NotFound(Uuid),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 已保存的输出
#[derive(Debug, Clone)]
pub struct StoredOutput {
    pub id: Uuid,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Output Storage Port
#[async_trait]
pub trait OutputStoragePort: Send + Sync {
    /// 输出文件路径
    fn output_path(&self, id: Uuid) -> PathBuf;

    /// 保存合成得到的 WAV
    async fn save_output(&self, data: &[u8]) -> Result<StoredOutput, OutputStorageError>;

    /// 读取 WAV
    async fn read_output(&self, id: Uuid) -> Result<Vec<u8>, OutputStorageError>;
}
