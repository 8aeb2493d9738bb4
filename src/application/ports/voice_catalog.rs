//! Voice Catalog Port - 出站端口
//!
//! 定义音色样本目录（保存 / 列出 / 查找）的抽象接口
//! 具体实现在 infrastructure 层（JSON 文件目录）

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::voice::{SampleFormat, Username, VoiceError, VoiceRecord};

/// Catalog 错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Voice sample is empty")]
    EmptySample,

    #[error("Voice sample missing for '{username}': {path}")]
    MissingSample { username: String, path: String },

    #[error("Corrupt voice record {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<VoiceError> for CatalogError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::InvalidUsername(msg) => CatalogError::InvalidUsername(msg),
            VoiceError::UnsupportedFormat(ext) => CatalogError::UnsupportedFormat(ext),
            other => CatalogError::InvalidUsername(other.to_string()),
        }
    }
}

/// 被跳过的目录条目（读取失败 / 损坏 / 样本丢失）
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// 一次目录扫描的快照
#[derive(Debug, Clone, Default)]
pub struct CatalogScan {
    /// 有效记录，按 created_at 倒序
    pub records: Vec<VoiceRecord>,
    /// 扫描时跳过的条目
    pub skipped: Vec<SkippedEntry>,
}

/// Voice Catalog Port
///
/// 每个用户名至多一条记录，重复保存即覆盖（last write wins，无锁）
#[async_trait]
pub trait VoiceCatalogPort: Send + Sync {
    /// 保存参考音频和元数据，返回新记录
    async fn save(
        &self,
        username: &Username,
        sample: &[u8],
        format: SampleFormat,
    ) -> Result<VoiceRecord, CatalogError>;

    /// 扫描目录，逐条捕获错误
    async fn scan(&self) -> Result<CatalogScan, CatalogError>;

    /// 根据用户名查找记录；不存在时返回 None
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<VoiceRecord>, CatalogError>;

    /// 读取记录对应的参考音频
    async fn read_sample(&self, record: &VoiceRecord) -> Result<Vec<u8>, CatalogError>;

    /// 列出所有有效记录（按 created_at 倒序）
    ///
    /// 被跳过的条目只记录日志，不向调用方报错
    async fn list_all(&self) -> Result<Vec<VoiceRecord>, CatalogError> {
        let scan = self.scan().await?;
        for entry in &scan.skipped {
            tracing::warn!(
                path = %entry.path.display(),
                reason = %entry.reason,
                "Skipping unreadable voice record"
            );
        }
        Ok(scan.records)
    }
}
