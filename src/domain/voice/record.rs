//! Voice Context - VoiceRecord

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{Username, VoiceError, VoiceId};

/// 音色记录（每个用户名一条）
///
/// 不变量:
/// - 只在 train 时创建，重新训练时整体覆盖，不做原地更新
/// - sample_path 在读取时必须仍然存在，否则记录无效
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRecord {
    pub id: VoiceId,
    pub username: String,
    pub sample_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl VoiceRecord {
    /// 创建新记录
    pub fn new(username: &Username, sample_path: PathBuf) -> Self {
        Self {
            id: VoiceId::new(),
            username: username.as_str().to_string(),
            sample_path,
            created_at: Utc::now(),
        }
    }

    /// 校验记录字段（不检查文件系统）
    pub fn validate(&self) -> Result<(), VoiceError> {
        Username::new(&self.username)?;
        if self.sample_path.as_os_str().is_empty() {
            return Err(VoiceError::InvalidRecord(
                "sample_path 不能为空".to_string(),
            ));
        }
        Ok(())
    }

    /// 下拉框展示名: "Anurag (2024-05-01)"
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.username, self.created_at.format("%Y-%m-%d"))
    }
}
