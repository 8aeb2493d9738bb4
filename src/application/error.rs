//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{CatalogError, OutputStorageError, TranscodeError, TtsError};
use crate::domain::voice::VoiceError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误（缺少或为空的输入）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 存储错误（目录不可读写、记录损坏）
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 合成引擎拒绝输入或出错
    #[error("Synthesis failed: {0}")]
    SynthesisFailure(String),

    /// 合成超时
    #[error("Synthesis timed out after {0}s")]
    SynthesisTimeout(u64),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建合成失败错误
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::SynthesisFailure(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidUsername(_)
            | CatalogError::UnsupportedFormat(_)
            | CatalogError::EmptySample => Self::ValidationError(err.to_string()),
            CatalogError::MissingSample { .. }
            | CatalogError::Corrupt { .. }
            | CatalogError::IoError(_) => Self::StorageError(err.to_string()),
        }
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        Self::SynthesisFailure(err.to_string())
    }
}

impl From<OutputStorageError> for ApplicationError {
    fn from(err: OutputStorageError) -> Self {
        match err {
            OutputStorageError::NotFound(id) => Self::not_found("Output", id),
            OutputStorageError::IoError(msg) => Self::StorageError(msg),
        }
    }
}

impl From<TranscodeError> for ApplicationError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::UnsupportedFormat(_) => Self::ValidationError(err.to_string()),
            _ => Self::InternalError(err.to_string()),
        }
    }
}
