//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("无效的用户名: {0}")]
    InvalidUsername(String),

    #[error("不支持的音频格式: {0}")]
    UnsupportedFormat(String),

    #[error("无效的合成参数: {0}")]
    InvalidParams(String),

    #[error("无效的音色记录: {0}")]
    InvalidRecord(String),
}
