//! TTS Engine Port - 外部语音合成引擎抽象
//!
//! 定义声音克隆合成的抽象接口，具体实现在 infrastructure/adapters 层
//! 引擎句柄在进程启动时构造一次，之后复用

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Reference audio error: {0}")]
    ReferenceAudio(String),
}

/// TTS 推理请求
#[derive(Debug, Clone)]
pub struct InferRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 参考音频（声音样本）的本地路径
    pub reference_audio: PathBuf,
    /// 语言代码
    pub language: String,
    /// 采样温度，即 UI 上的表现力
    pub temperature: f32,
    /// 语速
    pub speed: f32,
}

/// TTS 推理响应
#[derive(Debug, Clone)]
pub struct InferResponse {
    /// 合成的 WAV 数据
    pub audio_data: Vec<u8>,
    /// 音频时长（毫秒）
    pub duration_ms: Option<u64>,
    /// 采样率
    pub sample_rate: Option<u32>,
}

/// TTS Engine Port
///
/// 实现方不保证可并发调用，调用方负责串行化
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行一次声音克隆合成
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError>;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
