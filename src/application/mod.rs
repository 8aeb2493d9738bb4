//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（VoiceCatalog、TtsEngine、AudioTranscoder、OutputStorage）
//! - synthesis: 串行化、带超时的合成适配器
//! - commands: 训练 / 生成命令及处理器
//! - queries: 列表、生成页视图、试听、下载
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod synthesis;

// Re-exports
pub use commands::{
    handlers::{GenerateSpeechHandler, GenerateSpeechResponse, TrainVoiceHandler, TrainVoiceResponse},
    GenerateSpeech, TrainVoice,
};

pub use error::ApplicationError;

pub use ports::{
    // Transcoder
    AudioFormat,
    AudioInfo,
    AudioTranscoderPort,
    TranscodeConfig,
    TranscodeError,
    TranscodeResult,
    // Output storage
    OutputStorageError,
    OutputStoragePort,
    StoredOutput,
    // TTS engine
    InferRequest,
    InferResponse,
    TtsEnginePort,
    TtsError,
    // Voice catalog
    CatalogError,
    CatalogScan,
    SkippedEntry,
    VoiceCatalogPort,
};

pub use queries::{
    handlers::{
        AudioDownload, GenerateScreenView, GetGenerateScreenHandler, GetGeneratedAudioHandler,
        GetVoiceSampleHandler, ListVoicesHandler, ScreenOptions, VoiceResponse,
    },
    GetGenerateScreen, GetGeneratedAudio, GetVoiceSample, ListVoices,
};

pub use synthesis::{SynthesisAdapter, SynthesisConfig, SynthesizedAudio};
