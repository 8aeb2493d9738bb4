//! Application Ports - 六边形架构端口定义
//!
//! 出站端口：VoiceCatalog、TtsEngine、AudioTranscoder、OutputStorage

mod audio_transcoder;
mod output_storage;
mod tts_engine;
mod voice_catalog;

pub use audio_transcoder::{
    AudioFormat, AudioInfo, AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscodeResult,
};
pub use output_storage::{OutputStorageError, OutputStoragePort, StoredOutput};
pub use tts_engine::{InferRequest, InferResponse, TtsEnginePort, TtsError};
pub use voice_catalog::{CatalogError, CatalogScan, SkippedEntry, VoiceCatalogPort};
