//! Fake TTS Client - 本地开发与测试用的合成引擎
//!
//! 不调用任何模型，生成确定性的正弦波 WAV，长度随文本长度增长

use async_trait::async_trait;
use std::f32::consts::TAU;

use crate::application::ports::{InferRequest, InferResponse, TtsEnginePort, TtsError};
use crate::infrastructure::adapters::transcoder::encode_pcm16_wav;

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 采样率
    pub sample_rate: u32,
    /// 每个字符对应的音频时长（毫秒）
    pub ms_per_char: u64,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            ms_per_char: 60,
            latency_ms: 0,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            latency_ms = config.latency_ms,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    fn render(&self, request: &InferRequest) -> (Vec<i16>, u64) {
        let chars = request.text.chars().count() as u64;
        let duration_ms = (chars * self.config.ms_per_char).max(200);
        let total = (self.config.sample_rate as u64 * duration_ms / 1000) as usize;

        // 音高随表现力变化，便于在界面上听出差别
        let frequency = 180.0 + request.temperature * 200.0;
        let rate = self.config.sample_rate as f32;
        let samples = (0..total)
            .map(|i| ((i as f32 / rate * frequency * TAU).sin() * 6000.0) as i16)
            .collect();

        (samples, duration_ms)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        if request.text.trim().is_empty() {
            return Err(TtsError::InvalidInput("text is empty".to_string()));
        }
        if !request.reference_audio.exists() {
            return Err(TtsError::ReferenceAudio(format!(
                "{} not found",
                request.reference_audio.display()
            )));
        }

        tracing::debug!(
            text_len = request.text.len(),
            language = %request.language,
            reference = %request.reference_audio.display(),
            "FakeTtsClient: rendering tone"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let (samples, duration_ms) = self.render(&request);

        Ok(InferResponse {
            audio_data: encode_pcm16_wav(&samples, self.config.sample_rate, 1),
            duration_ms: Some(duration_ms),
            sample_rate: Some(self.config.sample_rate),
        })
    }
}
