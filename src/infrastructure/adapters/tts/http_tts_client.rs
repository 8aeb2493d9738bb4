//! HTTP TTS Client - 调用外部声音克隆服务
//!
//! 实现 TtsEnginePort trait。模型常驻在远端服务进程中，本客户端启动时构造一次
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/clone
//! Request: multipart (text, language, temperature, speed, speaker_wav 文件)
//! Response: audio/wav binary, metadata in headers

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{InferRequest, InferResponse, TtsEnginePort, TtsError};
use crate::domain::voice::SampleFormat;

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn clone_url(&self) -> String {
        format!("{}/api/tts/clone", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    fn header_value<T: std::str::FromStr>(
        headers: &reqwest::header::HeaderMap,
        name: &str,
    ) -> Option<T> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
        let reference = tokio::fs::read(&request.reference_audio)
            .await
            .map_err(|e| {
                TtsError::ReferenceAudio(format!("{}: {}", request.reference_audio.display(), e))
            })?;

        let file_name = request
            .reference_audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("speaker.wav")
            .to_string();
        let content_type = SampleFormat::from_file_name(Some(&file_name))
            .map(|f| f.content_type())
            .unwrap_or("application/octet-stream");
        let speaker = Part::bytes(reference)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|e| TtsError::InvalidInput(e.to_string()))?;

        let form = Form::new()
            .text("text", request.text.clone())
            .text("language", request.language.clone())
            .text("temperature", request.temperature.to_string())
            .text("speed", request.speed.to_string())
            .part("speaker_wav", speaker);

        tracing::debug!(
            url = %self.clone_url(),
            text_len = request.text.len(),
            language = %request.language,
            temperature = request.temperature,
            reference = %request.reference_audio.display(),
            "Sending TTS clone request"
        );

        let response = self
            .client
            .post(self.clone_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let duration_ms = Self::header_value(response.headers(), "X-TTS-Duration-Ms");
        let sample_rate = Self::header_value(response.headers(), "X-TTS-Sample-Rate");

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else {
                    TtsError::InvalidResponse(format!("Failed to read audio: {}", e))
                }
            })?
            .to_vec();

        tracing::info!(
            duration_ms = ?duration_ms,
            sample_rate = ?sample_rate,
            audio_size = audio_data.len(),
            "TTS inference completed"
        );

        Ok(InferResponse {
            audio_data,
            duration_ms,
            sample_rate,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "TTS health check failed");
                false
            }
        }
    }
}
