//! Synthesis Adapter - 合成引擎调用封装
//!
//! 在 TtsEnginePort 之上提供：
//! - 输入校验（空文本、参考音频不存在）
//! - 表现力截断
//! - 全局调用锁：同一时刻只有一个合成请求进入引擎
//! - 单次调用超时；超时只放弃等待，锁直到引擎真正返回才释放
//! - 输出校验（非空且为 RIFF/WAVE）

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::application::error::ApplicationError;
use crate::application::ports::{InferRequest, TtsEnginePort, TtsError};
use crate::domain::voice::SynthesisParams;

/// Synthesis Adapter 配置
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// 单次引擎调用的超时（不含排队等锁的时间）
    pub timeout: Duration,
    /// 语速，固定传给引擎
    pub speed: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            speed: 1.0,
        }
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// WAV 数据
    pub audio_data: Vec<u8>,
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
}

/// 合成适配器
///
/// 引擎句柄在启动时注入，进程内共享一份
pub struct SynthesisAdapter {
    engine: Arc<dyn TtsEnginePort>,
    invocation_lock: Arc<Mutex<()>>,
    config: SynthesisConfig,
}

impl SynthesisAdapter {
    pub fn new(engine: Arc<dyn TtsEnginePort>, config: SynthesisConfig) -> Self {
        Self {
            engine,
            invocation_lock: Arc::new(Mutex::new(())),
            config,
        }
    }

    pub fn engine(&self) -> &Arc<dyn TtsEnginePort> {
        &self.engine
    }

    /// 用参考音频的声音合成文本
    pub async fn synthesize(
        &self,
        text: &str,
        reference_sample: &Path,
        params: &SynthesisParams,
    ) -> Result<SynthesizedAudio, ApplicationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApplicationError::validation("Text to speak cannot be empty"));
        }

        match tokio::fs::try_exists(reference_sample).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(ApplicationError::StorageError(format!(
                    "Reference sample not found: {}",
                    reference_sample.display()
                )));
            }
            Err(e) => {
                return Err(ApplicationError::StorageError(format!(
                    "Cannot access reference sample {}: {}",
                    reference_sample.display(),
                    e
                )));
            }
        }

        let request = InferRequest {
            text: text.to_string(),
            reference_audio: reference_sample.to_path_buf(),
            language: params.language.clone(),
            temperature: params.expressiveness.value(),
            speed: self.config.speed,
        };

        let timeout_secs = self.config.timeout.as_secs();
        let guard = self.invocation_lock.clone().lock_owned().await;
        let started = Instant::now();

        tracing::debug!(
            text_len = request.text.len(),
            language = %request.language,
            temperature = request.temperature,
            reference = %request.reference_audio.display(),
            "Invoking synthesis engine"
        );

        // 锁随引擎调用一起移入任务
        let engine = self.engine.clone();
        let call = tokio::spawn(async move {
            let result = engine.infer(request).await;
            drop(guard);
            result
        });

        let response = match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(TtsError::Timeout))) => {
                tracing::error!(elapsed_ms = started.elapsed().as_millis() as u64, "Synthesis engine timed out");
                return Err(ApplicationError::SynthesisTimeout(timeout_secs));
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "Synthesis engine failed");
                return Err(ApplicationError::synthesis(e.to_string()));
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Synthesis task aborted");
                return Err(ApplicationError::internal(format!("Synthesis task failed: {}", e)));
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = timeout_secs,
                    "Synthesis exceeded timeout, engine keeps the lock until it returns"
                );
                return Err(ApplicationError::SynthesisTimeout(timeout_secs));
            }
        };

        if response.audio_data.is_empty() {
            return Err(ApplicationError::synthesis("Engine returned empty audio"));
        }
        if !is_wav(&response.audio_data) {
            return Err(ApplicationError::synthesis(
                "Engine returned audio that is not a WAV file",
            ));
        }

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            audio_size = response.audio_data.len(),
            "Synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data: response.audio_data,
            duration_ms: response.duration_ms,
            sample_rate: response.sample_rate,
        })
    }
}

/// RIFF/WAVE 头检查
pub fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::InferResponse;
    use crate::infrastructure::adapters::encode_pcm16_wav;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    /// 记录调用顺序的测试引擎
    #[derive(Default)]
    struct RecordingEngine {
        events: StdMutex<Vec<String>>,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        temperatures: StdMutex<Vec<f32>>,
    }

    #[async_trait]
    impl TtsEnginePort for RecordingEngine {
        async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.events.lock().unwrap().push(format!("start:{}", request.text));
            self.temperatures.lock().unwrap().push(request.temperature);

            tokio::time::sleep(Duration::from_millis(50 + (n as u64 % 2) * 10)).await;

            self.events.lock().unwrap().push(format!("end:{}", request.text));
            self.active.fetch_sub(1, Ordering::SeqCst);

            Ok(InferResponse {
                audio_data: encode_pcm16_wav(&[0i16; 160], 16000, 1),
                duration_ms: Some(10),
                sample_rate: Some(16000),
            })
        }
    }

    struct SlowEngine;

    #[async_trait]
    impl TtsEnginePort for SlowEngine {
        async fn infer(&self, _request: InferRequest) -> Result<InferResponse, TtsError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(TtsError::ServiceError("unreachable".to_string()))
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl TtsEnginePort for FailingEngine {
        async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
            Err(TtsError::InvalidInput(format!(
                "Language '{}' is not supported",
                request.language
            )))
        }
    }

    struct GarbageEngine;

    #[async_trait]
    impl TtsEnginePort for GarbageEngine {
        async fn infer(&self, _request: InferRequest) -> Result<InferResponse, TtsError> {
            Ok(InferResponse {
                audio_data: b"not audio at all".to_vec(),
                duration_ms: None,
                sample_rate: None,
            })
        }
    }

    fn reference_sample(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("Anurag.wav");
        std::fs::write(&path, encode_pcm16_wav(&[0i16; 16], 16000, 1)).unwrap();
        path
    }

    fn params() -> SynthesisParams {
        SynthesisParams::new("en", 0.65).unwrap()
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_engine() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(RecordingEngine::default());
        let adapter = SynthesisAdapter::new(engine.clone(), SynthesisConfig::default());

        let result = adapter
            .synthesize("", &reference_sample(dir.path()), &params())
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));

        let result = adapter
            .synthesize("   \n", &reference_sample(dir.path()), &params())
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_reference_sample() {
        let dir = tempdir().unwrap();
        let adapter =
            SynthesisAdapter::new(Arc::new(RecordingEngine::default()), SynthesisConfig::default());

        let result = adapter
            .synthesize("Hello", &dir.path().join("gone.wav"), &params())
            .await;
        assert!(matches!(result, Err(ApplicationError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_serialized() {
        let dir = tempdir().unwrap();
        let sample = reference_sample(dir.path());
        let engine = Arc::new(RecordingEngine::default());
        let adapter = Arc::new(SynthesisAdapter::new(
            engine.clone(),
            SynthesisConfig::default(),
        ));

        let a = {
            let adapter = adapter.clone();
            let sample = sample.clone();
            tokio::spawn(async move { adapter.synthesize("one", &sample, &params()).await })
        };
        let b = {
            let adapter = adapter.clone();
            let sample = sample.clone();
            tokio::spawn(async move { adapter.synthesize("two", &sample, &params()).await })
        };

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());

        assert_eq!(engine.max_active.load(Ordering::SeqCst), 1);
        let events = engine.events.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        for pair in events.chunks(2) {
            let started = pair[0].strip_prefix("start:").unwrap();
            let ended = pair[1].strip_prefix("end:").unwrap();
            assert_eq!(started, ended, "interleaved calls: {:?}", events);
        }
    }

    #[tokio::test]
    async fn test_timeout_reported() {
        let dir = tempdir().unwrap();
        let adapter = SynthesisAdapter::new(
            Arc::new(SlowEngine),
            SynthesisConfig {
                timeout: Duration::from_millis(50),
                ..Default::default()
            },
        );

        let result = adapter
            .synthesize("Hello", &reference_sample(dir.path()), &params())
            .await;
        assert!(matches!(result, Err(ApplicationError::SynthesisTimeout(_))));
    }

    /// 第一次调用慢于超时，之后正常返回
    #[derive(Default)]
    struct StallingEngine {
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        events: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl TtsEnginePort for StallingEngine {
        async fn infer(&self, request: InferRequest) -> Result<InferResponse, TtsError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.events.lock().unwrap().push(format!("start:{}", request.text));

            let delay = if n == 0 { 300 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.events.lock().unwrap().push(format!("end:{}", request.text));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(InferResponse {
                audio_data: encode_pcm16_wav(&[0i16; 160], 16000, 1),
                duration_ms: None,
                sample_rate: None,
            })
        }
    }

    #[tokio::test]
    async fn test_abandoned_call_keeps_engine_exclusive() {
        let dir = tempdir().unwrap();
        let sample = reference_sample(dir.path());
        let engine = Arc::new(StallingEngine::default());
        let adapter = SynthesisAdapter::new(
            engine.clone(),
            SynthesisConfig {
                timeout: Duration::from_millis(50),
                ..Default::default()
            },
        );

        let first = adapter.synthesize("one", &sample, &params()).await;
        assert!(matches!(first, Err(ApplicationError::SynthesisTimeout(_))));

        let second = adapter.synthesize("two", &sample, &params()).await;
        assert!(second.is_ok());

        assert_eq!(engine.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(
            engine.events.lock().unwrap().as_slice(),
            &["start:one", "end:one", "start:two", "end:two"]
        );
    }

    #[tokio::test]
    async fn test_engine_error_becomes_synthesis_failure() {
        let dir = tempdir().unwrap();
        let adapter = SynthesisAdapter::new(Arc::new(FailingEngine), SynthesisConfig::default());

        let result = adapter
            .synthesize("Hello", &reference_sample(dir.path()), &params())
            .await;
        match result {
            Err(ApplicationError::SynthesisFailure(msg)) => assert!(msg.contains("en")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_wav_output_rejected() {
        let dir = tempdir().unwrap();
        let adapter = SynthesisAdapter::new(Arc::new(GarbageEngine), SynthesisConfig::default());

        let result = adapter
            .synthesize("Hello", &reference_sample(dir.path()), &params())
            .await;
        assert!(matches!(result, Err(ApplicationError::SynthesisFailure(_))));
    }

    #[tokio::test]
    async fn test_expressiveness_clamped_before_engine() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(RecordingEngine::default());
        let adapter = SynthesisAdapter::new(engine.clone(), SynthesisConfig::default());

        let params = SynthesisParams::new("en", 3.0).unwrap();
        adapter
            .synthesize("Hello", &reference_sample(dir.path()), &params)
            .await
            .unwrap();
        assert_eq!(engine.temperatures.lock().unwrap().as_slice(), &[0.8]);
    }

    #[test]
    fn test_is_wav() {
        assert!(is_wav(&encode_pcm16_wav(&[1, 2, 3], 16000, 1)));
        assert!(!is_wav(b"RIFF"));
        assert!(!is_wav(b"ID3\x03 mp3 data here"));
    }
}
