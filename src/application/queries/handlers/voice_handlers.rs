//! Voice Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioFormat, AudioTranscoderPort, OutputStoragePort, TranscodeConfig, VoiceCatalogPort,
};
use crate::application::queries::{GetGenerateScreen, GetGeneratedAudio, GetVoiceSample, ListVoices};
use crate::domain::voice::{Expressiveness, SampleFormat, Username, VoiceRecord};

// ============================================================================
// Response DTOs
// ============================================================================

/// 音色条目
#[derive(Debug, Clone)]
pub struct VoiceResponse {
    pub id: String,
    pub username: String,
    /// 下拉框展示名
    pub label: String,
    pub created_at: String,
}

impl From<VoiceRecord> for VoiceResponse {
    fn from(record: VoiceRecord) -> Self {
        Self {
            id: record.id.to_string(),
            label: record.display_label(),
            username: record.username,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// 生成页选项
#[derive(Debug, Clone)]
pub struct ScreenOptions {
    pub languages: Vec<String>,
    pub default_language: String,
    pub default_text: String,
    pub compressed_format: AudioFormat,
}

/// 生成页视图
#[derive(Debug, Clone)]
pub struct GenerateScreenView {
    pub voices: Vec<VoiceResponse>,
    /// 扫描时被跳过的损坏条目数量
    pub skipped_entries: usize,
    pub synthesis_enabled: bool,
    pub notice: String,
    pub languages: Vec<String>,
    pub default_language: String,
    pub default_text: String,
    pub expressiveness_min: f32,
    pub expressiveness_max: f32,
    pub expressiveness_default: f32,
    pub download_formats: Vec<AudioFormat>,
}

/// 音频下载响应
#[derive(Debug, Clone)]
pub struct AudioDownload {
    pub audio_data: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListVoices Handler
pub struct ListVoicesHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl ListVoicesHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, _query: ListVoices) -> Result<Vec<VoiceResponse>, ApplicationError> {
        let voices = self.catalog.list_all().await?;
        Ok(voices.into_iter().map(VoiceResponse::from).collect())
    }
}

/// GetGenerateScreen Handler
///
/// catalog 为空时禁用合成并给出引导提示
pub struct GetGenerateScreenHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
    options: ScreenOptions,
}

impl GetGenerateScreenHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>, options: ScreenOptions) -> Self {
        Self { catalog, options }
    }

    pub async fn handle(
        &self,
        _query: GetGenerateScreen,
    ) -> Result<GenerateScreenView, ApplicationError> {
        let scan = self.catalog.scan().await?;
        for entry in &scan.skipped {
            tracing::warn!(
                path = %entry.path.display(),
                reason = %entry.reason,
                "Skipping unreadable voice record"
            );
        }

        let synthesis_enabled = !scan.records.is_empty();
        let notice = if synthesis_enabled {
            format!("{} voice models available", scan.records.len())
        } else {
            "No voice models yet! Go to the Train tab to add the first voice.".to_string()
        };

        Ok(GenerateScreenView {
            skipped_entries: scan.skipped.len(),
            voices: scan.records.into_iter().map(VoiceResponse::from).collect(),
            synthesis_enabled,
            notice,
            languages: self.options.languages.clone(),
            default_language: self.options.default_language.clone(),
            default_text: self.options.default_text.clone(),
            expressiveness_min: Expressiveness::MIN,
            expressiveness_max: Expressiveness::MAX,
            expressiveness_default: Expressiveness::DEFAULT,
            download_formats: vec![AudioFormat::Wav, self.options.compressed_format],
        })
    }
}

/// GetVoiceSample Handler - 原始声音试听
pub struct GetVoiceSampleHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl GetVoiceSampleHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, query: GetVoiceSample) -> Result<AudioDownload, ApplicationError> {
        let username = Username::new(&query.username)?;
        let record = self
            .catalog
            .find_by_username(&username)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", &username))?;

        let audio_data = self.catalog.read_sample(&record).await?;
        let format = record
            .sample_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SampleFormat::from_extension)
            .unwrap_or(SampleFormat::Wav);

        Ok(AudioDownload {
            audio_data,
            content_type: format.content_type(),
            file_name: format!("{}.{}", username.file_stem(), format.extension()),
        })
    }
}

/// GetGeneratedAudio Handler - 下载 WAV 或压缩格式
pub struct GetGeneratedAudioHandler {
    outputs: Arc<dyn OutputStoragePort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    bitrate: u32,
}

impl GetGeneratedAudioHandler {
    pub fn new(
        outputs: Arc<dyn OutputStoragePort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        bitrate: u32,
    ) -> Self {
        Self {
            outputs,
            transcoder,
            bitrate,
        }
    }

    pub async fn handle(&self, query: GetGeneratedAudio) -> Result<AudioDownload, ApplicationError> {
        if !self.transcoder.supports_format(query.format) {
            return Err(ApplicationError::validation(format!(
                "Download format '{}' is not available",
                query.format
            )));
        }

        let wav = self.outputs.read_output(query.output_id).await?;
        let result = self
            .transcoder
            .transcode(
                &wav,
                &TranscodeConfig {
                    format: query.format,
                    bitrate: Some(self.bitrate),
                },
            )
            .await?;

        let stem = query
            .username
            .as_deref()
            .and_then(|name| Username::new(name).ok())
            .map(|name| name.file_stem())
            .unwrap_or_else(|| query.output_id.to_string());

        Ok(AudioDownload {
            content_type: result.format.content_type(),
            file_name: format!("{}_clone.{}", stem, result.format.extension()),
            audio_data: result.audio_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{
        encode_pcm16_wav, FileOutputStorage, JsonVoiceCatalog, WavTranscoder,
    };
    use tempfile::tempdir;

    fn options() -> ScreenOptions {
        ScreenOptions {
            languages: vec!["en".to_string(), "hi".to_string()],
            default_language: "en".to_string(),
            default_text: "Hello!".to_string(),
            compressed_format: AudioFormat::Opus,
        }
    }

    #[tokio::test]
    async fn test_generate_screen_onboarding_when_empty() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(JsonVoiceCatalog::new(dir.path()).await.unwrap());
        let handler = GetGenerateScreenHandler::new(catalog, options());

        let view = handler.handle(GetGenerateScreen).await.unwrap();
        assert!(!view.synthesis_enabled);
        assert!(view.voices.is_empty());
        assert!(view.notice.contains("No voice models yet"));
        assert_eq!(view.expressiveness_default, 0.65);
    }

    #[tokio::test]
    async fn test_generate_screen_lists_voices_and_counts_skipped() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(JsonVoiceCatalog::new(dir.path()).await.unwrap());
        catalog
            .save(&Username::new("Anurag").unwrap(), b"RIFFdata", SampleFormat::Wav)
            .await
            .unwrap();
        std::fs::write(dir.path().join("broken_model.json"), b"{not json").unwrap();

        let handler = GetGenerateScreenHandler::new(catalog, options());
        let view = handler.handle(GetGenerateScreen).await.unwrap();
        assert!(view.synthesis_enabled);
        assert_eq!(view.voices.len(), 1);
        assert_eq!(view.voices[0].username, "Anurag");
        assert_eq!(view.skipped_entries, 1);
        assert_eq!(view.download_formats, vec![AudioFormat::Wav, AudioFormat::Opus]);
    }

    #[tokio::test]
    async fn test_voice_sample_preview() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(JsonVoiceCatalog::new(dir.path()).await.unwrap());
        catalog
            .save(&Username::new("Sakshi").unwrap(), b"ID3 mp3 bytes", SampleFormat::Mp3)
            .await
            .unwrap();

        let handler = GetVoiceSampleHandler::new(catalog);
        let sample = handler
            .handle(GetVoiceSample {
                username: "Sakshi".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(sample.audio_data, b"ID3 mp3 bytes");
        assert_eq!(sample.content_type, "audio/mpeg");
        assert_eq!(sample.file_name, "Sakshi.mp3");

        let missing = handler
            .handle(GetVoiceSample {
                username: "Nobody".to_string(),
            })
            .await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_generated_audio_download_names() {
        let dir = tempdir().unwrap();
        let outputs = Arc::new(FileOutputStorage::new(dir.path()).await.unwrap());
        let wav = encode_pcm16_wav(&vec![0i16; 16000], 16000, 1);
        let stored = outputs.save_output(&wav).await.unwrap();

        let handler =
            GetGeneratedAudioHandler::new(outputs, Arc::new(WavTranscoder::default()), 32000);

        let download = handler
            .handle(GetGeneratedAudio {
                output_id: stored.id,
                format: AudioFormat::Wav,
                username: Some("Anurag".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(download.file_name, "Anurag_clone.wav");
        assert_eq!(download.content_type, "audio/wav");
        assert_eq!(download.audio_data, wav);

        let mp3 = handler
            .handle(GetGeneratedAudio {
                output_id: stored.id,
                format: AudioFormat::Mp3,
                username: None,
            })
            .await
            .unwrap();
        assert_eq!(mp3.file_name, format!("{}_clone.mp3", stored.id));
        assert_eq!(mp3.content_type, "audio/mpeg");
        assert!(!mp3.audio_data.is_empty());
    }
}
