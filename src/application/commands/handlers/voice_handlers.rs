//! Voice Command Handlers - 训练 / 生成

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{GenerateSpeech, TrainVoice};
use crate::application::error::ApplicationError;
use crate::application::ports::{OutputStoragePort, VoiceCatalogPort};
use crate::application::synthesis::SynthesisAdapter;
use crate::domain::voice::{Expressiveness, SampleFormat, SynthesisParams, Username, VoiceRecord};

// ============================================================================
// TrainVoice
// ============================================================================

/// 训练音色响应
#[derive(Debug, Clone)]
pub struct TrainVoiceResponse {
    pub record: VoiceRecord,
}

/// TrainVoice Handler
///
/// 缺少用户名或音频时直接返回验证错误，不产生任何副作用
pub struct TrainVoiceHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl TrainVoiceHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, command: TrainVoice) -> Result<TrainVoiceResponse, ApplicationError> {
        let username = command
            .username
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApplicationError::validation("Enter a username"))?;
        let audio_data = command
            .audio_data
            .filter(|data| !data.is_empty())
            .ok_or_else(|| ApplicationError::validation("Upload an audio file"))?;

        let username = Username::new(&username)?;
        let format = SampleFormat::from_file_name(command.file_name.as_deref())?;

        let record = self.catalog.save(&username, &audio_data, format).await?;

        tracing::info!(
            voice_id = %record.id,
            username = %record.username,
            sample = %record.sample_path.display(),
            size = audio_data.len(),
            "Voice trained"
        );

        Ok(TrainVoiceResponse { record })
    }
}

// ============================================================================
// GenerateSpeech
// ============================================================================

/// 生成语音响应
#[derive(Debug, Clone)]
pub struct GenerateSpeechResponse {
    pub output_id: Uuid,
    pub username: String,
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub size_bytes: u64,
}

/// GenerateSpeech Handler
///
/// 合成失败或超时时不修改 catalog
pub struct GenerateSpeechHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
    synthesis: Arc<SynthesisAdapter>,
    outputs: Arc<dyn OutputStoragePort>,
    default_language: String,
}

impl GenerateSpeechHandler {
    pub fn new(
        catalog: Arc<dyn VoiceCatalogPort>,
        synthesis: Arc<SynthesisAdapter>,
        outputs: Arc<dyn OutputStoragePort>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            synthesis,
            outputs,
            default_language: default_language.into(),
        }
    }

    pub async fn handle(
        &self,
        command: GenerateSpeech,
    ) -> Result<GenerateSpeechResponse, ApplicationError> {
        let username = Username::new(&command.username)
            .map_err(|_| ApplicationError::validation("Select a voice"))?;

        let record = self
            .catalog
            .find_by_username(&username)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", &username))?;

        let language = command
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.default_language.clone());
        let params = SynthesisParams::new(
            language,
            command.expressiveness.unwrap_or(Expressiveness::DEFAULT),
        )?;

        let audio = self
            .synthesis
            .synthesize(&command.text, &record.sample_path, &params)
            .await?;

        let stored = self.outputs.save_output(&audio.audio_data).await?;

        tracing::info!(
            output_id = %stored.id,
            username = %record.username,
            language = %params.language,
            expressiveness = params.expressiveness.value(),
            size = stored.size_bytes,
            "Speech generated"
        );

        Ok(GenerateSpeechResponse {
            output_id: stored.id,
            username: record.username,
            duration_ms: audio.duration_ms,
            sample_rate: audio.sample_rate,
            size_bytes: stored.size_bytes,
        })
    }
}
