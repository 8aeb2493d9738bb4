//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    GenerateSpeechHandler, TrainVoiceHandler,
    // Query handlers
    GetGenerateScreenHandler, GetGeneratedAudioHandler, GetVoiceSampleHandler, ListVoicesHandler,
    // Ports
    AudioTranscoderPort, OutputStoragePort, ScreenOptions, SynthesisAdapter, VoiceCatalogPort,
};

/// 应用状态
pub struct AppState {
    // ========== Shared ==========
    pub synthesis: Arc<SynthesisAdapter>,

    // ========== Command Handlers ==========
    pub train_voice_handler: TrainVoiceHandler,
    pub generate_speech_handler: GenerateSpeechHandler,

    // ========== Query Handlers ==========
    pub list_voices_handler: ListVoicesHandler,
    pub generate_screen_handler: GetGenerateScreenHandler,
    pub voice_sample_handler: GetVoiceSampleHandler,
    pub generated_audio_handler: GetGeneratedAudioHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        catalog: Arc<dyn VoiceCatalogPort>,
        synthesis: Arc<SynthesisAdapter>,
        outputs: Arc<dyn OutputStoragePort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        screen: ScreenOptions,
        bitrate: u32,
    ) -> Self {
        Self {
            // Command handlers
            train_voice_handler: TrainVoiceHandler::new(catalog.clone()),
            generate_speech_handler: GenerateSpeechHandler::new(
                catalog.clone(),
                synthesis.clone(),
                outputs.clone(),
                screen.default_language.clone(),
            ),

            // Query handlers
            list_voices_handler: ListVoicesHandler::new(catalog.clone()),
            generate_screen_handler: GetGenerateScreenHandler::new(catalog.clone(), screen),
            voice_sample_handler: GetVoiceSampleHandler::new(catalog),
            generated_audio_handler: GetGeneratedAudioHandler::new(outputs, transcoder, bitrate),

            synthesis,
        }
    }
}
