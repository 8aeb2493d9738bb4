//! Voice Commands - 训练 / 生成

/// 训练音色命令（上传参考音频）
#[derive(Debug, Clone)]
pub struct TrainVoice {
    pub username: Option<String>,
    /// 上传文件的原始文件名，用于推断扩展名
    pub file_name: Option<String>,
    pub audio_data: Option<Vec<u8>>,
}

/// 生成语音命令
#[derive(Debug, Clone)]
pub struct GenerateSpeech {
    pub username: String,
    pub text: String,
    pub language: Option<String>,
    pub expressiveness: Option<f32>,
}
