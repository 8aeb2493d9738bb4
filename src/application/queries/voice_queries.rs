//! Voice Queries

use uuid::Uuid;

use crate::application::ports::AudioFormat;

/// 列出所有音色查询
#[derive(Debug, Clone)]
pub struct ListVoices;

/// 生成页视图查询
#[derive(Debug, Clone)]
pub struct GetGenerateScreen;

/// 获取原始参考音频（试听）
#[derive(Debug, Clone)]
pub struct GetVoiceSample {
    pub username: String,
}

/// 下载生成结果
#[derive(Debug, Clone)]
pub struct GetGeneratedAudio {
    pub output_id: Uuid,
    pub format: AudioFormat,
    /// 下载文件名使用的用户名
    pub username: Option<String>,
}
