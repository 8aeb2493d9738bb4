//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::AudioFormat;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 合成配置
    #[serde(default)]
    pub synthesis: SynthesisSettings,

    /// 音频下载配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
///
/// 启用后挂载在 `path` 下，内置页面仍由 `/` 提供
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default)]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/static".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 远端声音克隆服务
    #[default]
    Http,
    /// 本地正弦波引擎，开发与测试用
    Fake,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Http => write!(f, "http"),
            EngineKind::Fake => write!(f, "fake"),
        }
    }
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 引擎类型
    #[serde(default)]
    pub engine: EngineKind,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// HTTP 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    180
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisSettings {
    /// 单次合成超时（秒），不含排队时间
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    /// 可选语言
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// 默认语言
    #[serde(default = "default_language")]
    pub default_language: String,

    /// 生成页默认文本
    #[serde(default = "default_text")]
    pub default_text: String,
}

fn default_synthesis_timeout() -> u64 {
    120
}

fn default_languages() -> Vec<String> {
    ["en", "es", "fr", "de", "hi", "pt"]
        .iter()
        .map(|l| l.to_string())
        .collect()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_text() -> String {
    "Hello! This is my perfectly cloned voice. It sounds just like me!".to_string()
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_synthesis_timeout(),
            languages: default_languages(),
            default_language: default_language(),
            default_text: default_text(),
        }
    }
}

/// 音频下载配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 压缩下载格式
    /// 可选: mp3, opus
    #[serde(default = "default_compressed_format")]
    pub compressed_format: AudioFormat,

    /// 目标比特率（bps）
    /// 语音推荐: 16000-64000
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

fn default_compressed_format() -> AudioFormat {
    AudioFormat::Mp3
}

fn default_bitrate() -> u32 {
    32000 // 32kbps，语音足够
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            compressed_format: default_compressed_format(),
            bitrate: default_bitrate(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 音色目录（参考音频 + 元数据）
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,

    /// 合成结果目录
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,

    /// 上传文件最大大小（字节），默认 20MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// 合成结果过期时间（秒），0 表示不清理
    #[serde(default = "default_output_expire")]
    pub output_expire_secs: u64,

    /// 过期清理间隔（秒）
    #[serde(default = "default_gc_interval")]
    pub gc_interval_secs: u64,
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("user_models")
}

fn default_outputs_dir() -> PathBuf {
    PathBuf::from("data/outputs")
}

fn default_max_upload_size() -> u64 {
    20 * 1024 * 1024 // 20 MB
}

fn default_output_expire() -> u64 {
    86400 // 24 小时
}

fn default_gc_interval() -> u64 {
    3600 // 1 小时
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            voices_dir: default_voices_dir(),
            outputs_dir: default_outputs_dir(),
            max_upload_size: default_max_upload_size(),
            output_expire_secs: default_output_expire(),
            gc_interval_secs: default_gc_interval(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.tts.engine, EngineKind::Http);
        assert_eq!(config.tts.url, "http://localhost:8000");
        assert_eq!(config.synthesis.default_language, "en");
        assert_eq!(config.synthesis.languages.len(), 6);
        assert_eq!(config.audio.compressed_format, AudioFormat::Mp3);
        assert_eq!(config.storage.voices_dir, PathBuf::from("user_models"));
        assert_eq!(config.storage.output_expire_secs, 86400);
        assert_eq!(config.storage.gc_interval_secs, 3600);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8501");
    }
}
