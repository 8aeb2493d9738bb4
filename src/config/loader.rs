//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, EngineKind};
use crate::application::ports::AudioFormat;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXCLONE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXCLONE_SERVER__PORT=8080`
/// - `VOXCLONE_TTS__ENGINE=fake`
/// - `VOXCLONE_TTS__URL=http://xtts-server:8000`
/// - `VOXCLONE_SYNTHESIS__LANGUAGES=en,hi`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 标量默认值（列表类默认值由 serde 提供）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8501)?
        .set_default("tts.engine", "http")?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 180)?
        .set_default("synthesis.timeout_secs", 120)?
        .set_default("synthesis.default_language", "en")?
        .set_default("audio.compressed_format", "mp3")?
        .set_default("audio.bitrate", 32000)?
        .set_default("storage.voices_dir", "user_models")?
        .set_default("storage.outputs_dir", "data/outputs")?
        .set_default("storage.max_upload_size", 20 * 1024 * 1024)?
        .set_default("storage.output_expire_secs", 86400)?
        .set_default("storage.gc_interval_secs", 3600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("VOXCLONE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("synthesis.languages")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }

    if config.tts.engine == EngineKind::Http && config.tts.url.trim().is_empty() {
        return invalid("TTS URL cannot be empty when tts.engine = \"http\"");
    }

    if config.synthesis.timeout_secs == 0 {
        return invalid("Synthesis timeout cannot be 0");
    }

    if config.synthesis.languages.is_empty() {
        return invalid("At least one synthesis language is required");
    }

    if !config
        .synthesis
        .languages
        .contains(&config.synthesis.default_language)
    {
        return Err(ConfigError::ValidationError(format!(
            "Default language '{}' is not in synthesis.languages",
            config.synthesis.default_language
        )));
    }

    if config.audio.compressed_format == AudioFormat::Wav {
        return invalid("Compressed download format cannot be wav");
    }

    if config.storage.max_upload_size == 0 {
        return invalid("Max upload size cannot be 0");
    }

    if config.storage.output_expire_secs > 0 && config.storage.gc_interval_secs == 0 {
        return invalid("GC interval cannot be 0 when output expiry is enabled");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.server.static_files.enabled {
        tracing::info!(
            "Static Files: {:?} at {}",
            config.server.static_files.dir,
            config.server.static_files.path
        );
    }
    tracing::info!("TTS Engine: {}", config.tts.engine);
    if config.tts.engine == EngineKind::Http {
        tracing::info!("TTS URL: {}", config.tts.url);
        tracing::info!("TTS Request Timeout: {}s", config.tts.timeout_secs);
    }
    tracing::info!("Synthesis Timeout: {}s", config.synthesis.timeout_secs);
    tracing::info!(
        "Languages: {} (default {})",
        config.synthesis.languages.join(", "),
        config.synthesis.default_language
    );
    tracing::info!(
        "Compressed Download: {} @ {} bps",
        config.audio.compressed_format,
        config.audio.bitrate
    );
    tracing::info!("Voices Directory: {:?}", config.storage.voices_dir);
    tracing::info!("Outputs Directory: {:?}", config.storage.outputs_dir);
    tracing::info!("Max Upload Size: {} bytes", config.storage.max_upload_size);
    if config.storage.output_expire_secs > 0 {
        tracing::info!(
            "Output Expire: {}s (GC every {}s)",
            config.storage.output_expire_secs,
            config.storage.gc_interval_secs
        );
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_tts_url_only_matters_for_http_engine() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());

        config.tts.engine = EngineKind::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_synthesis_timeout() {
        let mut config = AppConfig::default();
        config.synthesis.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_default_language() {
        let mut config = AppConfig::default();
        config.synthesis.default_language = "ja".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_wav_compressed_format() {
        let mut config = AppConfig::default();
        config.audio.compressed_format = AudioFormat::Wav;
        assert!(validate_config(&config).is_err());

        config.audio.compressed_format = AudioFormat::Mp3;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_gc_interval() {
        let mut config = AppConfig::default();
        config.storage.gc_interval_secs = 0;
        assert!(validate_config(&config).is_err());

        config.storage.output_expire_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voxclone.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[tts]
engine = "fake"

[synthesis]
languages = ["en", "hi"]
default_language = "hi"

[storage]
voices_dir = "/srv/voices"
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tts.engine, EngineKind::Fake);
        assert_eq!(config.synthesis.languages, vec!["en", "hi"]);
        assert_eq!(config.synthesis.default_language, "hi");
        assert_eq!(config.synthesis.timeout_secs, 120);
        assert_eq!(config.storage.voices_dir, std::path::PathBuf::from("/srv/voices"));
        assert_eq!(config.audio.compressed_format, AudioFormat::Mp3);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voxclone.toml");
        std::fs::write(&path, "[synthesis]\ntimeout_secs = 0\n").unwrap();

        let result = load_config_from_path(Some(&path));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
