//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VoiceError;

/// 音色唯一标识（仅存储，不用于查找）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(Uuid);

impl VoiceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户名
///
/// 不变量:
/// - 去除首尾空白后非空
/// - 长度不超过 100 字符
/// - `file_stem()` 只包含字母数字、`-`、`_`，不会逃逸出存储目录
/// - `file_stem()` 不超过 `MAX_STEM_BYTES` 字节（多字节字符按字符边界截断）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub const MAX_LEN: usize = 100;
    /// 文件名主干的字节上限，加上 `_model.json` 与临时文件前后缀后仍低于 255
    pub const MAX_STEM_BYTES: usize = 150;

    pub fn new(name: impl AsRef<str>) -> Result<Self, VoiceError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(VoiceError::InvalidUsername(
                "用户名不能为空".to_string(),
            ));
        }
        if name.chars().count() > Self::MAX_LEN {
            return Err(VoiceError::InvalidUsername(format!(
                "用户名长度不能超过{}字符",
                Self::MAX_LEN
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 文件名主干：非字母数字、`-`、`_` 的字符一律替换为 `_`
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len().min(Self::MAX_STEM_BYTES));
        for c in self.0.chars() {
            let c = if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            };
            if stem.len() + c.len_utf8() > Self::MAX_STEM_BYTES {
                break;
            }
            stem.push(c);
        }
        stem
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 参考音频格式（上传时允许的扩展名）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Wav,
    Mp3,
    M4a,
    Flac,
    Ogg,
}

impl SampleFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "m4a" => Some(Self::M4a),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }

    /// 从上传文件名推断格式，无扩展名时按 WAV 处理
    pub fn from_file_name(file_name: Option<&str>) -> Result<Self, VoiceError> {
        let ext = file_name
            .map(std::path::Path::new)
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str());

        match ext {
            None => Ok(Self::Wav),
            Some(ext) => Self::from_extension(ext)
                .ok_or_else(|| VoiceError::UnsupportedFormat(ext.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::M4a => "audio/mp4",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
        }
    }
}

/// 表现力（情绪强度），传给合成引擎的 temperature
///
/// 取值范围 0.5（平静）到 0.8（夸张），超出范围时截断
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expressiveness(f32);

impl Expressiveness {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 0.8;
    pub const DEFAULT: f32 = 0.65;

    pub fn clamped(value: f32) -> Self {
        if !value.is_finite() {
            return Self(Self::DEFAULT);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Expressiveness {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// 合成参数
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// 语言代码，如 "en"
    pub language: String,
    pub expressiveness: Expressiveness,
}

impl SynthesisParams {
    pub fn new(language: impl AsRef<str>, expressiveness: f32) -> Result<Self, VoiceError> {
        let language = language.as_ref().trim();
        if language.is_empty() {
            return Err(VoiceError::InvalidParams("语言不能为空".to_string()));
        }
        Ok(Self {
            language: language.to_string(),
            expressiveness: Expressiveness::clamped(expressiveness),
        })
    }
}
