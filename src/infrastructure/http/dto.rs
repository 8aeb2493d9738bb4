//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{GenerateScreenView, GenerateSpeechResponse, VoiceResponse};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VoiceItem {
    pub id: String,
    pub username: String,
    pub label: String,
    pub created_at: String,
}

impl From<VoiceResponse> for VoiceItem {
    fn from(v: VoiceResponse) -> Self {
        Self {
            id: v.id,
            username: v.username,
            label: v.label,
            created_at: v.created_at,
        }
    }
}

// ============================================================================
// Generate DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ExpressivenessRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

/// 生成页视图
#[derive(Debug, Serialize)]
pub struct GenerateScreenResponse {
    pub voices: Vec<VoiceItem>,
    pub skipped_entries: usize,
    pub synthesis_enabled: bool,
    pub notice: String,
    pub languages: Vec<String>,
    pub default_language: String,
    pub default_text: String,
    pub expressiveness: ExpressivenessRange,
    pub download_formats: Vec<String>,
}

impl From<GenerateScreenView> for GenerateScreenResponse {
    fn from(view: GenerateScreenView) -> Self {
        Self {
            voices: view.voices.into_iter().map(VoiceItem::from).collect(),
            skipped_entries: view.skipped_entries,
            synthesis_enabled: view.synthesis_enabled,
            notice: view.notice,
            languages: view.languages,
            default_language: view.default_language,
            default_text: view.default_text,
            expressiveness: ExpressivenessRange {
                min: view.expressiveness_min,
                max: view.expressiveness_max,
                default: view.expressiveness_default,
            },
            download_formats: view
                .download_formats
                .iter()
                .map(|f| f.extension().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub expressiveness: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub output_id: Uuid,
    pub username: String,
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
    pub size_bytes: u64,
}

impl From<GenerateSpeechResponse> for GenerateResponse {
    fn from(r: GenerateSpeechResponse) -> Self {
        Self {
            output_id: r.output_id,
            username: r.username,
            duration_ms: r.duration_ms,
            sample_rate: r.sample_rate,
            size_bytes: r.size_bytes,
        }
    }
}

/// 下载参数
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// 用于生成 `<name>_clone.<ext>` 文件名
    #[serde(default)]
    pub name: Option<String>,
}
