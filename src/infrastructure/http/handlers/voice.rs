//! Voice HTTP Handlers - 训练、列表、原声试听

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::application::{AudioDownload, GetVoiceSample, ListVoices, TrainVoice};
use crate::infrastructure::http::dto::{ApiResponse, VoiceItem};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 训练音色（上传参考音频）
///
/// multipart 字段: `username`, `file`
pub async fn train_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<VoiceItem>>, ApiError> {
    let mut command = TrainVoice {
        username: None,
        file_name: None,
        audio_data: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "username" => {
                command.username = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read username: {}", e))
                })?);
            }
            "file" => {
                command.file_name = field.file_name().map(|s| s.to_string());
                command.audio_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let result = state.train_voice_handler.handle(command).await?;

    Ok(Json(ApiResponse::success(VoiceItem {
        id: result.record.id.to_string(),
        label: result.record.display_label(),
        username: result.record.username,
        created_at: result.record.created_at.to_rfc3339(),
    })))
}

/// 获取音色列表（最新在前）
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<VoiceItem>>>, ApiError> {
    let voices = state.list_voices_handler.handle(ListVoices).await?;
    Ok(Json(ApiResponse::success(
        voices.into_iter().map(VoiceItem::from).collect(),
    )))
}

/// 试听原始参考音频
pub async fn voice_sample(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    let sample = state
        .voice_sample_handler
        .handle(GetVoiceSample { username })
        .await?;
    Ok(audio_response(sample, "inline"))
}

/// 音频响应，带 Content-Disposition
pub(crate) fn audio_response(download: AudioDownload, disposition: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(disposition, &download.file_name),
            ),
        ],
        download.audio_data,
    )
        .into_response()
}

/// 非 ASCII 文件名走 RFC 5987 `filename*`，同时给出 ASCII 回退
fn content_disposition(disposition: &str, file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    if fallback == file_name {
        return format!("{}; filename=\"{}\"", disposition, file_name);
    }

    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("attachment", "Anurag_clone.wav"),
            "attachment; filename=\"Anurag_clone.wav\""
        );
    }

    #[test]
    fn test_content_disposition_unicode() {
        let value = content_disposition("attachment", "José_clone.wav");
        assert!(value.starts_with("attachment; filename=\"Jos__clone.wav\""));
        assert!(value.ends_with("filename*=UTF-8''Jos%C3%A9_clone.wav"));
        assert!(value.is_ascii());
    }
}
