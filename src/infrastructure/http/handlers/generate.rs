//! Generate HTTP Handlers - 生成页视图、合成、下载

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{AudioFormat, GenerateSpeech, GetGenerateScreen, GetGeneratedAudio};
use crate::infrastructure::http::dto::{
    ApiResponse, DownloadParams, GenerateRequest, GenerateResponse, GenerateScreenResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

use super::voice::audio_response;

/// 生成页视图模型
pub async fn generate_screen(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<GenerateScreenResponse>>, ApiError> {
    let view = state
        .generate_screen_handler
        .handle(GetGenerateScreen)
        .await?;
    Ok(Json(ApiResponse::success(view.into())))
}

/// 合成语音，阻塞直到完成
pub async fn generate_speech(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, ApiError> {
    let command = GenerateSpeech {
        username: req.username,
        text: req.text,
        language: req.language,
        expressiveness: req.expressiveness,
    };

    let result = state.generate_speech_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

/// 下载合成结果
///
/// `format`: wav | mp3 | opus，`?name=` 决定文件名
pub async fn download_output(
    State(state): State<Arc<AppState>>,
    Path((output_id, format)): Path<(String, String)>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let output_id: Uuid = output_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid output id: {}", output_id)))?;
    let format: AudioFormat = format
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown download format: {}", format)))?;

    let download = state
        .generated_audio_handler
        .handle(GetGeneratedAudio {
            output_id,
            format,
            username: params.name,
        })
        .await?;

    Ok(audio_response(download, "attachment"))
}
