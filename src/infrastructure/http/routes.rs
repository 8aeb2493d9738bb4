//! HTTP Routes
//!
//! API Endpoints:
//! - /                                  GET   内置页面（Train / Generate）
//! - /api/ping                          GET   健康检查
//! - /api/voice/train                   POST  训练音色（multipart: username, file）
//! - /api/voice/list                    GET   音色列表
//! - /api/voice/sample/:username        GET   原声试听
//! - /api/screen/generate               GET   生成页视图
//! - /api/generate                      POST  合成语音
//! - /api/output/:output_id/:format     GET   下载 wav / mp3 / opus

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/voice", voice_routes())
        .route("/screen/generate", get(handlers::generate_screen))
        .route("/generate", post(handlers::generate_speech))
        .route("/output/:output_id/:format", get(handlers::download_output))
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/train", post(handlers::train_voice))
        .route("/list", get(handlers::list_voices))
        .route("/sample/:username", get(handlers::voice_sample))
}
