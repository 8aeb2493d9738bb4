//! Ping Handler
//!
//! 健康检查，附带合成引擎状态

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 合成引擎是否可达
    pub engine: &'static str,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let engine = if state.synthesis.engine().health_check().await {
        "ok"
    } else {
        "unavailable"
    };

    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        engine,
    })
}
