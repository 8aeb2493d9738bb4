//! 内置页面（Train / Generate 两个标签页）

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
