//! Static chat page served at GET /

use axum::response::Html;

/// Bundled single-page chat UI
pub const INDEX_HTML: &str = include_str!("../../static/index.html");

pub async fn handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_serves_chat_page() {
        let Html(body) = handler().await;
        assert!(body.contains("<html"));
        assert!(body.contains("/chat"));
    }
}
