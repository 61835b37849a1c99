//! Serving happy paths: directory and archive bases, HEAD, MIME fallback.

#[cfg(test)]
mod tests {
    use rustatic_http::StaticHttpConfig;

    use crate::{file_config, fixture_archive, fixture_tree, spawn_server};

    #[tokio::test]
    async fn test_should_serve_file_byte_for_byte() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let resp = reqwest::get(server.url("/assets/foo.css"))
            .await
            .expect("request");

        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("text/css"),
        );
        assert_eq!(
            resp.headers()
                .get("Cache-Control")
                .and_then(|v| v.to_str().ok()),
            Some("private, max-age=60"),
        );
        assert!(resp.headers().contains_key("Date"));
        assert!(resp.headers().contains_key("Expires"));
        assert!(resp.headers().contains_key("Last-Modified"));

        let body = resp.bytes().await.expect("body");
        assert_eq!(body.as_ref(), b"* { margin:0; }");
    }

    #[tokio::test]
    async fn test_should_serve_archive_entry_byte_for_byte() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = fixture_archive(dir.path());
        let config = StaticHttpConfig {
            base: format!("archive:file:{}!/assets", archive.display()),
            ..StaticHttpConfig::default()
        };
        let server = spawn_server(config).await;

        let resp = reqwest::get(server.url("/foo.css")).await.expect("request");

        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("text/css"),
        );
        let body = resp.bytes().await.expect("body");
        assert_eq!(body.as_ref(), b"* { margin:0; }");
    }

    #[tokio::test]
    async fn test_should_answer_head_with_headers_and_no_body() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let client = reqwest::Client::new();
        let resp = client
            .head(server.url("/assets/foo.css"))
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get("Content-Length")
                .and_then(|v| v.to_str().ok()),
            Some("15"),
        );
        let body = resp.bytes().await.expect("body");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_should_omit_content_type_for_unknown_extensions() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let resp = reqwest::get(server.url("/data.xyzzy")).await.expect("request");

        assert_eq!(resp.status(), 200);
        assert!(!resp.headers().contains_key("Content-Type"));
    }

    #[tokio::test]
    async fn test_should_answer_health_probe() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let resp = reqwest::get(server.url("/_health")).await.expect("request");
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json");
        assert_eq!(body["status"], "running");
    }
}
