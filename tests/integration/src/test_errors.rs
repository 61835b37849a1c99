//! Unserviceable requests: missing resources, directories, bad methods,
//! and traversal attempts.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{file_config, fixture_tree, raw_request, spawn_server};

    const READ_TIMEOUT: Duration = Duration::from_millis(800);

    #[tokio::test]
    async fn test_should_answer_404_for_missing_asset() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let resp = reqwest::get(server.url("/assets/foo.bar"))
            .await
            .expect("request");
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_should_answer_403_for_directory() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let resp = reqwest::get(server.url("/assets")).await.expect("request");
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn test_should_answer_403_for_root_path() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let resp = reqwest::get(server.url("/")).await.expect("request");
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn test_should_answer_400_for_post_and_close() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let request = "POST /assets/foo.css HTTP/1.1\r\nHost: test\r\nContent-Length: 0\r\n\r\n";
        let (raw, eof) = raw_request(server.addr, request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);

        assert!(head.starts_with("HTTP/1.1 400"), "got: {head}");
        assert!(eof, "400 responses should close the connection");
    }

    #[tokio::test]
    async fn test_should_forbid_traversal_attempts() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        for path in [
            "/../etc/passwd",
            "/assets/../../etc/passwd",
            "/assets/%2e%2e/secret",
            "/.git/config",
        ] {
            let request = format!("GET {path} HTTP/1.1\r\nHost: test\r\n\r\n");
            let (raw, _eof) = raw_request(server.addr, &request, READ_TIMEOUT).await;
            let head = String::from_utf8_lossy(&raw);
            assert!(head.starts_with("HTTP/1.1 403"), "path {path} got: {head}");
        }
    }

    #[tokio::test]
    async fn test_should_answer_400_for_oversized_target() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let request = format!(
            "GET /{} HTTP/1.1\r\nHost: test\r\n\r\n",
            "a".repeat(9 * 1024),
        );
        let (raw, eof) = raw_request(server.addr, &request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);

        assert!(head.starts_with("HTTP/1.1 4"), "got: {head}");
        assert!(eof, "oversized requests should close the connection");
    }

    #[tokio::test]
    async fn test_should_hide_hidden_files() {
        let dir = fixture_tree();
        std::fs::write(dir.path().join(".env"), "SECRET=1").expect("write");
        let server = spawn_server(file_config(dir.path())).await;

        let request = "GET /.env HTTP/1.1\r\nHost: test\r\n\r\n";
        let (raw, _eof) = raw_request(server.addr, request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);
        assert!(head.starts_with("HTTP/1.1 403"), "got: {head}");
    }
}
