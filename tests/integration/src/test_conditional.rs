//! Conditional requests and connection persistence.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{file_config, fixture_tree, raw_request, spawn_server};

    const READ_TIMEOUT: Duration = Duration::from_millis(800);

    #[tokio::test]
    async fn test_should_return_304_without_length_and_close() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        // Learn the resource's Last-Modified from a plain GET.
        let resp = reqwest::get(server.url("/assets/foo.css"))
            .await
            .expect("request");
        let last_modified = resp
            .headers()
            .get("Last-Modified")
            .and_then(|v| v.to_str().ok())
            .expect("last-modified header")
            .to_owned();

        let request = format!(
            "GET /assets/foo.css HTTP/1.1\r\nHost: test\r\nIf-Modified-Since: {last_modified}\r\n\r\n"
        );
        let (raw, eof) = raw_request(server.addr, &request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);

        assert!(head.starts_with("HTTP/1.1 304"), "got: {head}");
        assert!(!head.to_ascii_lowercase().contains("content-length"));
        assert!(eof, "server should close the connection after a 304");
    }

    #[tokio::test]
    async fn test_should_serve_body_when_client_copy_is_stale() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let client = reqwest::Client::new();
        let resp = client
            .get(server.url("/assets/foo.css"))
            .header("If-Modified-Since", "Mon, 01 Jan 1990 00:00:00 GMT")
            .send()
            .await
            .expect("request");

        assert_eq!(resp.status(), 200);
        let body = resp.bytes().await.expect("body");
        assert_eq!(body.as_ref(), b"* { margin:0; }");
    }

    #[tokio::test]
    async fn test_should_keep_http11_connection_alive_after_get() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let request = "GET /assets/foo.css HTTP/1.1\r\nHost: test\r\n\r\n";
        let (raw, eof) = raw_request(server.addr, request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);

        assert!(head.starts_with("HTTP/1.1 200"), "got: {head}");
        assert!(!eof, "server should keep the connection open");
    }

    #[tokio::test]
    async fn test_should_close_connection_when_client_asks() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let request =
            "GET /assets/foo.css HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n";
        let (raw, eof) = raw_request(server.addr, request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);

        assert!(head.starts_with("HTTP/1.1 200"), "got: {head}");
        assert!(eof, "server should close when the client asked to");
    }

    #[tokio::test]
    async fn test_should_close_http10_connection_by_default() {
        let dir = fixture_tree();
        let server = spawn_server(file_config(dir.path())).await;

        let request = "GET /assets/foo.css HTTP/1.0\r\nHost: test\r\n\r\n";
        let (raw, eof) = raw_request(server.addr, request, READ_TIMEOUT).await;
        let head = String::from_utf8_lossy(&raw);

        assert!(head.starts_with("HTTP/1.0 200") || head.starts_with("HTTP/1.1 200"));
        assert!(eof, "HTTP/1.0 without keep-alive should close");
    }
}
