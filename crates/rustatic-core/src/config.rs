//! Configuration for the rustatic server.
//!
//! All configuration is driven by environment variables.

/// Global configuration for the static file server.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address for the listener.
    pub listen: String,
    /// Root location resources are served from: a `file:` directory URL or
    /// an `archive:file:...!/prefix` URL.
    pub base: String,
    /// Cache window in seconds, drives `Cache-Control` and `Expires`.
    pub cache_seconds: u32,
    /// When true, unserviceable requests (bad method, forbidden, not found)
    /// are passed to the next handler in the chain instead of being
    /// answered directly.
    pub pass_on_fail: bool,
    /// Reserved: directory index listings. Accepted but never acted on.
    pub dir_indexes: bool,
    /// Whether the channel is encrypted (TLS terminated ahead of the
    /// listener). Selects the chunked transfer path over the zero-copy
    /// region path.
    pub secure: bool,
    /// Log level.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            base: "file:./public".to_owned(),
            cache_seconds: 60,
            pass_on_fail: false,
            dir_indexes: false,
            secure: false,
            log_level: "info".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("RUSTATIC_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("RUSTATIC_BASE") {
            config.base = v;
        }
        if let Ok(v) = std::env::var("CACHE_SECONDS") {
            if let Ok(n) = v.parse() {
                config.cache_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("PASS_ON_FAIL") {
            config.pass_on_fail = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("DIR_INDEXES") {
            config.dir_indexes = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("SECURE_CHANNEL") {
            config.secure = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

fn parse_bool(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}
