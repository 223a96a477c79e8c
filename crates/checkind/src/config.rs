/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind (default: 0.0.0.0).
    pub bind_addr: String,
    /// TCP port (default: 5000).
    pub port: u16,
    /// Cosine similarity threshold for a positive identification.
    pub similarity_threshold: f32,
    /// Upper bound on request bodies, images included.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            similarity_threshold: 0.92,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from `PORT` and `CHECKIN_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("CHECKIN_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: env_parse("PORT", defaults.port),
            similarity_threshold: env_parse(
                "CHECKIN_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
            max_upload_bytes: env_parse("CHECKIN_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }

    /// `host:port` string to bind the listener to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let config = Config {
            bind_addr: "127.0.0.1".into(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("CHECKIN_TEST_GARBAGE_PORT", "not-a-port");
        assert_eq!(env_parse("CHECKIN_TEST_GARBAGE_PORT", 5000u16), 5000);
        std::env::remove_var("CHECKIN_TEST_GARBAGE_PORT");
    }
}
