pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

pub const BACKEND_URL_ENV: &str = "BACKEND_URL";
pub const LISTEN_ADDR_ENV: &str = "SQUAT_HTTP";

/// Process-wide settings, read once at startup and handed to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Base URL of the backend, without a trailing slash.
    pub backend_url: String,
    pub listen_addr: String,
}

impl ProxyConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url.into()),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = lookup(BACKEND_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());
        let listen_addr = lookup(LISTEN_ADDR_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        Self {
            backend_url: normalize_base_url(backend_url),
            listen_addr,
        }
    }

    pub fn squat_endpoint(&self) -> String {
        format!("{}/api/squat", self.backend_url)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_defaults_when_unset() {
        let config = ProxyConfig::from_lookup(|_| None);
        assert_eq!(config.backend_url, "http://localhost:5000");
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.squat_endpoint(), "http://localhost:5000/api/squat");
    }

    #[test]
    fn empty_backend_url_counts_as_unset() {
        let config = ProxyConfig::from_lookup(|key| (key == BACKEND_URL_ENV).then(String::new));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = ProxyConfig::from_lookup(|key| match key {
            BACKEND_URL_ENV => Some("http://pose.internal:8080//".into()),
            LISTEN_ADDR_ENV => Some("0.0.0.0:8000".into()),
            _ => None,
        });
        assert_eq!(config.squat_endpoint(), "http://pose.internal:8080/api/squat");
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
    }
}
