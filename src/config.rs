use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub ollama_host: String,
    pub upstream_timeout: Duration,
    pub default_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            upstream_timeout: Duration::from_secs(20),
            default_model: "llama2".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let listen_addr = env::var("SERVER_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.listen_addr);

        let ollama_host = env::var("OLLAMA_HOST")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_host(&v))
            .unwrap_or(defaults.ollama_host);

        let upstream_timeout = env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);

        let default_model = env::var("DEFAULT_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_model);

        Ok(Self {
            listen_addr,
            ollama_host,
            upstream_timeout,
            default_model,
        })
    }
}

/// Accepts `host:port` as well as full URLs, like the Ollama CLI does.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
