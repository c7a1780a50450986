pub mod sources;

use std::{fmt, path::PathBuf, time::Duration};

use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub const DEFAULT_HTTP_PORT: u16 = 9090;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub plex: PlexConfig,
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Clone)]
pub struct PlexConfig {
    pub url: Url,
    pub token: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for PlexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexConfig")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` as accepted by a TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    pub interval: Duration,
    /// `None` when cycles run without a deadline.
    pub timeout: Option<Duration>,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub plex_url: Option<String>,
    pub plex_token: Option<String>,
    pub http_host: Option<String>,
    pub http_port: Option<u16>,
    pub refresh_interval: Option<Duration>,
}
