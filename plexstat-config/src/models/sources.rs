use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub plex: FilePlexConfig,
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub refresh: FileRefreshConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilePlexConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
    /// Humantime duration such as `"30s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileRefreshConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// `"off"` or `"0"` disables the per-cycle deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Environment-derived configuration values, kept raw until composition so
/// malformed values are reported rather than dropped.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub plex_url: Option<String>,
    pub plex_token: Option<String>,
    pub plex_token_file: Option<PathBuf>,
    pub plex_request_timeout: Option<String>,
    pub http_host: Option<String>,
    pub http_port: Option<String>,
    pub refresh_interval: Option<String>,
    pub refresh_timeout: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            config_path: var("PLEXSTAT_CONFIG").map(PathBuf::from),
            plex_url: var("PLEX_URL"),
            plex_token: var("PLEX_TOKEN"),
            plex_token_file: var("PLEX_TOKEN_FILE").map(PathBuf::from),
            plex_request_timeout: var("PLEX_REQUEST_TIMEOUT"),
            http_host: var("HTTP_HOST"),
            http_port: var("HTTP_PORT"),
            refresh_interval: var("REFRESH_INTERVAL"),
            refresh_timeout: var("REFRESH_TIMEOUT"),
        }
    }
}
