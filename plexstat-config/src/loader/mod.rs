mod error;

pub use error::ConfigLoadError;

use std::{
    fs,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use tracing::debug;
use url::Url;

use crate::{
    models::{
        Config, ConfigMetadata, ConfigOverrides, DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT,
        DEFAULT_REFRESH_INTERVAL, DEFAULT_REFRESH_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
        PlexConfig, RefreshConfig, ServerConfig,
        sources::{EnvConfig, FileConfig},
    },
    util::{parse_duration, parse_optional_duration, parse_port, read_secret_file},
    validation::{self, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("plexstat.toml"),
        PathBuf::from("config/plexstat.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.options.overrides = overrides;
        self
    }

    /// Loads `.env`, then the process environment, then the config file.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Loads against an already gathered environment; the process
    /// environment is not consulted.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        if let Some(path) = &config_path {
            debug!(path = %path.display(), "loaded configuration file");
        }
        self.compose_config(file_config, env, config_path)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (Some(path.clone()), true),
            (None, None) => (
                DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .find(|candidate| candidate.exists())
                    .cloned(),
                false,
            ),
        };

        let Some(path) = path else {
            return Ok((None, None));
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();
        let overrides = &self.options.overrides;

        if file_config.is_none() && env.plex_url.is_none() && overrides.plex_url.is_none() {
            warnings.push_with_hint(
                "No plexstat.toml detected and PLEX_URL is unset",
                "Pass --url, set PLEX_URL, or create plexstat.toml with a [plex] section",
            );
        }

        let FileConfig {
            plex: file_plex,
            server: file_server,
            refresh: file_refresh,
        } = file_config.unwrap_or_default();

        let raw_url = overrides
            .plex_url
            .clone()
            .or(env.plex_url)
            .or(file_plex.url)
            .ok_or(ConfigLoadError::MissingRequired {
                field: "Plex URL",
                env: "PLEX_URL",
                toml_key: "plex.url",
            })?;
        let url = Url::parse(raw_url.trim()).map_err(|source| {
            ConfigLoadError::InvalidPlexUrl {
                value: raw_url.clone(),
                source,
            }
        })?;

        let token = match overrides.plex_token.clone().or(env.plex_token) {
            Some(token) => Some(token),
            None => match env.plex_token_file.as_deref() {
                Some(path) => read_secret_file(path)?,
                None => None,
            },
        };
        let token = match token.or(file_plex.token) {
            Some(token) => Some(token),
            None => match file_plex.token_file.as_deref() {
                Some(path) => read_secret_file(path)?,
                None => None,
            },
        }
        .ok_or(ConfigLoadError::MissingRequired {
            field: "Plex token",
            env: "PLEX_TOKEN",
            toml_key: "plex.token",
        })?;

        let request_timeout = match env.plex_request_timeout {
            Some(raw) => parse_duration("PLEX_REQUEST_TIMEOUT", &raw)?,
            None => match file_plex.request_timeout {
                Some(raw) => parse_duration("plex.request_timeout", &raw)?,
                None => DEFAULT_REQUEST_TIMEOUT,
            },
        };

        let port = match (overrides.http_port, env.http_port) {
            (Some(port), _) => port,
            (None, Some(raw)) => parse_port("HTTP_PORT", &raw)?,
            (None, None) => file_server.port.unwrap_or(DEFAULT_HTTP_PORT),
        };
        let server = ServerConfig {
            host: overrides
                .http_host
                .clone()
                .or(env.http_host)
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HTTP_HOST.to_string()),
            port,
        };

        let interval = match (overrides.refresh_interval, env.refresh_interval) {
            (Some(interval), _) => interval,
            (None, Some(raw)) => parse_duration("REFRESH_INTERVAL", &raw)?,
            (None, None) => match file_refresh.interval {
                Some(raw) => parse_duration("refresh.interval", &raw)?,
                None => DEFAULT_REFRESH_INTERVAL,
            },
        };
        let timeout = match env.refresh_timeout {
            Some(raw) => parse_optional_duration("REFRESH_TIMEOUT", &raw)?,
            None => match file_refresh.timeout {
                Some(raw) => parse_optional_duration("refresh.timeout", &raw)?,
                None => Some(DEFAULT_REFRESH_TIMEOUT),
            },
        };

        let config = Config {
            plex: PlexConfig {
                url,
                token,
                request_timeout,
            },
            server,
            refresh: RefreshConfig { interval, timeout },
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded: false,
            },
        };

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
