use std::time::Duration;

use thiserror::Error;
use url::Host;

use crate::models::Config;

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const LOW_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("Plex URL scheme '{scheme}' is not supported; use http or https")]
    UnsupportedScheme { scheme: String },
    #[error("Plex URL has no host")]
    MissingHost,
    #[error("Plex token is empty")]
    EmptyToken,
    #[error("refresh interval {interval:?} is below the {minimum:?} minimum")]
    IntervalTooShort {
        interval: Duration,
        minimum: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let url = &config.plex.url;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigGuardRailError::UnsupportedScheme {
                scheme: other.to_string(),
            });
        }
    }

    let Some(host) = url.host() else {
        return Err(ConfigGuardRailError::MissingHost);
    };

    if config.plex.token.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyToken);
    }

    let interval = config.refresh.interval;
    if interval < MIN_REFRESH_INTERVAL {
        return Err(ConfigGuardRailError::IntervalTooShort {
            interval,
            minimum: MIN_REFRESH_INTERVAL,
        });
    }

    if interval < LOW_REFRESH_INTERVAL {
        warnings.push_with_hint(
            format!(
                "Refresh interval {} is short; every cycle lists all libraries",
                humantime::format_duration(interval)
            ),
            "Set REFRESH_INTERVAL to a few minutes unless the server is local",
        );
    }

    if let Some(timeout) = config.refresh.timeout
        && timeout >= interval
    {
        warnings.push_with_hint(
            format!(
                "Refresh timeout {} is not shorter than the interval {}",
                humantime::format_duration(timeout),
                humantime::format_duration(interval)
            ),
            "A hung cycle will swallow the following ticks; lower REFRESH_TIMEOUT",
        );
    }

    if url.scheme() == "http" && !is_loopback(&host) {
        warnings.push_with_hint(
            format!("Plex token will be sent over plain http to {host}"),
            "Use an https PLEX_URL when the server is not on this machine",
        );
    }

    Ok(warnings)
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(addr) => addr.is_loopback(),
        Host::Ipv6(addr) => addr.is_loopback(),
    }
}
