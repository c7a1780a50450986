use std::{fs, path::Path, time::Duration};

use crate::loader::ConfigLoadError;

/// Parses a humantime duration (`"90s"`, `"10m"`, `"1h 30m"`). A bare
/// integer is read as seconds.
pub fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigLoadError> {
    let trimmed = raw.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(trimmed).map_err(|source| ConfigLoadError::InvalidDuration {
        key,
        value: raw.to_string(),
        source,
    })
}

/// Like [`parse_duration`], but `"off"`, `"none"`, `"disabled"` and a zero
/// duration mean no limit.
pub fn parse_optional_duration(
    key: &'static str,
    raw: &str,
) -> Result<Option<Duration>, ConfigLoadError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" | "none" | "disabled" => Ok(None),
        _ => parse_duration(key, raw).map(|d| (!d.is_zero()).then_some(d)),
    }
}

pub fn parse_port(key: &'static str, raw: &str) -> Result<u16, ConfigLoadError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigLoadError::InvalidPort {
            key,
            value: raw.to_string(),
        })
}

/// Reads a secret from a file, trimming surrounding whitespace. An empty file
/// yields `None`.
pub fn read_secret_file(path: &Path) -> Result<Option<String>, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::SecretFileIo {
        path: path.to_path_buf(),
        source,
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_accept_humantime_and_bare_seconds() {
        assert_eq!(parse_duration("k", "10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("k", "1h 30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("k", " 45 ").unwrap(), Duration::from_secs(45));
        assert!(matches!(
            parse_duration("refresh.interval", "soon"),
            Err(ConfigLoadError::InvalidDuration { key: "refresh.interval", .. })
        ));
    }

    #[test]
    fn optional_duration_can_be_disabled() {
        assert_eq!(parse_optional_duration("k", "off").unwrap(), None);
        assert_eq!(parse_optional_duration("k", "0").unwrap(), None);
        assert_eq!(parse_optional_duration("k", "0s").unwrap(), None);
        assert_eq!(
            parse_optional_duration("k", "5m").unwrap(),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn port_must_fit_u16() {
        assert_eq!(parse_port("k", "9090").unwrap(), 9090);
        assert!(parse_port("k", "70000").is_err());
        assert!(parse_port("k", "http").is_err());
    }
}
