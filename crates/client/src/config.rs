use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_SESSION_DIR: &str = ".hamro-ward";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL (default: `http://localhost:8000`).
    pub api_url: String,
    /// Directory holding the persisted session (default: `.hamro-ward`).
    pub session_dir: PathBuf,
    /// Per-request timeout. `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HAMRO_API_URL`              | `http://localhost:8000` |
    /// | `HAMRO_SESSION_DIR`          | `.hamro-ward`           |
    /// | `HAMRO_REQUEST_TIMEOUT_SECS` | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_url = non_blank("HAMRO_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: "HAMRO_API_URL",
                expected: "an http(s) URL",
                value: api_url,
            });
        }

        let session_dir = non_blank("HAMRO_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR));

        let request_timeout = match non_blank("HAMRO_REQUEST_TIMEOUT_SECS") {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "HAMRO_REQUEST_TIMEOUT_SECS",
                        expected: "a positive integer",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            api_url,
            session_dir,
            request_timeout,
        })
    }
}
