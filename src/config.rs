/// Configuration management for the moderation client
use crate::{
    auth::Role,
    error::{ModerationError, ModerationResult},
};
use serde::{Deserialize, Serialize};
use std::env;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub queue: QueueConfig,
    pub logging: LoggingConfig,
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Signed-in user the CLI acts as
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub user_id: i64,
    pub role: Option<Role>,
}

/// Queue behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Refuse a second transition on an id while one is outstanding
    pub guard_in_flight: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON log lines instead of plain text
    pub json: bool,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ModerationResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ModerationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("EESA_API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();
        let token = lookup("EESA_API_TOKEN").filter(|t| !t.trim().is_empty());
        let timeout_secs = lookup("EESA_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ModerationError::Config("Invalid HTTP timeout".to_string()))?;
        let user_agent = lookup("EESA_USER_AGENT")
            .unwrap_or_else(|| format!("eesa-moderation/{}", env!("CARGO_PKG_VERSION")));

        let role = match lookup("EESA_USER_ROLE") {
            Some(r) if !r.trim().is_empty() => Some(
                Role::from_str(r.trim()).map_err(|e| ModerationError::Config(e.to_string()))?,
            ),
            _ => None,
        };
        let user_id = lookup("EESA_USER_ID")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .map_err(|_| ModerationError::Config("Invalid user id".to_string()))?;

        let guard_in_flight = lookup("EESA_GUARD_IN_FLIGHT")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .unwrap_or(true);

        let log_level = lookup("EESA_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = lookup("EESA_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ClientConfig {
            api: ApiConfig {
                base_url,
                token,
                timeout_secs,
                user_agent,
            },
            session: SessionConfig { user_id, role },
            queue: QueueConfig { guard_in_flight },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ModerationResult<()> {
        if self.api.base_url.is_empty() {
            return Err(ModerationError::Config("API base URL cannot be empty".to_string()));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ModerationError::Config(format!(
                "API base URL must be http(s): {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ModerationError::Config(
                "HTTP timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 10);
        assert!(config.api.token.is_none());
        assert!(config.session.role.is_none());
        assert!(config.queue.guard_in_flight);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("EESA_API_BASE_URL", "https://api.eesa.example/"),
            ("EESA_API_TOKEN", "secret"),
            ("EESA_USER_ROLE", "tech_head"),
            ("EESA_USER_ID", "42"),
            ("EESA_GUARD_IN_FLIGHT", "false"),
            ("EESA_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.eesa.example");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.session.role, Some(Role::TechHead));
        assert_eq!(config.session.user_id, 42);
        assert!(!config.queue.guard_in_flight);
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_role_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[("EESA_USER_ROLE", "janitor")]));
        assert!(matches!(result, Err(ModerationError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url_and_timeout() {
        let mut config = ClientConfig::from_lookup(lookup_from(&[
            ("EESA_API_BASE_URL", "ftp://files"),
        ]))
        .unwrap();
        assert!(config.validate().is_err());

        config.api.base_url = "http://localhost:8000".to_string();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
