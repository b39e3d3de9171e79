use chrono::Duration;

use crate::errors::ConfigError;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_DEDUP_WINDOW_SECS: i64 = 120;
const DEFAULT_PORT: u16 = 8080;

/// Settings for a client session against the messaging backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth_token: String,
    pub user_id: String,
    /// How far apart a local message and its backend echo may be stamped.
    pub dedup_window: Duration,
}

impl ClientConfig {
    pub fn new(
        api_base_url: impl Into<String>,
        auth_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            auth_token: auth_token.into(),
            user_id: user_id.into(),
            dedup_window: Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS),
        }
    }

    /// Reads `MESSAGING_*` variables. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url =
            var("MESSAGING_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let auth_token = required(&var, "MESSAGING_AUTH_TOKEN")?;
        let user_id = required(&var, "MESSAGING_USER_ID")?;

        let dedup_window = match var("MESSAGING_DEDUP_WINDOW_SECS") {
            Some(raw) => {
                let secs: i64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "MESSAGING_DEDUP_WINDOW_SECS",
                    value: raw.clone(),
                })?;
                if secs < 0 {
                    return Err(ConfigError::Invalid {
                        name: "MESSAGING_DEDUP_WINDOW_SECS",
                        value: raw,
                    });
                }
                Duration::seconds(secs)
            }
            None => Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS),
        };

        Ok(Self { api_base_url, auth_token, user_id, dedup_window })
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }
}

/// Settings for the development gateway server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self { port })
    }
}

fn required(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match var(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { name }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn client_config_reads_messaging_vars() {
        let config = ClientConfig::from_vars(vars(&[
            ("MESSAGING_API_BASE_URL", "https://api.example.com/v1"),
            ("MESSAGING_AUTH_TOKEN", "secret"),
            ("MESSAGING_USER_ID", "U1"),
            ("MESSAGING_DEDUP_WINDOW_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com/v1");
        assert_eq!(config.auth_token, "secret");
        assert_eq!(config.user_id, "U1");
        assert_eq!(config.dedup_window, Duration::seconds(30));
    }

    #[test]
    fn client_config_defaults_base_url_and_window() {
        let config = ClientConfig::from_vars(vars(&[
            ("MESSAGING_AUTH_TOKEN", "secret"),
            ("MESSAGING_USER_ID", "U1"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.dedup_window, Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS));
    }

    #[test]
    fn client_config_requires_token_and_user() {
        let err = ClientConfig::from_vars(vars(&[("MESSAGING_USER_ID", "U1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { name: "MESSAGING_AUTH_TOKEN" }));

        let err = ClientConfig::from_vars(vars(&[
            ("MESSAGING_AUTH_TOKEN", "secret"),
            ("MESSAGING_USER_ID", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { name: "MESSAGING_USER_ID" }));
    }

    #[test]
    fn client_config_rejects_bad_dedup_window() {
        for raw in ["-5", "two minutes"] {
            let err = ClientConfig::from_vars(vars(&[
                ("MESSAGING_AUTH_TOKEN", "secret"),
                ("MESSAGING_USER_ID", "U1"),
                ("MESSAGING_DEDUP_WINDOW_SECS", raw),
            ]))
            .unwrap_err();
            match err {
                ConfigError::Invalid { name, value } => {
                    assert_eq!(name, "MESSAGING_DEDUP_WINDOW_SECS");
                    assert_eq!(value, raw);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn client_config_from_process_env() {
        std::env::set_var("MESSAGING_AUTH_TOKEN", "env-token");
        std::env::set_var("MESSAGING_USER_ID", "env-user");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.auth_token, "env-token");
        assert_eq!(config.user_id, "env-user");
    }

    #[test]
    fn new_uses_default_dedup_window() {
        let config = ClientConfig::new("http://api", "token", "U1");
        assert_eq!(config.dedup_window, Duration::seconds(120));

        let config = config.with_dedup_window(Duration::seconds(5));
        assert_eq!(config.dedup_window, Duration::seconds(5));
    }
}
