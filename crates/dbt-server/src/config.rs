use std::path::PathBuf;

use dbt_api::DataPolicy;
use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DBT_JWT_SECRET is unset or still a placeholder; set it in your .env file")]
    WeakSecret,

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("DBT_SEED_DEMO is on but DBT_DEMO_PASSWORD is not set")]
    MissingDemoPassword,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub data_policy: DataPolicy,
    /// Password for seeded demo accounts; `Some` iff seeding is enabled.
    pub demo_password: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("DBT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::WeakSecret);
        }

        let db_path = lookup("DBT_DB_PATH").unwrap_or_else(|| "dbt-portal.db".into()).into();
        let host = lookup("DBT_HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port_raw = lookup("DBT_PORT").unwrap_or_else(|| "3000".into());
        let port = port_raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            name: "DBT_PORT",
            value: port_raw.clone(),
            reason: e.to_string(),
        })?;

        let data_policy = match lookup("DBT_DATA_MODE") {
            Some(mode) => mode.parse().map_err(|e: dbt_api::provider::UnknownDataMode| {
                ConfigError::Invalid {
                    name: "DBT_DATA_MODE",
                    value: mode.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DataPolicy::default(),
        };

        let seed_demo = match lookup("DBT_SEED_DEMO").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") | Some("no") => false,
            Some("1") | Some("true") | Some("yes") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "DBT_SEED_DEMO",
                    value: other.to_string(),
                    reason: "expected true or false".into(),
                });
            }
        };
        let demo_password = if seed_demo {
            match lookup("DBT_DEMO_PASSWORD") {
                Some(password) if !password.is_empty() => Some(password),
                _ => return Err(ConfigError::MissingDemoPassword),
            }
        } else {
            None
        };

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            data_policy,
            demo_password,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("DBT_JWT_SECRET", "s3cret-value")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("dbt-portal.db"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_policy, DataPolicy::LiveOrDemo);
        assert!(config.demo_password.is_none());
    }

    #[test]
    fn placeholder_secrets_are_refused() {
        assert!(matches!(config(&[]), Err(ConfigError::WeakSecret)));
        assert!(matches!(
            config(&[("DBT_JWT_SECRET", "dev-secret-change-me")]),
            Err(ConfigError::WeakSecret)
        ));
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("DBT_JWT_SECRET", "x1"), ("DBT_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("DBT_PORT"));

        let err = config(&[("DBT_JWT_SECRET", "x1"), ("DBT_DATA_MODE", "mixed")]).unwrap_err();
        assert!(err.to_string().starts_with("DBT_DATA_MODE"));
    }

    #[test]
    fn seeding_needs_a_password() {
        assert!(matches!(
            config(&[("DBT_JWT_SECRET", "x1"), ("DBT_SEED_DEMO", "true")]),
            Err(ConfigError::MissingDemoPassword)
        ));
        let config = config(&[
            ("DBT_JWT_SECRET", "x1"),
            ("DBT_SEED_DEMO", "true"),
            ("DBT_DEMO_PASSWORD", "demo-pass-123"),
            ("DBT_DATA_MODE", "demo"),
        ])
        .unwrap();
        assert_eq!(config.demo_password.as_deref(), Some("demo-pass-123"));
        assert_eq!(config.data_policy, DataPolicy::Demo);
    }
}
