use api::config::{AuthConfig, CorsConfig, Listener, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

const API_KEY_ENV: &str = "DASHBOARD_API_KEY";
const JWT_SECRET_ENV: &str = "DASHBOARD_JWT_SECRET";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: LogFormat::default(),
            sentry_dsn: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub listener: Listener,
    pub admin_listener: Listener,
    #[serde(default)]
    pub upstream: upstream::config::Config,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
}

impl Config {
    /// Loads the config file and applies secrets from the environment on top of it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let mut config: Config = serde_yaml::from_reader(file)?;
        config.apply_overrides(|name| std::env::var(name).ok());

        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(API_KEY_ENV) {
            self.upstream.api_key = api_key;
        }

        if let AuthConfig::SelfIssued(auth) = &mut self.auth
            && let Some(secret) = lookup(JWT_SECRET_ENV)
        {
            auth.secret = secret;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        if self.listener == self.admin_listener {
            return Err(ConfigError::ListenerConflict);
        }

        if self.upstream.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        self.auth.validate()?;
        self.cors.validate()?;

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
    #[error("listener and admin_listener must bind different addresses")]
    ListenerConflict,
    #[error("upstream.api_key is empty and {API_KEY_ENV} is not set")]
    MissingApiKey,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_prefix() -> String {
    "dashboard".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).expect("parse config")
    }

    const MINIMAL: &str = r#"
        listener:
            host: 0.0.0.0
            port: 3001
        admin_listener:
            host: 127.0.0.1
            port: 3002
        upstream:
            api_key: secret-key
        "#;

    #[test]
    fn test_full_config() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 3001
            admin_listener:
                host: 127.0.0.1
                port: 3002
            upstream:
                base_url: http://provider.internal/
                api_key: secret-key
                timeout_secs: 3
                max_retries: 0
            auth:
                type: self_issued
                secret: 0123456789abcdef0123456789abcdef
                token_ttl_secs: 600
                users:
                    - email: ops@example.com
                      password_hash: "$argon2id$v=19$m=19456,t=2,p=1$ZGFzaGJvYXJkLXNhbHQwMQ$PRwmJQcPkKh/KLuXj3EUn9NFqPfPZFmNmv/Y1Ap6z7U"
            cors:
                allowed_origins: ["https://dashboard.example.com"]
            logging:
                level: debug
                format: json
                sentry_dsn: https://key@sentry.example.com/1
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.listener.port, 3001);
        assert_eq!(config.upstream.base_url.as_str(), "http://provider.internal/");
        assert_eq!(config.upstream.max_retries, 0);
        let AuthConfig::SelfIssued(auth) = &config.auth else {
            panic!("expected self-issued auth");
        };
        assert_eq!(auth.token_ttl_secs, 600);
        assert_eq!(auth.users.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        let metrics = config.metrics.as_ref().expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "dashboard");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = parse(MINIMAL);

        assert_eq!(config.auth, AuthConfig::Disabled);
        assert!(config.cors.allows_any_origin());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.upstream.timeout_secs, 10);
        assert!(config.metrics.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let yaml = r#"
            listener:
                host: 0.0.0.0
                port: 3001
            admin_listener:
                host: 0.0.0.0
                port: 3002
            auth:
                type: self_issued
            "#;
        let mut config = parse(yaml);
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));

        config.apply_overrides(|name| match name {
            API_KEY_ENV => Some("from-env".to_string()),
            JWT_SECRET_ENV => Some("a-secret-that-is-long-enough-to-sign".to_string()),
            _ => None,
        });

        assert_eq!(config.upstream.api_key, "from-env");
        let AuthConfig::SelfIssued(auth) = &config.auth else {
            panic!("expected self-issued auth");
        };
        assert_eq!(auth.secret, "a-secret-that-is-long-enough-to-sign");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = parse(MINIMAL);
        config.admin_listener = config.listener.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ListenerConflict)
        ));

        let mut config = parse(MINIMAL);
        config.listener.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::InvalidPort))
        ));

        let mut config = parse(MINIMAL);
        config.cors.allowed_origins = vec!["bad\norigin".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::InvalidOrigin(_)))
        ));

        let weak_secret = "auth:\n            type: self_issued\n            secret: short\n";
        let config = parse(&format!("{MINIMAL}{weak_secret}"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::WeakSecret))
        ));
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::from_file(Path::new("/nonexistent/dashboard.yaml"));
        assert!(matches!(missing, Err(ConfigError::LoadError(_))));

        let tmp = write_tmp_file("listener: [not, a, listener]");
        let invalid = Config::from_file(tmp.path());
        assert!(matches!(invalid, Err(ConfigError::ParseError(_))));
    }
}
