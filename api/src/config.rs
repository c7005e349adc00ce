use argon2::PasswordHash;
use axum::http::HeaderValue;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Minimum length of the token signing secret, in bytes
const MIN_SECRET_LEN: usize = 32;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),

    #[error("Token signing secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("Token lifetime cannot be 0")]
    InvalidTokenTtl,

    #[error("Duplicate user: {0}")]
    DuplicateUser(String),

    #[error("Password hash for {0} is not a PHC formatted password hash")]
    InvalidPasswordHash(String),
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Origins allowed to call the API from a browser.
/// An empty list or `"*"` allows any origin.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for origin in &self.allowed_origins {
            if origin != "*" && HeaderValue::from_str(origin).is_err() {
                return Err(ValidationError::InvalidOrigin(origin.clone()));
            }
        }
        Ok(())
    }
}

/// How bearer tokens presented to the API are verified
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Every request is let through
    #[default]
    Disabled,
    /// Tokens are issued by an external identity provider and checked against its
    /// token-info endpoint
    Remote(RemoteAuthConfig),
    /// Tokens are issued by this service's login endpoint
    SelfIssued(SelfIssuedConfig),
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            AuthConfig::Disabled | AuthConfig::Remote(_) => Ok(()),
            AuthConfig::SelfIssued(config) => config.validate(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RemoteAuthConfig {
    /// Endpoint answering `GET ?id_token=<token>` with the token's claims
    pub token_info_url: Url,
    /// Expected `aud` claim. Not checked when unset.
    pub audience: Option<String>,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SelfIssuedConfig {
    /// HMAC key for signing tokens. Usually injected from the environment.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl SelfIssuedConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ValidationError::WeakSecret);
        }

        if self.token_ttl_secs == 0 {
            return Err(ValidationError::InvalidTokenTtl);
        }

        let mut emails = HashSet::new();
        for user in &self.users {
            if !emails.insert(user.email.to_lowercase()) {
                return Err(ValidationError::DuplicateUser(user.email.clone()));
            }

            if PasswordHash::new(&user.password_hash).is_err() {
                return Err(ValidationError::InvalidPasswordHash(user.email.clone()));
            }
        }

        Ok(())
    }
}

/// Dashboard user allowed to log in
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UserConfig {
    pub email: String,
    /// Argon2 hash of the password in PHC string format, e.g. `$argon2id$v=19$...`
    pub password_hash: String,
}

fn default_provider_timeout_secs() -> u64 {
    5
}

fn default_token_ttl_secs() -> u64 {
    60 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    // argon2id("hunter2") with the default parameters
    const HUNTER2_HASH: &str =
        "$argon2id$v=19$m=19456,t=2,p=1$ZGFzaGJvYXJkLXNhbHQwMQ$PRwmJQcPkKh/KLuXj3EUn9NFqPfPZFmNmv/Y1Ap6z7U";

    fn self_issued() -> SelfIssuedConfig {
        SelfIssuedConfig {
            secret: "s".repeat(32),
            token_ttl_secs: 3600,
            users: vec![UserConfig {
                email: "ops@example.com".to_string(),
                password_hash: HUNTER2_HASH.to_string(),
            }],
        }
    }

    #[test]
    fn test_parse_auth_variants() {
        let config: AuthConfig = serde_yaml::from_str("type: disabled").unwrap();
        assert_eq!(config, AuthConfig::Disabled);

        let config: AuthConfig = serde_yaml::from_str(
            r#"
type: remote
token_info_url: "https://oauth2.googleapis.com/tokeninfo"
audience: dashboard
"#,
        )
        .unwrap();
        let AuthConfig::Remote(remote) = config else {
            panic!("expected remote auth config");
        };
        assert_eq!(remote.audience.as_deref(), Some("dashboard"));
        assert_eq!(remote.timeout_secs, 5);

        let config: AuthConfig = serde_yaml::from_str(
            r#"
type: self_issued
secret: "0123456789abcdef0123456789abcdef"
users:
  - email: ops@example.com
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$ZGFzaGJvYXJkLXNhbHQwMQ$PRwmJQcPkKh/KLuXj3EUn9NFqPfPZFmNmv/Y1Ap6z7U"
"#,
        )
        .unwrap();
        let AuthConfig::SelfIssued(self_issued) = config else {
            panic!("expected self issued auth config");
        };
        assert_eq!(self_issued.token_ttl_secs, 3600);
        assert_eq!(self_issued.users.len(), 1);
        assert!(self_issued.validate().is_ok());
    }

    #[test]
    fn test_unknown_auth_type() {
        assert!(serde_yaml::from_str::<AuthConfig>("type: magic").is_err());
    }

    #[test]
    fn test_self_issued_validation_errors() {
        assert!(self_issued().validate().is_ok());

        let mut config = self_issued();
        config.secret = "short".to_string();
        assert_eq!(config.validate().unwrap_err(), ValidationError::WeakSecret);

        let mut config = self_issued();
        config.token_ttl_secs = 0;
        assert_eq!(config.validate().unwrap_err(), ValidationError::InvalidTokenTtl);

        let mut config = self_issued();
        config.users.push(UserConfig {
            email: "OPS@example.com".to_string(),
            password_hash: HUNTER2_HASH.to_string(),
        });
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::DuplicateUser(_)
        ));

        let mut config = self_issued();
        config.users[0].password_hash = "hunter2".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPasswordHash(_)
        ));
    }

    #[test]
    fn test_cors_validation() {
        let config = CorsConfig::default();
        assert!(config.allows_any_origin());
        assert!(config.validate().is_ok());

        let config = CorsConfig {
            allowed_origins: vec!["https://dashboard.example.com".to_string()],
        };
        assert!(!config.allows_any_origin());
        assert!(config.validate().is_ok());

        let config = CorsConfig {
            allowed_origins: vec!["bad\norigin".to_string()],
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidOrigin(_)
        ));
    }
}
