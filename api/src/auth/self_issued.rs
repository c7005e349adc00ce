//! HS256 JSON Web Tokens issued by the login endpoint and verified on every request.

use super::{AuthError, CredentialVerifier, Identity};
use crate::config::SelfIssuedConfig;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    iat: u64,
    exp: u64,
}

/// A freshly signed token and its expiry as a unix timestamp
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

pub struct SelfIssuedAuth {
    secret: Vec<u8>,
    token_ttl_secs: u64,
    // Lowercased email to PHC formatted password hash
    users: HashMap<String, String>,
}

impl SelfIssuedAuth {
    pub fn new(config: &SelfIssuedConfig) -> Self {
        SelfIssuedAuth {
            secret: config.secret.as_bytes().to_vec(),
            token_ttl_secs: config.token_ttl_secs,
            users: config
                .users
                .iter()
                .map(|user| (user.email.to_lowercase(), user.password_hash.clone()))
                .collect(),
        }
    }

    /// Checks the password of a configured user and issues a token for them.
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let email = email.trim().to_lowercase();
        let stored = self
            .users
            .get(&email)
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = PasswordHash::new(stored).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        self.issue_at(&email, unix_now())
    }

    fn issue_at(&self, email: &str, now: u64) -> Result<IssuedToken, AuthError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: email.to_string(),
            email: Some(email.to_string()),
            iat: now,
            exp: now.saturating_add(self.token_ttl_secs),
        };

        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            expires_at: claims.exp,
        })
    }

    fn verify_at(&self, token: &str, now: u64) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let malformed = || AuthError::InvalidToken("malformed token".into());
        let (signing_input, signature) = token.rsplit_once('.').ok_or_else(malformed)?;
        let (header, claims) = signing_input.split_once('.').ok_or_else(malformed)?;
        if claims.contains('.') {
            return Err(malformed());
        }

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken("malformed signature".into()))?;
        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken("signature mismatch".into()))?;

        let claims: Claims = decode_segment(claims)?;
        if claims.exp <= now {
            return Err(AuthError::InvalidToken("token expired".into()));
        }

        Ok(Identity {
            subject: claims.sub,
            email: claims.email,
        })
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }
}

#[async_trait]
impl CredentialVerifier for SelfIssuedAuth {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, unix_now())
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken("malformed token".into()))?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken("malformed token".into()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
