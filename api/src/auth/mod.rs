//! Bearer token verification.
//!
//! The scheme is chosen once at startup from [`AuthConfig`](crate::config::AuthConfig)
//! and handed to the router as a [`CredentialVerifier`]. Request handling never branches
//! on the scheme.

mod remote;
mod self_issued;

pub use remote::RemoteVerifier;
pub use self_issued::{IssuedToken, SelfIssuedAuth};

use crate::metrics_defs::AUTH_REJECTIONS;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use shared::counter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// No credential was presented
    #[error("missing bearer token")]
    Unauthenticated,

    /// A credential was presented but rejected
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The identity provider could not be reached to verify the credential
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Login with an unknown email or a wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("could not encode token: {0}")]
    Encoding(String),
}

impl AuthError {
    fn reason(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Encoding(_) => "encoding",
        }
    }
}

/// The authenticated caller, attached to the request for handlers to use
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Identity {
            subject: "anonymous".to_string(),
            email: None,
        }
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verifies a bearer token. An empty token means none was presented.
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Lets every request through as [`Identity::anonymous`]
pub struct DisabledVerifier;

#[async_trait]
impl CredentialVerifier for DisabledVerifier {
    async fn verify(&self, _token: &str) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }
}

/// Returns the token carried by an `Authorization: Bearer <token>` header.
///
/// A header using another scheme is returned whole so the verifier rejects it as
/// malformed rather than treating the request as unauthenticated.
fn bearer_token(request: &Request) -> Result<String, AuthError> {
    let Some(value) = request.headers().get(AUTHORIZATION) else {
        return Ok(String::new());
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("authorization header is not valid ASCII".into()))?;

    Ok(value
        .strip_prefix("Bearer ")
        .unwrap_or(value)
        .trim()
        .to_string())
}

/// Middleware rejecting requests the configured verifier does not accept.
/// On success the caller's [`Identity`] is added to the request extensions.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, crate::errors::ApiError> {
    let verified = match bearer_token(&request) {
        Ok(token) => state.verifier.verify(&token).await,
        Err(e) => Err(e),
    };

    match verified {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            counter!(AUTH_REJECTIONS, "reason" => e.reason()).increment(1);
            tracing::info!(
                path = %request.uri().path(),
                reason = e.reason(),
                "Rejected request"
            );
            Err(e.into())
        }
    }
}
