//! Authentication seam.
//!
//! Authentication policy is an external collaborator: the engine only
//! depends on the [`Authenticator`] capability, and deployments inject
//! whatever implementation fronts their identity provider. No credential
//! table lives in this repository; the default is an explicit allow-all
//! for development.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Credentials extracted from the request.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Bearer token, empty when the request carried none.
    pub token: String,
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal {
    pub name: String,
}

/// Authentication failure from the injected policy.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Capability interface implemented by the deployment's identity provider.
pub trait Authenticator: Send + Sync {
    /// Map credentials to a principal, or reject them.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credentials are not acceptable.
    fn authenticate(&self, credentials: &Credentials) -> std::result::Result<Principal, AuthError>;
}

/// Development default: accepts every request as an anonymous operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authenticate(&self, _credentials: &Credentials) -> std::result::Result<Principal, AuthError> {
        Ok(Principal {
            name: "operator".to_string(),
        })
    }
}

/// Middleware guarding mutating and admin routes.
///
/// Reads (GET/HEAD outside `/admin`) pass through; everything else must
/// satisfy the injected [`Authenticator`]. The resolved [`Principal`] is
/// stored in request extensions for handlers that want it.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let needs_auth = !matches!(*request.method(), Method::GET | Method::HEAD)
        || request.uri().path().starts_with("/admin");
    if !needs_auth {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();

    let principal = state
        .authenticator()
        .authenticate(&Credentials { token })
        .map_err(|error| AppError::Unauthorized(error.to_string()))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
