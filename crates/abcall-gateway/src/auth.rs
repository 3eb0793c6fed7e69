//! # Identity Boundary
//!
//! Callers present a signed JWT in the `token` header (an
//! `Authorization: Bearer` header is accepted as a fallback). The
//! [`credential_middleware`] verifies it once per request and injects a
//! [`Caller`] into the request extensions. Handlers never see the raw header.
//!
//! Verification never rejects a request by itself. A missing, malformed,
//! badly signed or expired token resolves to an anonymous caller. Each route
//! then applies its [`AuthPolicy`]:
//!
//! | Policy     | Anonymous caller          | Verified caller           |
//! |------------|---------------------------|---------------------------|
//! | `Required` | 401, no downstream call   | token propagated          |
//! | `Optional` | call made without a token | token propagated          |
//! | `None`     | call made without a token | call made without a token |
//!
//! Only a token that passed verification is ever forwarded downstream.

use std::convert::Infallible;

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;
use crate::state::ConfigError;

/// Inbound header carrying the caller's credential.
pub const TOKEN_HEADER: &str = "token";

/// Decoded claim set. Claim names are not interpreted by the gateway.
pub type Claims = serde_json::Map<String, serde_json::Value>;

// ── Configuration ───────────────────────────────────────────────────────────

/// Verification key material.
///
/// Custom `Debug` redacts the secret to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Zeroizing<String>,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl AuthConfig {
    /// Build a config for a shared-secret HMAC algorithm.
    pub fn new(secret: impl Into<String>, algorithm: Algorithm) -> Result<Self, ConfigError> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }
        Ok(Self { secret, algorithm })
    }

    /// Read `JWT_SECRET_KEY` (required) and `JWT_ALGORITHM` (default `HS256`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("JWT_SECRET_KEY").map_err(|_| ConfigError::MissingSecret)?;
        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(name) => name
                .parse::<Algorithm>()
                .map_err(|_| ConfigError::UnsupportedAlgorithm(name))?,
            Err(_) => Algorithm::HS256,
        };
        Self::new(secret, algorithm)
    }
}

// ── Verification ────────────────────────────────────────────────────────────

/// Why a presented credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("token is malformed")]
    Malformed,
    #[error("signature verification failed")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    Immature,
    #[error("token uses an unexpected algorithm")]
    WrongAlgorithm,
    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed,
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::Immature,
            ErrorKind::InvalidAlgorithm => Self::WrongAlgorithm,
            other => Self::Rejected(format!("{other:?}")),
        }
    }
}

/// A verified identity: the decoded claims plus the exact token that carried them.
#[derive(Clone, PartialEq)]
pub struct AuthContext {
    claims: Claims,
    token: String,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("claims", &self.claims)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl AuthContext {
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }

    /// The `sub` claim, when it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.claim("sub").and_then(|v| v.as_str())
    }

    /// The verified token, for propagation to downstream services.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Result of inspecting a presented credential.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Absent,
    Invalid(CredentialError),
    Resolved(AuthContext),
}

impl Resolution {
    pub fn into_context(self) -> Option<AuthContext> {
        match self {
            Self::Resolved(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Verifies tokens against the configured key and algorithm.
///
/// `exp` is optional in the token but enforced when present. No other claim
/// is required. Only the configured algorithm is accepted.
#[derive(Clone)]
pub struct CredentialCodec {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl CredentialCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token, discarding the failure reason.
    pub fn resolve(&self, token: Option<&str>) -> Option<AuthContext> {
        self.inspect(token).into_context()
    }

    /// Verify a token and report why it was rejected, if it was.
    pub fn inspect(&self, token: Option<&str>) -> Resolution {
        let Some(token) = token else {
            return Resolution::Absent;
        };
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Resolution::Resolved(AuthContext {
                claims: data.claims,
                token: token.to_owned(),
            }),
            Err(err) => Resolution::Invalid(err.into()),
        }
    }
}

/// The credential presented on an inbound request, if any.
///
/// The `token` header wins over `Authorization: Bearer`. Blank values count
/// as absent.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let from_token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    from_token.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

// ── Caller ──────────────────────────────────────────────────────────────────

/// The identity the middleware resolved for this request.
///
/// Extraction never fails; a request that bypassed the middleware is anonymous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caller(pub Option<AuthContext>);

impl Caller {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Caller>().cloned().unwrap_or_default())
    }
}

// ── Policy ──────────────────────────────────────────────────────────────────

/// What a route does with the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPolicy {
    Required,
    Optional,
    None,
}

impl AuthPolicy {
    /// Decide what identity, if any, travels downstream.
    pub fn enforce(self, caller: Caller) -> Result<Option<AuthContext>, AppError> {
        match (self, caller.0) {
            (Self::None, _) => Ok(None),
            (Self::Optional, ctx) => Ok(ctx),
            (Self::Required, Some(ctx)) => Ok(Some(ctx)),
            (Self::Required, None) => {
                Err(AppError::Unauthorized("authentication required".into()))
            }
        }
    }

    /// `Optional` becomes `Required`; other policies are unchanged.
    pub fn strict(self) -> Self {
        match self {
            Self::Optional => Self::Required,
            other => other,
        }
    }
}

/// Per-route policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicies {
    pub create_company: AuthPolicy,
    pub get_company: AuthPolicy,
    pub companies_by_document: AuthPolicy,
    pub companies_by_user: AuthPolicy,
    pub users_view: AuthPolicy,
}

impl Default for RoutePolicies {
    fn default() -> Self {
        Self {
            create_company: AuthPolicy::None,
            get_company: AuthPolicy::Optional,
            companies_by_document: AuthPolicy::Optional,
            companies_by_user: AuthPolicy::Optional,
            users_view: AuthPolicy::Optional,
        }
    }
}

impl RoutePolicies {
    /// Require a verified identity on every route that would otherwise accept one.
    pub fn require_all(self) -> Self {
        Self {
            create_company: self.create_company.strict(),
            get_company: self.get_company.strict(),
            companies_by_document: self.companies_by_document.strict(),
            companies_by_user: self.companies_by_user.strict(),
            users_view: self.users_view.strict(),
        }
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the presented credential and inject a [`Caller`].
///
/// Requires a [`CredentialCodec`] extension. Without one every caller is
/// anonymous.
pub async fn credential_middleware(mut request: Request, next: Next) -> Response {
    let resolution = {
        let token = presented_token(request.headers());
        match request.extensions().get::<CredentialCodec>() {
            Some(codec) => codec.inspect(token),
            None => Resolution::Absent,
        }
    };

    if let Some(metrics) = request.extensions().get::<ApiMetrics>() {
        metrics.record_credential(&resolution);
    }

    match &resolution {
        Resolution::Absent => tracing::debug!("no credential presented"),
        Resolution::Invalid(reason) => {
            tracing::warn!(reason = %reason, "credential rejected, continuing as anonymous")
        }
        Resolution::Resolved(ctx) => {
            tracing::debug!(subject = ctx.subject().unwrap_or("-"), "credential verified")
        }
    }

    request
        .extensions_mut()
        .insert(Caller(resolution.into_context()));
    next.run(request).await
}
