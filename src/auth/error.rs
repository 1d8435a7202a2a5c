//! Authentication error types.
//!
//! Token and credential failures are returned as values. The HTTP-facing
//! mapping lives next to the handlers (`api.rs`) and the unauthorized
//! responder (`unauthorized.rs`).

use thiserror::Error;

/// Why a bearer token was rejected by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not a decodable three-part token, or its claims are unreadable.
    #[error("malformed token")]
    MalformedToken,

    /// Signature does not verify against the current signing key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// `now >= exp`.
    #[error("token expired")]
    ExpiredToken,
}

/// Why a presented token did not produce an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Token is valid but its subject no longer resolves to a known identity.
    #[error("identity '{0}' is not known")]
    IdentityMissing(String),

    /// Token claims disagree with the identity currently on record.
    #[error("token claims do not match identity '{0}'")]
    ClaimsMismatch(String),
}

/// Login-time failures.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Unknown user or wrong secret. Deliberately one variant.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("credential store failure: {0}")]
    Store(#[source] anyhow::Error),

    #[error("failed to issue token: {0}")]
    Issue(#[source] anyhow::Error),
}
