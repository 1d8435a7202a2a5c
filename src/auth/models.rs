//! Authentication Models
//! Mission: Define identity, claim, and login payload structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A provisioned account. Created once at startup and never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub roles: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, S>(username: impl Into<String>, password_hash: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Request-scoped marker attached to a request once its bearer token checks out.
/// Either present and fully populated, or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl AuthenticatedIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl From<&Identity> for AuthenticatedIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            roles: identity.roles.clone(),
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (username)
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: i64, // issued-at, unix seconds
    pub exp: i64, // expiration, unix seconds
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
}

/// Public view of an identity (no password hash)
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub username: String,
    pub roles: Vec<String>,
}

impl From<&AuthenticatedIdentity> for UserResponse {
    fn from(identity: &AuthenticatedIdentity) -> Self {
        Self {
            username: identity.username.clone(),
            roles: identity.roles.iter().cloned().collect(),
        }
    }
}
