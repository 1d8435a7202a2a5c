//! Authentication Module
//! Mission: Stateless bearer-token authentication for every inbound request

pub mod api;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod unauthorized;
pub mod user_store;
pub mod verifier;

pub use api::AuthState;
pub use error::{CredentialError, TokenError, TokenRejection};
pub use jwt::{JwtHandler, SigningKey};
pub use middleware::{
    authenticate, require_authenticated, require_role, AuthOutcome, Authenticator, RequiredRole,
};
pub use models::{AuthenticatedIdentity, Identity};
pub use unauthorized::Unauthorized;
pub use user_store::{CredentialStore, InMemoryCredentialStore, SqliteCredentialStore};
pub use verifier::CredentialVerifier;
