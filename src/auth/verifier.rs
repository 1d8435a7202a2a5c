//! Credential Verifier
//! Mission: Turn a claimed username and plaintext secret into an identity or a rejection

use crate::auth::{
    error::CredentialError,
    models::AuthenticatedIdentity,
    user_store::{hash_password, CredentialStore},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    // Verified against when the user is unknown, so both failure paths cost one bcrypt check.
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, cost: u32) -> Result<Self> {
        Ok(Self {
            store,
            dummy_hash: hash_password("storefront-dummy-secret", cost)?,
        })
    }

    /// Unknown user and wrong secret both come back as `InvalidCredentials`.
    pub fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, CredentialError> {
        if username.is_empty() {
            return Err(CredentialError::InvalidCredentials);
        }

        let identity = self
            .store
            .lookup(username)
            .map_err(CredentialError::Store)?;

        let hash = identity
            .as_ref()
            .map_or(self.dummy_hash.as_str(), |i| i.password_hash.as_str());

        let matches = bcrypt::verify(password, hash).map_err(|e| {
            CredentialError::Store(anyhow::Error::new(e).context("Failed to verify password"))
        })?;

        match identity {
            Some(identity) if matches => Ok(AuthenticatedIdentity::from(&identity)),
            Some(_) => {
                debug!("Password mismatch for {}", username);
                Err(CredentialError::InvalidCredentials)
            }
            None => {
                debug!("Unknown username {}", username);
                Err(CredentialError::InvalidCredentials)
            }
        }
    }
}
