//! Application assembly
//! Mission: Wire config, stores and auth services into the router state

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::{
    api::AppState,
    auth::{
        AuthState, Authenticator, CredentialStore, CredentialVerifier, InMemoryCredentialStore,
        JwtHandler, SqliteCredentialStore,
    },
    catalog::InMemoryCatalog,
    clock::Clock,
    config::Config,
};

/// Build the credential store and provision the configured account into it
pub fn build_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    let roles = config.roles();

    match &config.auth_db_path {
        Some(path) => {
            let path = path
                .to_str()
                .context("AUTH_DB_PATH is not valid UTF-8")?;
            let store = SqliteCredentialStore::new(path)?;
            store.provision(&config.username, &config.password, &roles, config.bcrypt_cost)?;
            info!("🗄️  Identities backed by SQLite at {}", path);
            Ok(Arc::new(store))
        }
        None => {
            let store = InMemoryCredentialStore::with_user(
                &config.username,
                &config.password,
                &roles,
                config.bcrypt_cost,
            )?;
            Ok(Arc::new(store))
        }
    }
}

pub fn build_state(config: &Config, clock: Arc<dyn Clock>) -> Result<AppState> {
    config.validate()?;
    let store = build_store(config)?;
    let key = config.signing_key()?;
    let jwt_handler = Arc::new(JwtHandler::new(&key, config.token_ttl()?));
    let verifier = Arc::new(CredentialVerifier::new(store.clone(), config.bcrypt_cost)?);
    let authenticator = Authenticator::new(jwt_handler.clone(), store, clock.clone());

    Ok(AppState {
        auth: AuthState {
            verifier,
            jwt_handler,
            authenticator,
            clock,
        },
        catalog: Arc::new(InMemoryCatalog::seeded()),
    })
}
