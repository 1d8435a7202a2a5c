//! Credential Storage
//! Mission: Answer "who is this username, and what is its hashed secret and role set?"

use crate::auth::models::Identity;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Read-only lookup used by the verifier and the per-request authenticator
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, username: &str) -> Result<Option<Identity>>;
}

/// Hash a plaintext secret with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Hash map of identities, fixed at construction
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    identities: HashMap<String, Identity>,
}

impl InMemoryCredentialStore {
    pub fn new(identities: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            identities: identities
                .into_iter()
                .map(|identity| (identity.username.clone(), identity))
                .collect(),
        }
    }

    /// Single provisioned identity, password hashed here
    pub fn with_user(username: &str, password: &str, roles: &[String], cost: u32) -> Result<Self> {
        let identity = Identity::new(username, hash_password(password, cost)?, roles.iter().cloned());
        info!(
            "🔐 Provisioned in-memory identity: {} ({})",
            identity.username,
            roles.join(",")
        );
        Ok(Self::new([identity]))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self, username: &str) -> Result<Option<Identity>> {
        Ok(self.identities.get(username).cloned())
    }
}

/// Identity storage with SQLite backend
pub struct SqliteCredentialStore {
    db_path: String,
}

impl SqliteCredentialStore {
    /// Create a new store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open credential database at {}", self.db_path))
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS identities (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                roles TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert or replace an identity with a freshly hashed password
    pub fn provision(&self, username: &str, password: &str, roles: &[String], cost: u32) -> Result<Identity> {
        let password_hash = hash_password(password, cost)?;
        let identity = Identity::new(username, password_hash, roles.iter().cloned());

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO identities (username, password_hash, roles, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(username) DO UPDATE SET
                password_hash = excluded.password_hash,
                roles = excluded.roles",
            params![
                identity.username,
                identity.password_hash,
                join_roles(&identity.roles),
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to upsert identity")?;

        info!("✅ Provisioned identity: {}", identity.username);
        Ok(identity)
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn lookup(&self, username: &str) -> Result<Option<Identity>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT username, password_hash, roles FROM identities WHERE username = ?1",
        )?;

        let identity = stmt
            .query_row(params![username], |row| {
                let roles: String = row.get(2)?;
                Ok(Identity {
                    username: row.get(0)?,
                    password_hash: row.get(1)?,
                    roles: split_roles(&roles),
                })
            })
            .optional()
            .context("Failed to query identity")?;

        Ok(identity)
    }
}

fn join_roles(roles: &BTreeSet<String>) -> String {
    roles.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

fn split_roles(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
