//! JWT Token Handler
//! Mission: Issue and parse compact signed tokens carrying a subject and an expiry

use crate::auth::{
    error::TokenError,
    models::{AuthenticatedIdentity, Claims, Identity},
};
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use rand::RngCore;
use std::fmt;
use tracing::debug;

/// HS512 wants at least this much key material to be meaningful.
pub const MIN_SECRET_LEN: usize = 32;
const GENERATED_SECRET_LEN: usize = 64;
const ALGORITHM: Algorithm = Algorithm::HS512;

/// Process-wide HMAC signing key. Built once at startup, never from request data.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn from_secret(secret: &str) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            bail!(
                "JWT secret must be at least {} bytes (got {})",
                MIN_SECRET_LEN,
                secret.len()
            );
        }
        Ok(Self(secret.as_bytes().to_vec()))
    }

    /// Fresh random key. Tokens signed with it die with the process.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; GENERATED_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(**redacted**)")
    }
}

/// Freshly issued token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims recovered from a token whose structure, signature, and expiry checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    pub subject: String,
    pub roles: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ParsedToken {
    /// Claims agree with the identity currently on record and are still live.
    ///
    /// The subject comparison only fails for stores whose lookup normalises
    /// usernames (case folding, trimming). Expiry repeats the check in `parse`
    /// against the same instant.
    pub fn is_consistent_with(&self, identity: &Identity, now: DateTime<Utc>) -> bool {
        self.subject == identity.username && now < self.expires_at
    }
}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtHandler {
    pub fn new(key: &SigningKey, ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the injected clock in `parse`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Sign a token for `identity` valid from `now` until `now + ttl`
    pub fn issue(&self, identity: &AuthenticatedIdentity, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: identity.username.clone(),
            roles: identity.roles.iter().cloned().collect(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!(
            "Issuing JWT for {}, expires at {}",
            identity.username,
            expires_at.to_rfc3339()
        );

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .context("Failed to generate JWT")?;

        Ok(IssuedToken {
            token,
            expires_at: timestamp_to_datetime(claims.exp)?,
        })
    }

    /// Check structure, then signature, then expiry. Never consults the credential store.
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Result<ParsedToken, TokenError> {
        check_structure(token)?;

        let verified = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                // Header and payload already decoded, so a base64 failure is in the signature.
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_) => TokenError::InvalidSignature,
                _ => TokenError::MalformedToken,
            })?
            .claims;

        let expires_at =
            timestamp_to_datetime(verified.exp).map_err(|_| TokenError::MalformedToken)?;
        let issued_at =
            timestamp_to_datetime(verified.iat).map_err(|_| TokenError::MalformedToken)?;

        if now >= expires_at {
            return Err(TokenError::ExpiredToken);
        }

        Ok(ParsedToken {
            subject: verified.sub,
            roles: verified.roles,
            issued_at,
            expires_at,
        })
    }
}

/// Structural decode of header and payload, without trusting either.
fn check_structure(token: &str) -> Result<(), TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, signature] = segments.as_slice() else {
        return Err(TokenError::MalformedToken);
    };
    if signature.is_empty() {
        return Err(TokenError::MalformedToken);
    }

    decode_header(token).map_err(|_| TokenError::MalformedToken)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::MalformedToken)?;
    serde_json::from_slice::<Claims>(&payload)
        .map(|_| ())
        .map_err(|_| TokenError::MalformedToken)
}

fn timestamp_to_datetime(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).context("timestamp out of range")
}
