//! Authentication Middleware
//! Mission: Attach a verified identity to each request, and gate protected routes on it
//!
//! `authenticate` runs once for every request and never rejects anything: a
//! missing or bad token just leaves the request anonymous. Rejection is the job
//! of the route gates (`require_authenticated`, `require_role`), which answer
//! with the [`Unauthorized`] responder.

use crate::{
    auth::{
        error::TokenRejection, jwt::JwtHandler, models::AuthenticatedIdentity,
        unauthorized::Unauthorized, user_store::CredentialStore,
    },
    clock::Clock,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Result of reading the Authorization header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerHeader<'a> {
    Missing,
    NotBearer,
    Token(&'a str),
}

pub fn bearer_token(headers: &HeaderMap) -> BearerHeader<'_> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return BearerHeader::Missing;
    };
    match value.to_str().ok().and_then(|s| s.strip_prefix(BEARER_PREFIX)) {
        Some(token) if !token.is_empty() => BearerHeader::Token(token),
        _ => BearerHeader::NotBearer,
    }
}

/// What the authenticator concluded for a request. Its presence in the request
/// extensions also marks the request as already processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    NoHeader,
    NotBearer,
    InvalidToken,
    IdentityMissing,
    Authenticated,
}

impl AuthOutcome {
    /// Rejection a protected route should give a request with this outcome
    pub fn unauthorized(self) -> Unauthorized {
        match self {
            AuthOutcome::NoHeader | AuthOutcome::NotBearer => Unauthorized::MissingToken,
            AuthOutcome::InvalidToken | AuthOutcome::IdentityMissing => {
                Unauthorized::InvalidToken
            }
            // Only reachable if something removed the identity after authentication.
            AuthOutcome::Authenticated => Unauthorized::MissingToken,
        }
    }
}

/// Shared per-request gatekeeper. Cheap to clone; all state is read-only.
#[derive(Clone)]
pub struct Authenticator {
    jwt_handler: Arc<JwtHandler>,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(
        jwt_handler: Arc<JwtHandler>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jwt_handler,
            store,
            clock,
        }
    }

    /// Parse the token, re-resolve its subject, and cross-check claims against the identity.
    pub fn resolve(&self, token: &str) -> Result<AuthenticatedIdentity, TokenRejection> {
        let now = self.clock.now();
        let parsed = self.jwt_handler.parse(token, now)?;

        let identity = match self.store.lookup(&parsed.subject) {
            Ok(Some(identity)) => identity,
            Ok(None) => return Err(TokenRejection::IdentityMissing(parsed.subject)),
            Err(e) => {
                warn!("Credential lookup failed for {}: {:#}", parsed.subject, e);
                return Err(TokenRejection::IdentityMissing(parsed.subject));
            }
        };

        if !parsed.is_consistent_with(&identity, now) {
            return Err(TokenRejection::ClaimsMismatch(parsed.subject));
        }

        Ok(AuthenticatedIdentity::from(&identity))
    }

    fn identify(&self, headers: &HeaderMap) -> Result<AuthenticatedIdentity, AuthOutcome> {
        match bearer_token(headers) {
            BearerHeader::Missing => {
                debug!("No Authorization header");
                Err(AuthOutcome::NoHeader)
            }
            BearerHeader::NotBearer => {
                warn!("Authorization header doesn't start with Bearer");
                Err(AuthOutcome::NotBearer)
            }
            BearerHeader::Token(token) => self.resolve(token).map_err(|e| match e {
                TokenRejection::IdentityMissing(subject) => {
                    info!("Token subject {} no longer resolves", subject);
                    AuthOutcome::IdentityMissing
                }
                other => {
                    info!("JWT token processing error: {}", other);
                    AuthOutcome::InvalidToken
                }
            }),
        }
    }

    /// Run the header → token → identity state machine and record the result on `req`.
    pub fn authenticate_request(&self, req: &mut Request) -> AuthOutcome {
        if let Some(outcome) = req.extensions().get::<AuthOutcome>() {
            return *outcome;
        }

        let outcome = if req.extensions().get::<AuthenticatedIdentity>().is_some() {
            AuthOutcome::Authenticated
        } else {
            match self.identify(req.headers()) {
                Ok(identity) => {
                    debug!("Authenticated request for {}", identity.username);
                    req.extensions_mut().insert(identity);
                    AuthOutcome::Authenticated
                }
                Err(outcome) => outcome,
            }
        };

        req.extensions_mut().insert(outcome);
        outcome
    }
}

/// Authenticator stage. Always continues down the chain.
pub async fn authenticate(
    State(authenticator): State<Authenticator>,
    mut req: Request,
    next: Next,
) -> Response {
    authenticator.authenticate_request(&mut req);
    next.run(req).await
}

/// Gate for routes that need any authenticated identity
pub async fn require_authenticated(req: Request, next: Next) -> Result<Response, Unauthorized> {
    if extract_identity(&req).is_none() {
        return Err(rejection_for(&req));
    }
    Ok(next.run(req).await)
}

/// Role name a `require_role` gate checks for
#[derive(Debug, Clone)]
pub struct RequiredRole(pub &'static str);

/// Gate for routes that need a specific role
pub async fn require_role(
    State(RequiredRole(role)): State<RequiredRole>,
    req: Request,
    next: Next,
) -> Result<Response, Unauthorized> {
    let rejection = match extract_identity(&req) {
        None => Some(rejection_for(&req)),
        Some(identity) if !identity.has_role(role) => {
            info!("{} lacks role {}", identity.username, role);
            Some(Unauthorized::InsufficientRole)
        }
        Some(_) => None,
    };
    if let Some(rejection) = rejection {
        return Err(rejection);
    }
    Ok(next.run(req).await)
}

/// Identity attached by `authenticate`, if any
pub fn extract_identity(req: &Request) -> Option<&AuthenticatedIdentity> {
    req.extensions().get::<AuthenticatedIdentity>()
}

fn rejection_for(req: &Request) -> Unauthorized {
    req.extensions()
        .get::<AuthOutcome>()
        .copied()
        .unwrap_or(AuthOutcome::NoHeader)
        .unauthorized()
}
