//! Authentication API Endpoints
//! Mission: Provide login and current-user endpoints

use crate::{
    auth::{
        error::CredentialError,
        jwt::JwtHandler,
        middleware::{bearer_token, AuthOutcome, Authenticator, BearerHeader},
        models::{AuthenticatedIdentity, LoginRequest, LoginResponse, UserResponse},
        verifier::CredentialVerifier,
    },
    clock::Clock,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<CredentialVerifier>,
    pub jwt_handler: Arc<JwtHandler>,
    pub authenticator: Authenticator,
    pub clock: Arc<dyn Clock>,
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    // bcrypt is deliberately slow; keep it off the async workers.
    let verifier = state.verifier.clone();
    let LoginRequest { username, password } = payload;
    let attempted = username.clone();
    let identity = tokio::task::spawn_blocking(move || verifier.verify(&username, &password))
        .await
        .map_err(|e| {
            error!("Credential verification task failed: {}", e);
            AuthApiError::InternalError
        })?
        .map_err(|e| match e {
            CredentialError::InvalidCredentials => {
                warn!("❌ Failed login attempt: {}", attempted);
                AuthApiError::InvalidCredentials
            }
            other => {
                error!("Login for {} failed: {:#}", attempted, other);
                AuthApiError::InternalError
            }
        })?;

    let issued = state
        .jwt_handler
        .issue(&identity, state.clock.now())
        .map_err(|e| {
            error!("{:#}", CredentialError::Issue(e));
            AuthApiError::InternalError
        })?;

    info!(
        "✅ Login successful: {} (token expires {})",
        identity.username,
        issued.expires_at.to_rfc3339()
    );

    Ok(Json(LoginResponse {
        username: identity.username,
        token: issued.token,
    }))
}

/// Get current user info - GET /api/auth/user
/// Answers 400 for a missing or non-bearer header instead of the 401 the route
/// gates use. The token itself was already checked by the `authenticate` stage.
pub async fn current_user(
    headers: HeaderMap,
    identity: Option<Extension<AuthenticatedIdentity>>,
    outcome: Option<Extension<AuthOutcome>>,
) -> Result<Json<UserResponse>, AuthApiError> {
    let BearerHeader::Token(_) = bearer_token(&headers) else {
        return Err(AuthApiError::MissingBearer);
    };

    match identity {
        Some(Extension(identity)) => Ok(Json(UserResponse::from(&identity))),
        None => {
            info!(
                "Rejected token on /api/auth/user: {:?}",
                outcome.map(|Extension(o)| o)
            );
            Err(AuthApiError::InvalidToken)
        }
    }
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    MissingBearer,
    InvalidToken,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid Username or Password")
            }
            AuthApiError::MissingBearer => (
                StatusCode::BAD_REQUEST,
                "Invalid authorization format. Use: Bearer {token}",
            ),
            AuthApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
