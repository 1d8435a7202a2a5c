//! Unauthorized responder: the fixed-shape 401 emitted by route gates.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Why a protected route refused the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthorized {
    MissingToken,
    InvalidToken,
    InsufficientRole,
}

impl Unauthorized {
    pub fn reason(self) -> &'static str {
        match self {
            Unauthorized::MissingToken => "Full authentication is required to access this resource",
            Unauthorized::InvalidToken => "Invalid or expired token",
            Unauthorized::InsufficientRole => "Insufficient role for this resource",
        }
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            format!("Access Denied: {}", self.reason()),
        )
            .into_response()
    }
}
