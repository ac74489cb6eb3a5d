use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Stable error taxonomy exposed to clients.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<String>),
    #[error("invalid request")]
    InvalidRequest,

    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired refresh token")]
    InvalidRefreshToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("authorization header missing")]
    AuthHeaderMissing,
    #[error("invalid authorization header")]
    InvalidAuthHeader,

    #[error("token mismatch")]
    TokenMismatch,
    #[error("subject mismatch")]
    SubjectMismatch,
    #[error("forbidden")]
    Forbidden,

    #[error("customer already exists")]
    CustomerAlreadyExists,
    #[error("staff already exists")]
    StaffAlreadyExists,
    #[error("restaurant already exists")]
    RestaurantAlreadyExists,
    #[error("refresh token already exists")]
    RefreshTokenAlreadyExists,

    #[error("customer not found")]
    CustomerNotFound,
    #[error("restaurant not found")]
    RestaurantNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// HTTP rendering of an [`AuthError`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: &'static str,
    pub details: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    details: &'a [String],
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
            details: Vec::new(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        use AuthError::*;
        match err {
            Validation(details) => Self {
                details,
                ..Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "validation failed")
            },
            InvalidRequest => Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", "invalid request"),
            InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "invalid credentials")
            }
            InvalidRefreshToken => Self::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_REFRESH_TOKEN",
                "invalid or expired refresh token",
            ),
            InvalidToken | AuthHeaderMissing | InvalidAuthHeader => {
                Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "unauthorized")
            }
            TokenMismatch => Self::new(StatusCode::FORBIDDEN, "TOKEN_MISMATCH", "token mismatch"),
            SubjectMismatch | Forbidden => Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "forbidden"),
            CustomerAlreadyExists => {
                Self::new(StatusCode::CONFLICT, "CUSTOMER_ALREADY_EXISTS", "customer already exists")
            }
            StaffAlreadyExists => {
                Self::new(StatusCode::CONFLICT, "STAFF_ALREADY_EXISTS", "staff already exists")
            }
            RestaurantAlreadyExists => Self::new(
                StatusCode::CONFLICT,
                "RESTAURANT_ALREADY_EXISTS",
                "restaurant already exists",
            ),
            RefreshTokenAlreadyExists => Self::new(
                StatusCode::CONFLICT,
                "REFRESH_TOKEN_ALREADY_EXISTS",
                "refresh token already exists",
            ),
            CustomerNotFound | RestaurantNotFound => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "resource not found")
            }
            Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "an unexpected error occurred",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.code,
            message: self.message,
            details: &self.details,
        });
        (self.status, body).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
