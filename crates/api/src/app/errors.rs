use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use billjobs_auth::{AuthError, INVALID_CREDENTIALS};
use billjobs_billing::BillingError;
use billjobs_core::{DomainError, FieldErrors};

/// Every failure a handler or the permission gate can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with the fixed non-field message.
    InvalidCredentials,
    /// 401, nothing presented.
    NotAuthenticated,
    /// 401, something presented that does not resolve.
    InvalidToken,
    Forbidden,
    NotFound,
    /// 400 with per-field messages.
    Validation(FieldErrors),
    BadRequest(String),
    /// 500; the message is logged, never sent.
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::NotAuthenticated => ApiError::NotAuthenticated,
            AuthError::InvalidToken => ApiError::InvalidToken,
            AuthError::Domain(e) => e.into(),
            AuthError::Store(e) => ApiError::Internal(e.to_string()),
            AuthError::Hashing(e) => ApiError::Internal(e),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => ApiError::Validation(errors),
            DomainError::NotFound | DomainError::InvalidId(_) => ApiError::NotFound,
            DomainError::Conflict(msg) | DomainError::InvariantViolation(msg) => {
                ApiError::BadRequest(msg)
            }
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Domain(e) => e.into(),
            BillingError::Poisoned | BillingError::Render(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "non_field_errors": [INVALID_CREDENTIALS] })),
            )
                .into_response(),
            ApiError::NotAuthenticated => unauthorized(AuthError::NotAuthenticated),
            ApiError::InvalidToken => unauthorized(AuthError::InvalidToken),
            ApiError::Forbidden => detail(
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action.",
            ),
            ApiError::NotFound => detail(StatusCode::NOT_FOUND, "Not found."),
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, axum::Json(errors)).into_response()
            }
            ApiError::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
            }
        }
    }
}

pub fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "detail": message.into() }))).into_response()
}

fn unauthorized(err: AuthError) -> Response {
    let mut response = detail(StatusCode::UNAUTHORIZED, err.to_string());
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Token"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_bad_requests() {
        let res = ApiError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthenticated_carries_challenge_header() {
        for err in [AuthError::NotAuthenticated, AuthError::InvalidToken] {
            let res = ApiError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Token");
        }
    }

    #[test]
    fn domain_errors_map_to_client_errors() {
        let res = ApiError::from(DomainError::invalid_id("UserId: x")).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = ApiError::from(DomainError::field("username", "taken")).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_are_server_errors() {
        let err = AuthError::Store(billjobs_auth::StoreError::Poisoned);
        assert_eq!(
            ApiError::from(err).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
