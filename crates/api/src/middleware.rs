use std::sync::Arc;

use axum::{
    extract::{MatchedPath, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use billjobs_auth::{Access, AccessTable, AuthError, User};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;
use crate::session;

#[derive(Clone)]
pub struct GateState {
    pub access: Arc<AccessTable>,
    pub services: Arc<AppServices>,
}

/// Permission gate, installed as a route layer so the matched route is known.
///
/// Public routes pass untouched. Protected routes need a token or a live
/// session; otherwise the request is answered with 401 before any handler runs.
pub async fn permission_gate(
    State(gate): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let access = req
        .extensions()
        .get::<MatchedPath>()
        .map(|route| gate.access.classify(route.as_str()))
        .unwrap_or(Access::Protected);

    if access == Access::Public {
        return Ok(next.run(req).await);
    }

    let user = authenticate(&gate.services, req.headers()).inspect_err(|e| {
        tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request: {e}");
    })?;

    req.extensions_mut().insert(CurrentUser::new(user));
    Ok(next.run(req).await)
}

/// Token header first, then session cookie.
fn authenticate(services: &AppServices, headers: &HeaderMap) -> Result<User, AuthError> {
    if let Some(key) = extract_token(headers)? {
        return services.auth.authenticate_token(key);
    }

    if let Some(session) = session::session_key(headers) {
        let user_id = services
            .sessions
            .user_for(&session)
            .ok_or(AuthError::InvalidToken)?;
        return services.auth.active_user(user_id);
    }

    Err(AuthError::NotAuthenticated)
}

/// `Authorization: Token <key>` or `Bearer <key>`.
///
/// Other schemes are ignored; a recognised scheme without a key is invalid.
fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| AuthError::InvalidToken)?;

    let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Ok(None);
    }

    let key = rest.trim();
    if key.is_empty() || key.contains(' ') {
        return Err(AuthError::InvalidToken);
    }
    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(authorization: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static(authorization));
        h
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(extract_token(&headers("Token abc")).unwrap(), Some("abc"));
        assert_eq!(extract_token(&headers("bearer abc")).unwrap(), Some("abc"));
    }

    #[test]
    fn ignores_foreign_schemes() {
        assert_eq!(extract_token(&headers("Basic YWRtaW46am9icw==")).unwrap(), None);
        assert_eq!(extract_token(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn rejects_empty_or_spaced_keys() {
        assert_eq!(extract_token(&headers("Token")).unwrap_err(), AuthError::InvalidToken);
        assert_eq!(extract_token(&headers("Token a b")).unwrap_err(), AuthError::InvalidToken);
    }
}
