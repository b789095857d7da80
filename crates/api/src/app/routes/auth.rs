use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use billjobs_auth::{AuthRequest, INVALID_CREDENTIALS};

use crate::app::dto::{self, LenientBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::session;

/// Where a successful login lands when no usable `next` was given.
const DEFAULT_REDIRECT: &str = "/users/";

/// `POST /api-token-auth/`
pub async fn obtain_token(
    Extension(services): Extension<Arc<AppServices>>,
    LenientBody(request): LenientBody<AuthRequest>,
) -> Result<Json<dto::TokenResponse>, ApiError> {
    let auth = services.auth.clone();
    let token = tokio::task::spawn_blocking(move || auth.obtain_token(&request))
        .await
        .map_err(|e| ApiError::internal(format!("token task failed: {e}")))??;

    Ok(Json(dto::TokenResponse {
        token: token.into_string(),
    }))
}

/// `GET /api-auth/login/`
pub async fn login_page(Query(query): Query<dto::LoginQuery>) -> Html<String> {
    Html(render_login(query.next.as_deref().unwrap_or(""), "", None))
}

/// `POST /api-auth/login/`
///
/// Success sets the session cookie and redirects; anything else re-renders the
/// form with 200.
pub async fn login_submit(
    Extension(services): Extension<Arc<AppServices>>,
    LenientBody(form): LenientBody<dto::LoginForm>,
) -> Result<Response, ApiError> {
    let next = form.next.clone().unwrap_or_default();
    let username = form.username.clone().unwrap_or_default();
    let request = AuthRequest {
        username: form.username,
        password: form.password,
    };

    if request.is_blank() {
        return Ok(Html(render_login(&next, "", None)).into_response());
    }

    let auth = services.auth.clone();
    let checked = tokio::task::spawn_blocking(move || auth.check_credentials(&request))
        .await
        .map_err(|e| ApiError::internal(format!("login task failed: {e}")))?;

    let user = match checked {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!("login page rejected credentials: {e}");
            return Ok(Html(render_login(&next, &username, Some(INVALID_CREDENTIALS))).into_response());
        }
    };

    let key = services
        .sessions
        .create(user.id)
        .ok_or_else(|| ApiError::internal("session store lock poisoned"))?;
    tracing::info!(user_id = %user.id, "session login");

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, safe_redirect(&next).to_string()),
            (header::SET_COOKIE, session::set_cookie(key)),
        ],
    )
        .into_response())
}

/// `GET|POST /api-auth/logout/`
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    if let Some(key) = session::session_key(&headers) {
        if let Some(user_id) = services.sessions.remove(&key) {
            tracing::info!(user_id = %user_id, "session logout");
        }
    }

    (
        [(header::SET_COOKIE, session::clear_cookie())],
        Html(page(
            "Logged out",
            &format!(
                "<p>You have been logged out.</p><p><a href=\"{}\">Log in again</a></p>",
                super::LOGIN
            ),
        )),
    )
        .into_response()
}

/// Only same-site absolute paths are followed.
fn safe_redirect(next: &str) -> &str {
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control);
    if local { next } else { DEFAULT_REDIRECT }
}

fn render_login(next: &str, username: &str, error: Option<&str>) -> String {
    let error = error
        .map(|msg| format!("<p class=\"error\">{}</p>", escape_html(msg)))
        .unwrap_or_default();

    page(
        "Log in",
        &format!(
            "{error}\
             <form method=\"post\" action=\"{action}\">\
             <label>Username <input type=\"text\" name=\"username\" value=\"{username}\" autofocus></label>\
             <label>Password <input type=\"password\" name=\"password\"></label>\
             <input type=\"hidden\" name=\"next\" value=\"{next}\">\
             <button type=\"submit\">Log in</button>\
             </form>",
            action = super::LOGIN,
            username = escape_html(username),
            next = escape_html(next),
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title} | billjobs</title></head>\
         <body><h1>{title}</h1>{body}</body></html>"
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
