use axum::{
    Router,
    routing::{get, post},
};

use billjobs_auth::AccessTable;

pub mod auth;
pub mod bills;
pub mod system;
pub mod users;

pub const HEALTH: &str = "/health";
pub const LOGIN: &str = "/api-auth/login/";
pub const LOGOUT: &str = "/api-auth/logout/";
pub const TOKEN_AUTH: &str = "/api-token-auth/";
pub const TOKEN_AUTH_BARE: &str = "/api-token-auth";
pub const USERS: &str = "/users/";
pub const USER_DETAIL: &str = "/users/:id";
pub const USER_DETAIL_SLASH: &str = "/users/:id/";
pub const BILLS: &str = "/bills/";
pub const GENERATE_PDF: &str = "/generate_pdf/:bill_id";

/// Which routes anonymous callers may reach. Anything not listed is protected.
pub fn access_table() -> AccessTable {
    AccessTable::new()
        .public(HEALTH)
        .public(LOGIN)
        .public(LOGOUT)
        .public(TOKEN_AUTH)
        .public(TOKEN_AUTH_BARE)
        .protected(USERS)
        .protected(USER_DETAIL)
        .protected(USER_DETAIL_SLASH)
        .protected(BILLS)
        .protected(GENERATE_PDF)
}

pub fn router() -> Router {
    Router::new()
        .route(HEALTH, get(system::health))
        .route(LOGIN, get(auth::login_page).post(auth::login_submit))
        .route(LOGOUT, get(auth::logout).post(auth::logout))
        .route(TOKEN_AUTH, post(auth::obtain_token))
        .route(TOKEN_AUTH_BARE, post(auth::obtain_token))
        .route(USERS, get(users::list_users).post(users::create_user))
        .route(USER_DETAIL, get(users::get_user))
        .route(USER_DETAIL_SLASH, get(users::get_user))
        .route(BILLS, get(bills::list_bills).post(bills::create_bill))
        .route(GENERATE_PDF, get(bills::generate_pdf))
}
