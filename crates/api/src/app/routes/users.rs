use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use chrono::Utc;

use billjobs_auth::{NewUser, UserRole};
use billjobs_core::UserId;

use crate::app::dto::{self, LenientBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Json<Vec<dto::UserResponse>> {
    let users = services.users().list();
    Json(users.iter().map(dto::UserResponse::from).collect())
}

/// Any authenticated caller may register members; only admins may grant the
/// admin role.
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    LenientBody(new_user): LenientBody<NewUser>,
) -> Result<(StatusCode, Json<dto::UserResponse>), ApiError> {
    if new_user.role != UserRole::Member && !current.is_admin() {
        tracing::warn!(user_id = %current.id(), role = %new_user.role, "role escalation refused");
        return Err(ApiError::Forbidden);
    }

    // Hashing is CPU-bound.
    let auth = services.auth.clone();
    let user = tokio::task::spawn_blocking(move || auth.register(new_user, Utc::now()))
        .await
        .map_err(|e| ApiError::internal(format!("register task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(dto::UserResponse::from(&user))))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<dto::UserResponse>, ApiError> {
    let id: UserId = id.parse()?;
    let user = services.users().get(id).ok_or(ApiError::NotFound)?;
    Ok(Json(dto::UserResponse::from(&user)))
}
