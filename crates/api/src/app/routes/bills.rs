use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use billjobs_core::BillId;

use crate::app::dto::{self, LenientBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

/// Own bills, or every bill for admins.
pub async fn list_bills(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Json<Vec<dto::BillResponse>> {
    let bills = if current.is_admin() {
        services.bills.list()
    } else {
        services.bills.list_for_owner(current.id())
    };
    Json(bills.iter().map(dto::BillResponse::from).collect())
}

/// Admin only. The store assigns the id and the monthly number.
pub async fn create_bill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    LenientBody(body): LenientBody<dto::CreateBillRequest>,
) -> Result<(StatusCode, Json<dto::BillResponse>), ApiError> {
    if !current.is_admin() {
        tracing::info!(user_id = %current.id(), "bill creation refused");
        return Err(ApiError::Forbidden);
    }

    let new_bill = body.into_new_bill(|id| services.users().get(id).is_some())?;
    let bill = services.bills.insert(new_bill)?;
    Ok((StatusCode::CREATED, Json(dto::BillResponse::from(&bill))))
}

pub async fn generate_pdf(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    Path(bill_id): Path<String>,
) -> Result<Response, ApiError> {
    let bill_id: BillId = bill_id.parse()?;
    let bill = services.bills.get(bill_id).ok_or(ApiError::NotFound)?;

    if !bill.is_visible_to(current.id(), current.is_admin()) {
        tracing::info!(bill_id = %bill.id, user_id = %current.id(), "bill download refused");
        return Err(ApiError::Forbidden);
    }

    let document = services.renderer.render(&bill)?;
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        bill.number,
        services.renderer.file_extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, services.renderer.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response())
}
