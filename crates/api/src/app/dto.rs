use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use billjobs_auth::User;
use billjobs_billing::{Bill, BillLine, NewBill, format_amount};
use billjobs_core::{DomainError, DomainResult, FieldErrors, UserId};

// -------------------------
// Request bodies
// -------------------------

/// JSON or urlencoded form body, falling back to `T::default()` when the body
/// is missing or unreadable.
///
/// Handlers then validate the (possibly empty) value themselves, so a bad body
/// produces the same 400 as bad field values rather than an extractor error.
#[derive(Debug)]
pub struct LenientBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for LenientBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("application/json"));

        let parsed = if is_json {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(v)| v)
                .map_err(|e| e.body_text())
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(v)| v)
                .map_err(|e| e.body_text())
        };

        Ok(Self(parsed.unwrap_or_else(|reason| {
            tracing::debug!(%reason, "unreadable request body, treating as empty");
            T::default()
        })))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// `POST /bills/` body. The store validates addresses, currency and lines.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBillRequest {
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub billing_date: Option<NaiveDate>,
    #[serde(default)]
    pub issuer_address: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub lines: Vec<BillLine>,
}

impl CreateBillRequest {
    /// Resolve the owner and date; `user_exists` checks the owner id.
    pub fn into_new_bill(self, user_exists: impl Fn(UserId) -> bool) -> DomainResult<NewBill> {
        let mut errors = FieldErrors::new();

        let owner = match self.owner.map(UserId::new) {
            Some(id) if user_exists(id) => Some(id),
            Some(id) => {
                errors
                    .entry("owner".into())
                    .or_default()
                    .push(format!("Invalid pk \"{id}\" - object does not exist."));
                None
            }
            None => {
                errors
                    .entry("owner".into())
                    .or_default()
                    .push("This field is required.".into());
                None
            }
        };

        if self.billing_date.is_none() {
            errors
                .entry("billing_date".into())
                .or_default()
                .push("This field is required.".into());
        }

        let (Some(owner), Some(billing_date)) = (owner, self.billing_date) else {
            return Err(DomainError::Validation(errors));
        };

        let mut bill = NewBill::new(owner, billing_date);
        bill.issuer_address = self.issuer_address.unwrap_or_default();
        bill.billing_address = self.billing_address.unwrap_or_default();
        if let Some(currency) = self.currency {
            bill.currency = currency.trim().to_string();
        }
        bill.lines = self.lines;
        Ok(bill)
    }
}

// -------------------------
// Response bodies
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub url: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            url: format!("/users/{}", user.id),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_admin(),
            is_active: user.is_active,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: u64,
    pub number: String,
    pub owner: u64,
    pub billing_date: NaiveDate,
    pub issuer_address: String,
    pub billing_address: String,
    pub currency: String,
    pub amount: u64,
    pub amount_display: String,
    pub lines: Vec<BillLine>,
    pub pdf_url: String,
}

impl From<&Bill> for BillResponse {
    fn from(bill: &Bill) -> Self {
        Self {
            id: bill.id.get(),
            number: bill.number.clone(),
            owner: bill.owner.get(),
            billing_date: bill.billing_date,
            issuer_address: bill.issuer_address.clone(),
            billing_address: bill.billing_address.clone(),
            currency: bill.currency.clone(),
            amount: bill.amount(),
            amount_display: format_amount(bill.amount(), &bill.currency),
            lines: bill.lines.clone(),
            pdf_url: format!("/generate_pdf/{}", bill.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(owner: Option<u64>, date: Option<(i32, u32, u32)>) -> CreateBillRequest {
        CreateBillRequest {
            owner,
            billing_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            billing_address: Some("1 Infinite Loop".into()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_owner_and_date_are_reported_together() {
        let DomainError::Validation(errors) = request(None, None).into_new_bill(|_| true).unwrap_err()
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors["owner"], vec!["This field is required."]);
        assert_eq!(errors["billing_date"], vec!["This field is required."]);
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let DomainError::Validation(errors) = request(Some(9), Some((2017, 9, 1)))
            .into_new_bill(|_| false)
            .unwrap_err()
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors["owner"], vec!["Invalid pk \"9\" - object does not exist."]);
    }

    #[test]
    fn resolved_request_keeps_default_currency() {
        let bill = request(Some(2), Some((2017, 9, 1)))
            .into_new_bill(|id| id == UserId::new(2))
            .unwrap();
        assert_eq!(bill.owner, UserId::new(2));
        assert_eq!(bill.currency, "EUR");
        assert_eq!(bill.billing_address, "1 Infinite Loop");
    }
}
