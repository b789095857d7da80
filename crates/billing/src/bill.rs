use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use billjobs_core::{BillId, DomainError, DomainResult, FieldErrors, UserId};

/// One billed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub service: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl BillLine {
    pub fn total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// A stored bill. Immutable once numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub id: BillId,
    pub owner: UserId,
    /// `F<YYYYMM><seq>`, unique.
    pub number: String,
    pub billing_date: NaiveDate,
    pub issuer_address: String,
    pub billing_address: String,
    pub currency: String,
    pub lines: Vec<BillLine>,
}

impl Bill {
    /// Sum of line totals.
    pub fn amount(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.total()))
    }

    /// Owners see their own bills; admins see all of them.
    pub fn is_visible_to(&self, user_id: UserId, is_admin: bool) -> bool {
        is_admin || self.owner == user_id
    }
}

/// Bill contents before the store assigns an id and a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBill {
    pub owner: UserId,
    pub billing_date: NaiveDate,
    pub issuer_address: String,
    pub billing_address: String,
    pub currency: String,
    pub lines: Vec<BillLine>,
}

impl NewBill {
    pub fn new(owner: UserId, billing_date: NaiveDate) -> Self {
        Self {
            owner,
            billing_date,
            issuer_address: String::new(),
            billing_address: String::new(),
            currency: "EUR".to_string(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, service: impl Into<String>, quantity: u32, unit_price: u64) -> Self {
        self.lines.push(BillLine {
            service: service.into(),
            description: String::new(),
            quantity,
            unit_price,
        });
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();

        if self.billing_address.trim().is_empty() {
            errors
                .entry("billing_address".into())
                .or_default()
                .push("This field is required.".into());
        }

        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            errors
                .entry("currency".into())
                .or_default()
                .push("Expected a three-letter ISO code.".into());
        }

        for (idx, line) in self.lines.iter().enumerate() {
            if line.service.trim().is_empty() {
                errors
                    .entry(format!("lines[{idx}].service"))
                    .or_default()
                    .push("This field is required.".into());
            }
            if line.quantity == 0 {
                errors
                    .entry(format!("lines[{idx}].quantity"))
                    .or_default()
                    .push("Ensure this value is greater than or equal to 1.".into());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    pub(crate) fn into_bill(self, id: BillId, number: String) -> Bill {
        Bill {
            id,
            owner: self.owner,
            number,
            billing_date: self.billing_date,
            issuer_address: self.issuer_address,
            billing_address: self.billing_address,
            currency: self.currency,
            lines: self.lines,
        }
    }
}

/// Bill number for the `seq`-th bill (1-based) of the month containing `date`.
pub fn bill_number(date: NaiveDate, seq: u32) -> String {
    format!("F{:04}{:02}{:03}", date.year(), date.month(), seq)
}

/// `1250, "EUR"` → `"12.50 EUR"`.
pub fn format_amount(amount: u64, currency: &str) -> String {
    format!("{}.{:02} {}", amount / 100, amount % 100, currency)
}
