//! Billing: bills, their storage, and PDF rendering.
//!
//! Amounts are integers in the smallest currency unit (e.g. cents).

pub mod bill;
pub mod error;
pub mod pdf;
pub mod store;

pub use bill::{Bill, BillLine, NewBill, bill_number, format_amount};
pub use error::BillingError;
pub use pdf::{BillRenderer, PdfRenderer};
pub use store::{BillStore, InMemoryBillStore};
