//! `billjobs-core`: identifiers and the domain error model shared by every crate.
//!
//! No HTTP, no storage, no crypto.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{BillId, UserId};
