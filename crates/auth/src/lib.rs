//! `billjobs-auth`: credential checking, token issuance and route access policy.
//!
//! Decoupled from HTTP. Storage sits behind the [`UserStore`] and
//! [`TokenStore`] traits; the in-memory implementations back tests and the
//! development server.

pub mod access;
pub mod authenticator;
pub mod error;
pub mod password;
pub mod store;
pub mod token;
pub mod user;

pub use access::{Access, AccessTable};
pub use authenticator::{AuthRequest, Authenticator, INVALID_CREDENTIALS};
pub use error::AuthError;
pub use password::PasswordHasher;
pub use store::{InMemoryTokenStore, InMemoryUserStore, StoreError, TokenStore, UserStore};
pub use token::Token;
pub use user::{NewUser, User, UserRecord, UserRole};
