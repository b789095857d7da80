//! Credential checks and token issuance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use billjobs_core::{DomainError, UserId};

use crate::{AuthError, NewUser, PasswordHasher, StoreError, Token, TokenStore, User, UserStore};

/// Message returned for every failed credential check.
pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

/// Username/password pair as submitted. Both fields may be absent on the wire.
#[derive(Clone, Default, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl AuthRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// True when neither field carries anything.
    pub fn is_blank(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
        blank(&self.username) && blank(&self.password)
    }
}

impl core::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Authentication policy over injected user and token stores.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    hasher: PasswordHasher,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            users,
            tokens,
            hasher: PasswordHasher::new(),
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Resolve a credential pair to an active user.
    ///
    /// Every failure collapses into [`AuthError::InvalidCredentials`] so the
    /// caller cannot tell which field was wrong. A stored hash that cannot be
    /// parsed is logged and treated as a mismatch.
    pub fn check_credentials(&self, request: &AuthRequest) -> Result<User, AuthError> {
        let (Some(username), Some(password)) = (request.username.as_deref(), request.password.as_deref())
        else {
            return Err(AuthError::InvalidCredentials);
        };
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.users.lookup_user(username) else {
            tracing::debug!("credential check failed: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = %user.id, "credential check failed: wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, "stored password hash unusable: {e}");
                return Err(AuthError::InvalidCredentials);
            }
        }

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "credential check failed: inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Exchange credentials for the user's token, minting it on first use.
    pub fn obtain_token(&self, request: &AuthRequest) -> Result<Token, AuthError> {
        let user = self.check_credentials(request)?;
        let token = self.tokens.get_or_insert(user.id, Token::generate())?;
        tracing::info!(user_id = %user.id, "api token issued");
        Ok(token)
    }

    /// Resolve a presented token key to its active user.
    pub fn authenticate_token(&self, key: &str) -> Result<User, AuthError> {
        let token = Token::parse(key).ok_or(AuthError::InvalidToken)?;
        let user_id = self.tokens.user_for(&token).ok_or(AuthError::InvalidToken)?;
        self.active_user(user_id)
    }

    /// Load a user referenced by a session or token, rejecting inactive accounts.
    pub fn active_user(&self, user_id: UserId) -> Result<User, AuthError> {
        match self.users.get(user_id) {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Validate, hash and store a new account.
    pub fn register(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, AuthError> {
        let (username, password) = new_user.validate()?;
        let password_hash = self.hasher.hash(&password)?;
        let record = new_user.into_record(username, password_hash, now);

        match self.users.insert(record) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "user created");
                Ok(user)
            }
            Err(StoreError::DuplicateUsername(_)) => Err(DomainError::field(
                "username",
                "A user with that username already exists.",
            )
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryTokenStore, InMemoryUserStore, UserRole};

    fn authenticator() -> Authenticator {
        let auth = Authenticator::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryTokenStore::new()),
        );
        auth.register(NewUser::new("admin", "jobs").with_role(UserRole::Admin), Utc::now())
            .unwrap();
        auth.register(NewUser::new("steve", "jobs"), Utc::now()).unwrap();
        auth
    }

    #[test]
    fn valid_credentials_yield_a_token() {
        let auth = authenticator();
        let token = auth.obtain_token(&AuthRequest::new("admin", "jobs")).unwrap();
        assert_eq!(token.as_str().len(), 40);
    }

    #[test]
    fn issuance_is_idempotent() {
        let auth = authenticator();
        let first = auth.obtain_token(&AuthRequest::new("steve", "jobs")).unwrap();
        let second = auth.obtain_token(&AuthRequest::new("steve", "jobs")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tokens_are_per_user() {
        let auth = authenticator();
        let admin = auth.obtain_token(&AuthRequest::new("admin", "jobs")).unwrap();
        let steve = auth.obtain_token(&AuthRequest::new("steve", "jobs")).unwrap();
        assert_ne!(admin, steve);
        assert_eq!(auth.authenticate_token(steve.as_str()).unwrap().username, "steve");
    }

    #[test]
    fn bad_credentials_are_indistinguishable() {
        let auth = authenticator();
        let cases = [
            AuthRequest::new("foo", "bar"),
            AuthRequest::new("admin", "wrong"),
            AuthRequest::new("", "jobs"),
            AuthRequest { username: Some("admin".into()), password: None },
            AuthRequest::default(),
        ];

        for req in cases {
            let err = auth.obtain_token(&req).unwrap_err();
            assert_eq!(err, AuthError::InvalidCredentials);
            assert_eq!(err.to_string(), INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn unknown_or_malformed_tokens_are_invalid() {
        let auth = authenticator();
        assert_eq!(auth.authenticate_token("nope").unwrap_err(), AuthError::InvalidToken);
        let unissued = Token::generate();
        assert_eq!(
            auth.authenticate_token(unissued.as_str()).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn duplicate_registration_is_a_field_error() {
        let auth = authenticator();
        let err = auth.register(NewUser::new("admin", "x"), Utc::now()).unwrap_err();
        let AuthError::Domain(DomainError::Validation(errors)) = err else {
            panic!("expected field error, got {err:?}");
        };
        assert_eq!(errors["username"], vec!["A user with that username already exists.".to_string()]);
    }

    #[test]
    fn inactive_accounts_cannot_log_in() {
        let auth = authenticator();
        let mut record = NewUser::new("ghost", "jobs").into_record(
            "ghost".into(),
            PasswordHasher::new().hash("jobs").unwrap(),
            Utc::now(),
        );
        record.is_active = false;
        let ghost = auth.users().insert(record).unwrap();

        assert_eq!(
            auth.check_credentials(&AuthRequest::new("ghost", "jobs")).unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(auth.active_user(ghost.id).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn debug_never_prints_password() {
        let dbg = format!("{:?}", AuthRequest::new("admin", "jobs"));
        assert!(!dbg.contains("jobs"));
    }
}
