//! Credential storage seams and their in-memory implementations.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;

use billjobs_core::UserId;

use crate::{Token, User, UserRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Read-mostly user repository.
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive username match.
    fn lookup_user(&self, username: &str) -> Option<User>;
    fn get(&self, id: UserId) -> Option<User>;
    /// All users ordered by id.
    fn list(&self) -> Vec<User>;
    /// Persist a new user and assign its id.
    fn insert(&self, record: UserRecord) -> Result<User, StoreError>;
}

/// One token per user.
pub trait TokenStore: Send + Sync {
    fn token_for(&self, user_id: UserId) -> Option<Token>;

    /// Store `candidate` unless the user already has a token; return whichever
    /// token is stored afterwards.
    fn get_or_insert(&self, user_id: UserId, candidate: Token) -> Result<Token, StoreError>;

    fn user_for(&self, token: &Token) -> Option<UserId>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct UserTable {
    next_id: u64,
    by_id: BTreeMap<UserId, User>,
    by_username: HashMap<String, UserId>,
}

/// In-memory user store for tests/dev. Ids start at 1.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn lookup_user(&self, username: &str) -> Option<User> {
        let table = self.inner.read().ok()?;
        let id = table.by_username.get(username)?;
        table.by_id.get(id).cloned()
    }

    fn get(&self, id: UserId) -> Option<User> {
        let table = self.inner.read().ok()?;
        table.by_id.get(&id).cloned()
    }

    fn list(&self) -> Vec<User> {
        match self.inner.read() {
            Ok(table) => table.by_id.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn insert(&self, record: UserRecord) -> Result<User, StoreError> {
        let mut table = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if table.by_username.contains_key(&record.username) {
            return Err(StoreError::DuplicateUsername(record.username));
        }

        table.next_id += 1;
        let id = UserId::new(table.next_id);
        let user = record.into_user(id);
        table.by_username.insert(user.username.clone(), id);
        table.by_id.insert(id, user.clone());
        Ok(user)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory tokens
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct TokenTable {
    by_user: HashMap<UserId, Token>,
    by_key: HashMap<Token, UserId>,
}

/// In-memory token store; get-or-insert happens under a single write lock.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<TokenTable>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn token_for(&self, user_id: UserId) -> Option<Token> {
        let table = self.inner.read().ok()?;
        table.by_user.get(&user_id).cloned()
    }

    fn get_or_insert(&self, user_id: UserId, candidate: Token) -> Result<Token, StoreError> {
        let mut table = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(existing) = table.by_user.get(&user_id) {
            return Ok(existing.clone());
        }

        table.by_key.insert(candidate.clone(), user_id);
        table.by_user.insert(user_id, candidate.clone());
        Ok(candidate)
    }

    fn user_for(&self, token: &Token) -> Option<UserId> {
        let table = self.inner.read().ok()?;
        table.by_key.get(token).copied()
    }
}
