//! Cookie sessions established by the browsable login page.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, header};
use uuid::Uuid;

use billjobs_core::UserId;

pub const SESSION_COOKIE: &str = "sessionid";

/// Two weeks.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: UserId,
    expires_at: Instant,
}

/// Session key → user. Keys are random v4 UUIDs.
///
/// Sessions expire `ttl` after login. Expired entries are dropped on the next
/// login, so the map is bounded by the logins of one TTL window.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    inner: RwLock<HashMap<Uuid, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// `None` only if the lock is poisoned.
    pub fn create(&self, user_id: UserId) -> Option<Uuid> {
        let now = Instant::now();
        let key = Uuid::new_v4();
        let mut map = self.inner.write().ok()?;
        map.retain(|_, s| s.expires_at > now);
        map.insert(
            key,
            Session {
                user_id,
                expires_at: now + self.ttl,
            },
        );
        Some(key)
    }

    pub fn user_for(&self, key: &Uuid) -> Option<UserId> {
        let map = self.inner.read().ok()?;
        map.get(key)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user_id)
    }

    pub fn remove(&self, key: &Uuid) -> Option<UserId> {
        let mut map = self.inner.write().ok()?;
        map.remove(key).map(|s| s.user_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Session key from the `Cookie` header(s), if one is present and well-formed.
pub fn session_key(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn set_cookie(key: Uuid) -> String {
    format!("{SESSION_COOKIE}={key}; HttpOnly; Path=/; SameSite=Lax")
}

pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn create_lookup_remove() {
        let store = SessionStore::new();
        let key = store.create(UserId::new(1)).unwrap();

        assert_eq!(store.user_for(&key), Some(UserId::new(1)));
        assert_eq!(store.remove(&key), Some(UserId::new(1)));
        assert_eq!(store.user_for(&key), None);
    }

    #[test]
    fn expired_sessions_stop_resolving_and_are_pruned() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        let stale = store.create(UserId::new(1)).unwrap();
        assert_eq!(store.user_for(&stale), None);

        store.create(UserId::new(2)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let key = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; sessionid={key}; lang=fr")).unwrap(),
        );
        assert_eq!(session_key(&headers), Some(key));
    }

    #[test]
    fn ignores_malformed_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid=not-a-uuid"));
        assert_eq!(session_key(&headers), None);
        assert_eq!(session_key(&HeaderMap::new()), None);
    }

    #[test]
    fn set_cookie_round_trips() {
        let key = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        let cookie = set_cookie(key);
        let pair = cookie.split(';').next().unwrap();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        assert_eq!(session_key(&headers), Some(key));
    }
}
