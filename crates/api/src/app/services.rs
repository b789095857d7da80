//! Service wiring: stores, authenticator, renderer and sessions.

use std::sync::Arc;

use chrono::Utc;

use billjobs_auth::{
    AuthError, Authenticator, InMemoryTokenStore, InMemoryUserStore, NewUser, TokenStore, User,
    UserRole, UserStore,
};
use billjobs_billing::{BillRenderer, BillStore, InMemoryBillStore, PdfRenderer};

use crate::config::{AdminSeed, AppConfig};
use crate::session::SessionStore;

/// Everything handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub auth: Authenticator,
    pub bills: Arc<dyn BillStore>,
    pub renderer: Arc<dyn BillRenderer>,
    pub sessions: SessionStore,
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        bills: Arc<dyn BillStore>,
        renderer: Arc<dyn BillRenderer>,
    ) -> Self {
        Self {
            auth: Authenticator::new(users, tokens),
            bills,
            renderer,
            sessions: SessionStore::new(),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory(config: &AppConfig) -> Self {
        let mut services = Self::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(InMemoryBillStore::new()),
            Arc::new(PdfRenderer::new(config.issuer.clone())),
        );
        services.sessions = SessionStore::with_ttl(config.session_ttl);
        services
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        self.auth.users()
    }

    pub fn seed_admin(&self, seed: &AdminSeed) -> Result<User, AuthError> {
        let new_user =
            NewUser::new(seed.username.clone(), seed.password.clone()).with_role(UserRole::Admin);
        self.auth.register(new_user, Utc::now())
    }
}
