use billjobs_auth::User;
use billjobs_core::UserId;

/// The authenticated caller, attached to the request by the permission gate.
///
/// Present on every protected route; absent on public ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user: User,
}

impl CurrentUser {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}
