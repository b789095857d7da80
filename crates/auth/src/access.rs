//! Static route access policy.
//!
//! Each route path is either public or protected. The table is built once at
//! startup and never changes; a path it does not know is protected.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Reachable anonymously; never rejected for lack of credentials.
    Public,
    /// Requires a valid token or session.
    Protected,
}

/// Route path → access class.
///
/// Keys are route *patterns* as registered with the router (e.g. `/users/:id`),
/// not concrete request paths.
#[derive(Debug, Clone, Default)]
pub struct AccessTable {
    routes: HashMap<String, Access>,
}

impl AccessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self, route: impl Into<String>) -> Self {
        self.routes.insert(route.into(), Access::Public);
        self
    }

    pub fn protected(mut self, route: impl Into<String>) -> Self {
        self.routes.insert(route.into(), Access::Protected);
        self
    }

    pub fn classify(&self, route: &str) -> Access {
        self.routes.get(route).copied().unwrap_or(Access::Protected)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Entries sorted by route, for startup logging.
    pub fn entries(&self) -> Vec<(&str, Access)> {
        let mut entries: Vec<_> = self.routes.iter().map(|(r, a)| (r.as_str(), *a)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, Access)> for AccessTable {
    fn from_iter<I: IntoIterator<Item = (S, Access)>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().map(|(r, a)| (r.into(), a)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_registered_routes() {
        let table = AccessTable::new()
            .public("/api-token-auth/")
            .protected("/users/");

        assert_eq!(table.classify("/api-token-auth/"), Access::Public);
        assert_eq!(table.classify("/users/"), Access::Protected);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unknown_routes_are_protected() {
        let table = AccessTable::new().public("/health");
        assert_eq!(table.classify("/admin/"), Access::Protected);
        assert_eq!(AccessTable::new().classify("/health"), Access::Protected);
    }

    #[test]
    fn later_entries_override_earlier_ones() {
        let table: AccessTable = [("/x", Access::Public), ("/x", Access::Protected)]
            .into_iter()
            .collect();
        assert_eq!(table.classify("/x"), Access::Protected);
    }

    #[test]
    fn entries_are_sorted() {
        let table = AccessTable::new().protected("/users/").public("/health");
        let routes: Vec<_> = table.entries().into_iter().map(|(r, _)| r).collect();
        assert_eq!(routes, vec!["/health", "/users/"]);
    }
}
