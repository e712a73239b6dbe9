//! Simple router: exact path match on (METHOD, path).

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RouteId(pub u32);

/// Maps (method, path) -> RouteId. Method is upper-cased, path stored without surrounding slashes.
#[derive(Clone, Debug, Default)]
pub struct Router {
    table: HashMap<(String, String), RouteId>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route. If (method, path) is taken, nothing changes and the existing id is returned.
    pub fn add(&mut self, method: &str, path: &str, id: RouteId) -> Option<RouteId> {
        let key = route_key(method, path);
        if let Some(existing) = self.table.get(&key) {
            return Some(*existing);
        }
        self.table.insert(key, id);
        None
    }

    pub fn match_route(&self, method: &str, path: &str) -> Option<RouteId> {
        self.table.get(&route_key(method, path)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// `/non-null/`, `non-null` and `/non-null` are the same path.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

fn route_key(method: &str, path: &str) -> (String, String) {
    (method.to_uppercase(), normalize_path(path).to_owned())
}
