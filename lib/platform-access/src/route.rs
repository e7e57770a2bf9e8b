//! Static classification of URL paths.
//!
//! Two ordered tables drive classification: the prefixes that require an
//! authenticated caller, and the prefixes that additionally require a
//! minimum role. Lookups scan in declared order and take the first prefix
//! that matches.

use crate::role::Role;

/// Paths that require an authenticated caller.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/admin",
    "/vendor",
    "/profile",
    "/become-vendor",
    "/status",
];

/// Minimum role per path prefix, in lookup order.
pub const ROLE_PREFIXES: &[(&str, Role)] = &[
    ("/admin", Role::Administrator),
    ("/vendor", Role::Vendor),
    ("/dashboard", Role::Customer),
    ("/become-vendor", Role::Customer),
    ("/status", Role::Customer),
];

/// How a path is guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteClass {
    /// Whether an authenticated caller is required.
    pub protected: bool,
    /// Minimum role, if the path restricts roles beyond authentication.
    pub required: Option<Role>,
}

impl RouteClass {
    /// Returns the set of roles permitted on this path, or `None` if any
    /// authenticated caller may enter.
    #[must_use]
    pub fn required_roles(&self) -> Option<Vec<Role>> {
        self.required.map(|min| {
            Role::ALL
                .into_iter()
                .filter(|role| role.satisfies(min))
                .collect()
        })
    }

    /// Returns true if `role` may enter a path of this class.
    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        self.required.is_none_or(|min| role.satisfies(min))
    }
}

/// Path classifier over the two prefix tables.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    protected: Vec<String>,
    roles: Vec<(String, Role)>,
}

impl RouteClassifier {
    /// Creates a classifier over custom tables.
    #[must_use]
    pub fn new(protected: Vec<String>, roles: Vec<(String, Role)>) -> Self {
        Self { protected, roles }
    }

    /// Classifies `path`.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let protected = self
            .protected
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()));
        let required = self
            .roles
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, role)| *role);
        RouteClass {
            protected,
            required,
        }
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new(
            PROTECTED_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            ROLE_PREFIXES
                .iter()
                .map(|(p, role)| ((*p).to_string(), *role))
                .collect(),
        )
    }
}
