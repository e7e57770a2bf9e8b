//! Role types for marketplace access control.
//!
//! Every user holds exactly one role, stored in their role profile. Roles
//! form a strict linear hierarchy: a higher role satisfies any requirement
//! of a lower one.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Marketplace role held by a user.
///
/// Variants are declared lowest first so that the derived ordering is the
/// privilege ordering: `Customer < Vendor < Administrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Buyer browsing and purchasing from vendors.
    Customer,
    /// Seller with an approved vendor account.
    Vendor,
    /// Platform operator.
    Administrator,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 3] = [Role::Customer, Role::Vendor, Role::Administrator];

    /// Parses a stored or submitted role name.
    ///
    /// Matching ignores case and surrounding whitespace and accepts the
    /// aliases found across deployments (`admin`, `customer`, ...).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cliente" | "customer" | "client" => Some(Self::Customer),
            "vendedor" | "vendor" => Some(Self::Vendor),
            "administrador" | "administrator" | "admin" => Some(Self::Administrator),
            _ => None,
        }
    }

    /// Returns the canonical name used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "cliente",
            Self::Vendor => "vendedor",
            Self::Administrator => "administrador",
        }
    }

    /// Returns true if holding `self` meets a requirement of `required`.
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    /// Returns true if this role has administrator privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Administrator)
    }

    /// Returns true if a user may pick this role for themselves at sign-up.
    #[must_use]
    pub fn is_self_assignable(&self) -> bool {
        !self.is_admin()
    }

    /// Returns the page a user holding this role lands on when sent away
    /// from a route they may not enter.
    #[must_use]
    pub const fn landing_page(&self) -> &'static str {
        match self {
            Self::Customer => "/dashboard",
            Self::Vendor => "/vendor",
            Self::Administrator => "/admin/dashboard",
        }
    }
}

/// Landing page for an optional role; users without a role land where
/// customers do.
#[must_use]
pub fn landing_page_for(role: Option<Role>) -> &'static str {
    role.unwrap_or(Role::Customer).landing_page()
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_linear() {
        assert!(Role::Customer < Role::Vendor);
        assert!(Role::Vendor < Role::Administrator);
    }

    #[test]
    fn higher_roles_satisfy_lower_requirements() {
        for held in Role::ALL {
            for required in Role::ALL {
                assert_eq!(held.satisfies(required), held >= required);
            }
        }
        assert!(Role::Administrator.satisfies(Role::Customer));
        assert!(!Role::Customer.satisfies(Role::Vendor));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("ADMINISTRADOR"), Some(Role::Administrator));
        assert_eq!(Role::parse("administrador"), Some(Role::Administrator));
        assert_eq!(Role::parse(" Vendedor "), Some(Role::Vendor));
        assert_eq!(Role::parse("Cliente"), Some(Role::Customer));
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Role::parse("admin"), Some(Role::Administrator));
        assert_eq!(Role::parse("Admin"), Some(Role::Administrator));
        assert_eq!(Role::parse("vendor"), Some(Role::Vendor));
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn landing_pages() {
        assert_eq!(Role::Administrator.landing_page(), "/admin/dashboard");
        assert_eq!(Role::Vendor.landing_page(), "/vendor");
        assert_eq!(Role::Customer.landing_page(), "/dashboard");
        assert_eq!(landing_page_for(None), "/dashboard");
    }

    #[test]
    fn administrator_is_not_self_assignable() {
        assert!(Role::Customer.is_self_assignable());
        assert!(Role::Vendor.is_self_assignable());
        assert!(!Role::Administrator.is_self_assignable());
    }

    #[test]
    fn serialization_uses_canonical_names() {
        let json = serde_json::to_string(&Role::Administrator).expect("serialize");
        assert_eq!(json, "\"administrador\"");

        let parsed: Role = serde_json::from_str("\"ADMIN\"").expect("deserialize");
        assert_eq!(parsed, Role::Administrator);

        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }
}
