//! Per-request access decisions.
//!
//! [`AccessPolicy::decide`] is the pure half of the authorization gate: given
//! the request path and the caller resolved from their session cookies, it
//! decides whether the request continues, goes to sign-in, or is sent to the
//! caller's landing page. Denials are always redirects, never error pages.

use crate::role::Role;
use crate::route::{RouteClass, RouteClassifier};
use crate::session::CurrentUser;

/// Sign-in entry point.
pub const SIGN_IN_PATH: &str = "/signin";

/// Sign-up entry point.
pub const SIGN_UP_PATH: &str = "/signup";

/// Prefix of the administration area.
pub const ADMIN_PREFIX: &str = "/admin";

/// Vendor-area paths customers may reach (application status pages).
pub const CLIENT_ACCESSIBLE_VENDOR_PREFIXES: &[&str] = &[
    "/vendor/status",
    "/vendor/application-status",
    "/vendor/my-application",
];

/// Outcome of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Continue to the handler.
    Allow,
    /// No session on a protected path.
    SignInRequired,
    /// Send the caller to another page, chosen by their role.
    Redirect(&'static str),
}

/// Route authorization rules.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    classifier: RouteClassifier,
    client_accessible: Vec<String>,
    admin_emails: Vec<String>,
}

impl AccessPolicy {
    /// Creates the marketplace policy with the given administrator
    /// e-mail allow-list.
    #[must_use]
    pub fn new(admin_emails: Vec<String>) -> Self {
        Self {
            classifier: RouteClassifier::default(),
            client_accessible: CLIENT_ACCESSIBLE_VENDOR_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            admin_emails: admin_emails
                .into_iter()
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    /// Classifies `path`.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        self.classifier.classify(path)
    }

    /// Returns true if the user may enter the administration area: either
    /// they hold the administrator role or one of their e-mails is on the
    /// override allow-list.
    #[must_use]
    pub fn is_admin(&self, user: &CurrentUser) -> bool {
        user.effective_role().is_admin()
            || user.emails().any(|email| {
                let email = email.to_lowercase();
                self.admin_emails.iter().any(|allowed| *allowed == email)
            })
    }

    /// Decides what happens to a request for `path` made by `user`.
    #[must_use]
    pub fn decide(&self, path: &str, user: Option<&CurrentUser>) -> AccessDecision {
        // Signed-in users never see the entry forms again.
        if path == SIGN_IN_PATH || path == SIGN_UP_PATH {
            return match user {
                Some(user) => AccessDecision::Redirect(user.effective_role().landing_page()),
                None => AccessDecision::Allow,
            };
        }

        let class = self.classify(path);
        if !class.protected {
            return AccessDecision::Allow;
        }

        let Some(user) = user else {
            return AccessDecision::SignInRequired;
        };
        let role = user.effective_role();

        if role == Role::Customer && self.is_client_accessible(path) {
            return AccessDecision::Allow;
        }

        if path.starts_with(ADMIN_PREFIX) {
            return if self.is_admin(user) {
                AccessDecision::Allow
            } else {
                AccessDecision::Redirect(role.landing_page())
            };
        }

        if class.permits(role) {
            AccessDecision::Allow
        } else {
            AccessDecision::Redirect(role.landing_page())
        }
    }

    fn is_client_accessible(&self, path: &str) -> bool {
        self.client_accessible
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::profile::{NewProfile, RoleProfile};
    use crate::route::{PROTECTED_PREFIXES, ROLE_PREFIXES};
    use carnaval_core::UserId;

    fn user_with_role(role: Role) -> CurrentUser {
        user_with(role, "someone@example.com")
    }

    fn user_with(role: Role, email: &str) -> CurrentUser {
        let id = UserId::new("u1");
        let profile = RoleProfile::from_new(
            NewProfile::new(id.clone(), email.to_string()).with_role(role),
        );
        CurrentUser::new(Identity::new(id, Some(email.to_string())), Some(profile))
    }

    fn policy() -> AccessPolicy {
        AccessPolicy::new(vec!["Admin@Carnaval-Oruro.com".to_string()])
    }

    #[test]
    fn public_paths_never_redirect() {
        let policy = policy();
        for path in ["/", "/catalog", "/api/auth/profile", "/about/us"] {
            assert_eq!(policy.decide(path, None), AccessDecision::Allow);
            for role in Role::ALL {
                let user = user_with_role(role);
                assert_eq!(policy.decide(path, Some(&user)), AccessDecision::Allow);
            }
        }
    }

    #[test]
    fn protected_paths_require_sign_in() {
        let policy = policy();
        for prefix in PROTECTED_PREFIXES {
            let path = format!("{prefix}/anything");
            assert_eq!(
                policy.decide(&path, None),
                AccessDecision::SignInRequired,
                "{path}"
            );
        }
    }

    #[test]
    fn role_table_allows_members_and_redirects_others_to_their_landing() {
        let policy = AccessPolicy::default();
        for (prefix, min) in ROLE_PREFIXES {
            let path = format!("{prefix}/page");
            for role in Role::ALL {
                let user = user_with_role(role);
                let expected = if role.satisfies(*min) {
                    AccessDecision::Allow
                } else {
                    AccessDecision::Redirect(role.landing_page())
                };
                assert_eq!(policy.decide(&path, Some(&user)), expected, "{role} on {path}");
            }
        }
    }

    #[test]
    fn customer_on_admin_goes_to_dashboard() {
        let user = user_with_role(Role::Customer);
        assert_eq!(
            policy().decide("/admin/x", Some(&user)),
            AccessDecision::Redirect("/dashboard")
        );
    }

    #[test]
    fn vendor_on_admin_goes_to_vendor_area() {
        let user = user_with_role(Role::Vendor);
        assert_eq!(
            policy().decide("/admin", Some(&user)),
            AccessDecision::Redirect("/vendor")
        );
    }

    #[test]
    fn customer_may_see_vendor_application_status() {
        let policy = policy();
        let user = user_with_role(Role::Customer);
        for path in CLIENT_ACCESSIBLE_VENDOR_PREFIXES {
            assert_eq!(policy.decide(path, Some(&user)), AccessDecision::Allow, "{path}");
        }
        assert_eq!(
            policy.decide("/vendor/products", Some(&user)),
            AccessDecision::Redirect("/dashboard")
        );
    }

    #[test]
    fn admin_email_allow_list_overrides_role() {
        let policy = policy();
        let listed = user_with(Role::Customer, "admin@carnaval-oruro.com");
        assert_eq!(policy.decide("/admin/x", Some(&listed)), AccessDecision::Allow);

        let unlisted = user_with(Role::Customer, "ana@example.com");
        assert_eq!(
            policy.decide("/admin/x", Some(&unlisted)),
            AccessDecision::Redirect("/dashboard")
        );
    }

    #[test]
    fn admin_email_matches_identity_without_profile() {
        let user = CurrentUser::new(
            Identity::new("u1", Some("ADMIN@carnaval-oruro.com".to_string())),
            None,
        );
        assert!(policy().is_admin(&user));
    }

    #[test]
    fn administrator_role_is_case_insensitive() {
        let role = Role::parse("ADMINISTRADOR").expect("known role");
        let user = user_with_role(role);
        assert_eq!(policy().decide("/admin/users", Some(&user)), AccessDecision::Allow);
    }

    #[test]
    fn missing_profile_is_treated_as_customer() {
        let policy = policy();
        let user = CurrentUser::new(Identity::new("u1", None), None);
        assert_eq!(policy.decide("/profile", Some(&user)), AccessDecision::Allow);
        assert_eq!(policy.decide("/dashboard", Some(&user)), AccessDecision::Allow);
        assert_eq!(
            policy.decide("/vendor/products", Some(&user)),
            AccessDecision::Redirect("/dashboard")
        );
        assert_eq!(
            policy.decide("/admin", Some(&user)),
            AccessDecision::Redirect("/dashboard")
        );
    }

    #[test]
    fn signed_in_users_bounce_off_entry_forms() {
        let policy = policy();
        assert_eq!(policy.decide(SIGN_IN_PATH, None), AccessDecision::Allow);
        assert_eq!(policy.decide(SIGN_UP_PATH, None), AccessDecision::Allow);

        let admin = user_with_role(Role::Administrator);
        assert_eq!(
            policy.decide(SIGN_IN_PATH, Some(&admin)),
            AccessDecision::Redirect("/admin/dashboard")
        );
        let vendor = user_with_role(Role::Vendor);
        assert_eq!(
            policy.decide(SIGN_UP_PATH, Some(&vendor)),
            AccessDecision::Redirect("/vendor")
        );
    }
}
