//! Page context for every path the gate lets through.
//!
//! Page rendering lives in the frontend; the server answers page paths with
//! the context a page needs: the requested path and who is asking.

use axum::{Json, extract::State, http::Uri};
use carnaval_platform_access::{CurrentUser, Role};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AppState, OptionalUser};

/// User info for display in the UI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Stored role; absent when the user has no role profile yet.
    pub role: Option<Role>,
    pub landing_page: &'static str,
    pub is_admin: bool,
}

impl UserInfo {
    fn new(user: &CurrentUser, state: &AppState) -> Self {
        let display_name = user
            .profile
            .as_ref()
            .and_then(|p| p.full_name.clone())
            .or_else(|| user.identity.display_name().map(str::to_string));
        Self {
            id: user.identity.id.to_string(),
            email: user.identity.email.clone(),
            display_name,
            role: user.role(),
            landing_page: user.effective_role().landing_page(),
            is_admin: state.policy.is_admin(user),
        }
    }
}

/// Context for rendering the page at `path`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageContext {
    pub path: String,
    pub user: Option<UserInfo>,
}

/// Fallback handler: answers any page path with its [`PageContext`].
pub async fn page_context(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    uri: Uri,
) -> Json<PageContext> {
    Json(PageContext {
        path: uri.path().to_string(),
        user: user.as_ref().map(|user| UserInfo::new(user, &state)),
    })
}
