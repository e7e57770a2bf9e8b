//! HTTP routing.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::{pages, vendor};

/// Builds the application router.
///
/// Every route, the page fallback included, runs behind the authorization
/// gate.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/login", get(auth::login))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signout", get(auth::signout))
        .route("/api/auth/create-profile", post(auth::create_profile))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/auth/save-session", post(auth::save_session))
        .route("/api/vendor/apply", post(vendor::apply))
        .route("/api/vendor/my-application", get(vendor::my_application))
        .route("/api/vendor/admin/pending", get(vendor::admin_applications))
        .route(
            "/api/vendor/admin/application/{id}",
            get(vendor::admin_application),
        )
        .route("/api/vendor/admin/stats", get(vendor::admin_stats))
        .fallback(pages::page_context)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authorization_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use axum::{
        body::Body,
        extract::Request,
        http::{StatusCode, header},
    };
    use carnaval_core::UserId;
    use carnaval_platform_access::testing::{
        FakeIdentityProvider, MemoryApplicationStore, MemoryProfileStore,
    };
    use carnaval_platform_access::{AccessPolicy, Identity, NewProfile, ProfileStore, Role};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn app_with_vendor() -> Router {
        let provider = Arc::new(FakeIdentityProvider::new());
        provider
            .add_session(
                "tok",
                Identity::new("u-leo", Some("leo@example.com".to_string())),
            )
            .await;
        let profiles = Arc::new(MemoryProfileStore::new());
        profiles
            .create(
                NewProfile::new(UserId::new("u-leo"), "leo@example.com".to_string())
                    .with_role(Role::Vendor),
            )
            .await
            .unwrap();

        router(Arc::new(AppState::new(
            provider,
            profiles,
            Arc::new(MemoryApplicationStore::new()),
            AccessPolicy::default(),
            SessionConfig::default(),
        )))
    }

    fn get_as_vendor(path: &str) -> Request {
        Request::builder()
            .uri(path)
            .header(
                header::COOKIE,
                "session-access-token=tok; session-refresh-token=ref",
            )
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn page_fallback_reports_path_and_user() {
        let res = app_with_vendor()
            .await
            .oneshot(get_as_vendor("/vendor/products"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["path"], "/vendor/products");
        assert_eq!(json["user"]["id"], "u-leo");
        assert_eq!(json["user"]["role"], "vendedor");
    }

    #[tokio::test]
    async fn vendor_is_kept_out_of_admin_area() {
        let res = app_with_vendor()
            .await
            .oneshot(get_as_vendor("/admin/dashboard"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/vendor");
    }

    #[tokio::test]
    async fn anonymous_home_page_has_no_user() {
        let res = app_with_vendor()
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["path"], "/");
        assert!(json["user"].is_null());
    }
}
