//! Session cookies and redirect helpers.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use carnaval_platform_access::SessionTokens;
use time::Duration as TimeDuration;

use crate::config::SessionConfig;

/// Access-token cookie name.
pub const ACCESS_TOKEN_COOKIE: &str = "session-access-token";

/// Refresh-token cookie name.
pub const REFRESH_TOKEN_COOKIE: &str = "session-refresh-token";

/// PKCE verifier cookie name (kept for the duration of the OAuth flow).
pub const CODE_VERIFIER_COOKIE: &str = "auth-code-verifier";

/// Lifetime of the PKCE verifier cookie.
const CODE_VERIFIER_MAX_AGE_MINUTES: i64 = 10;

/// Returns the credential pair carried by the request, if any.
pub fn session_tokens(jar: &CookieJar) -> (Option<&str>, Option<&str>) {
    (
        jar.get(ACCESS_TOKEN_COOKIE).map(Cookie::value),
        jar.get(REFRESH_TOKEN_COOKIE).map(Cookie::value),
    )
}

fn secure_cookie(
    name: &'static str,
    value: String,
    max_age: TimeDuration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Adds both session cookies for `tokens`.
pub fn set_session_cookies(
    jar: CookieJar,
    tokens: &SessionTokens,
    config: &SessionConfig,
) -> CookieJar {
    jar.add(secure_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        TimeDuration::days(config.access_token_max_age_days),
        config.secure_cookies,
    ))
    .add(secure_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        TimeDuration::days(config.refresh_token_max_age_days),
        config.secure_cookies,
    ))
}

/// Expires both session cookies.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE))
}

/// Adds the PKCE verifier cookie.
pub fn set_code_verifier(jar: CookieJar, verifier: String, secure: bool) -> CookieJar {
    jar.add(secure_cookie(
        CODE_VERIFIER_COOKIE,
        verifier,
        TimeDuration::minutes(CODE_VERIFIER_MAX_AGE_MINUTES),
        secure,
    ))
}

/// Expires the PKCE verifier cookie.
pub fn clear_code_verifier(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(CODE_VERIFIER_COOKIE))
}

/// Returns true if `response` already writes the access-token cookie.
pub fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .any(|cookie| cookie.name() == ACCESS_TOKEN_COOKIE)
}

/// `302 Found` redirect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `302 Found` redirect to `path` carrying a URL-encoded message in `key`.
pub fn found_with_message(path: &str, key: &str, message: &str) -> Response {
    found(&format!("{path}?{key}={}", urlencoding::encode(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_cookie_headers(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("ascii header").to_string())
            .collect()
    }

    #[test]
    fn found_is_a_302_with_location() {
        let response = found("/dashboard");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).expect("location"),
            "/dashboard"
        );
    }

    #[test]
    fn messages_are_url_encoded() {
        let response = found_with_message("/signin", "error", "Invalid login credentials");
        assert_eq!(
            response.headers().get(header::LOCATION).expect("location"),
            "/signin?error=Invalid%20login%20credentials"
        );
    }

    #[test]
    fn session_cookies_carry_flags_and_lifetimes() {
        let config = SessionConfig::default();
        let jar = set_session_cookies(
            CookieJar::new(),
            &SessionTokens::new("acc", "ref"),
            &config,
        );
        let response = (jar, "ok").into_response();
        let headers = set_cookie_headers(&response);

        let access = headers
            .iter()
            .find(|h| h.starts_with("session-access-token=acc"))
            .expect("access cookie");
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Path=/"));
        assert!(access.contains("Secure"));
        assert!(access.contains("Max-Age=604800"));

        let refresh = headers
            .iter()
            .find(|h| h.starts_with("session-refresh-token=ref"))
            .expect("refresh cookie");
        assert!(refresh.contains("Max-Age=2592000"));
        assert!(sets_session_cookie(&response));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let response = (clear_session_cookies(CookieJar::new()), "ok").into_response();
        let headers = set_cookie_headers(&response);
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| h.contains("Max-Age=0")));
    }

    #[test]
    fn session_tokens_reads_both_cookies() {
        let jar = CookieJar::new()
            .add(Cookie::new(ACCESS_TOKEN_COOKIE, "a"))
            .add(Cookie::new(REFRESH_TOKEN_COOKIE, "r"));
        assert_eq!(session_tokens(&jar), (Some("a"), Some("r")));
        assert_eq!(session_tokens(&CookieJar::new()), (None, None));
    }

    #[test]
    fn session_cookie_detection_matches_cookie_name() {
        let removal = (clear_session_cookies(CookieJar::new()), "ok").into_response();
        assert!(sets_session_cookie(&removal));

        let spaced = (
            [(header::SET_COOKIE, "session-access-token = acc; Path=/")],
            "ok",
        )
            .into_response();
        assert!(sets_session_cookie(&spaced));

        let other = (
            [(header::SET_COOKIE, "session-access-token-legacy=acc; Path=/")],
            "ok",
        )
            .into_response();
        assert!(!sets_session_cookie(&other));

        let verifier = CookieJar::new().add(Cookie::new(CODE_VERIFIER_COOKIE, "v"));
        assert!(!sets_session_cookie(&(verifier, "ok").into_response()));
    }
}
