//! Session cookie plumbing. The cookie value is the sealed token produced by
//! `domain::session::SessionStore`; this module only decides how it travels.

use axum::http::{header, HeaderMap};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use service::config::Config;

/// `Set-Cookie` for a freshly issued session token.
pub(crate) fn session_cookie(config: &Config, token: String, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name().to_string(), token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(ttl.num_seconds()))
        .secure(config.is_production())
        .build()
}

/// `Set-Cookie` that makes the browser discard the session cookie.
pub(crate) fn removal_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.session_cookie_name().to_string(), ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(config.is_production())
        .build();
    cookie.make_removal();
    cookie
}

/// Value of the cookie called `name`, across every `Cookie` header of the
/// request. Unparseable pairs are skipped.
pub(crate) fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> Config {
        Config::from_defaults()
    }

    #[test]
    fn session_cookie_is_http_only_and_strict() {
        let cookie = session_cookie(&config(), "sealed".to_string(), chrono::Duration::hours(24));
        let rendered = cookie.to_string();

        assert!(rendered.starts_with(&format!("{}=sealed", config().session_cookie_name())));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=86400"));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = removal_cookie(&config());
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn read_finds_the_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("lang=en; __session=abc123"),
        );

        assert_eq!(read(&headers, "__session"), Some("abc123".to_string()));
        assert_eq!(read(&headers, "missing"), None);
    }
}
