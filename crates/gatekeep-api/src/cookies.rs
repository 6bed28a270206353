//! Cookie transport for access and refresh tokens
//!
//! Both cookies are `HttpOnly`, `Secure` and `SameSite=Strict`. Their
//! max-age is a transport setting, independent of the expiry embedded in
//! the token itself.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Default cookie max-age for both token kinds
pub const DEFAULT_COOKIE_MAX_AGE: Duration = Duration::days(14);

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub access_max_age: Duration,
    pub refresh_max_age: Duration,
    /// Only disable for plain-HTTP local development
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_max_age: DEFAULT_COOKIE_MAX_AGE,
            refresh_max_age: DEFAULT_COOKIE_MAX_AGE,
            secure: true,
        }
    }
}

impl CookieConfig {
    pub fn access_cookie(&self, token: String) -> Cookie<'static> {
        self.build(ACCESS_TOKEN_COOKIE, token, self.access_max_age)
    }

    pub fn refresh_cookie(&self, token: String) -> Cookie<'static> {
        self.build(REFRESH_TOKEN_COOKIE, token, self.refresh_max_age)
    }

    /// A cookie that tells the client to discard `name`
    pub fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), Duration::ZERO);
        cookie.make_removal();
        cookie
    }

    fn build(&self, name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .max_age(max_age)
            .build()
    }
}

/// Read a non-empty cookie value
pub fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the access token: `accessToken` cookie first, then `Authorization: Bearer`
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    cookie_value(&jar, ACCESS_TOKEN_COOKIE).or_else(|| bearer_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    // Scheme is case-insensitive
    if !value.get(..7)?.eq_ignore_ascii_case("bearer ") {
        return None;
    }

    let token = value[7..].trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = CookieConfig::default().access_cookie("abc".to_string());

        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(14)));
    }

    #[test]
    fn test_per_kind_max_age() {
        let config = CookieConfig {
            access_max_age: Duration::hours(1),
            refresh_max_age: Duration::hours(2),
            secure: false,
        };

        assert_eq!(
            config.access_cookie("a".to_string()).max_age(),
            Some(Duration::hours(1))
        );
        assert_eq!(
            config.refresh_cookie("r".to_string()).max_age(),
            Some(Duration::hours(2))
        );
        assert_eq!(config.refresh_cookie("r".to_string()).secure(), Some(false));
    }

    #[test]
    fn test_removal_cookie() {
        let cookie = CookieConfig::default().removal_cookie(REFRESH_TOKEN_COOKIE);
        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_extract_prefers_cookie() {
        let map = headers(&[
            (header::COOKIE, "theme=dark; accessToken=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract_access_token(&map), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_extract_falls_back_to_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "bearer  from-header ")]);
        assert_eq!(extract_access_token(&map), Some("from-header".to_string()));

        let map = headers(&[
            (header::COOKIE, "accessToken="),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(extract_access_token(&map), Some("from-header".to_string()));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_access_token(&HeaderMap::new()), None);
        assert_eq!(
            extract_access_token(&headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")])),
            None
        );
        assert_eq!(
            extract_access_token(&headers(&[(header::AUTHORIZATION, "Bearer ")])),
            None
        );
        assert_eq!(
            extract_access_token(&headers(&[(header::AUTHORIZATION, "Bear")])),
            None
        );
    }
}
