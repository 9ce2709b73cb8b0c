//! Cookie parsing and `Set-Cookie` construction over the `cookie` crate.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use cookie::{Cookie, CookieBuilder, SameSite};

/// Parse every `Cookie` header into a name → value map. Values are
/// percent-decoded; pairs that fail to parse are skipped.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .map(|c| (c.name().to_string(), c.value_trimmed().to_string()))
        .collect()
}

/// Builder with the attributes used for application cookies:
/// `Path=/`, `HttpOnly`, `SameSite=Lax`.
pub fn cookie_builder(name: impl Into<String>, value: impl Into<String>) -> CookieBuilder<'static> {
    Cookie::build((name.into(), value.into()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
}

/// Cookie that expires `name` on the client.
pub fn removal_cookie(name: impl Into<String>) -> Cookie<'static> {
    let mut cookie = cookie_builder(name, "").build();
    cookie.make_removal();
    cookie
}

/// Render a cookie as a `Set-Cookie` header value, percent-encoding the
/// name and value.
pub fn to_header_value(cookie: &Cookie<'_>) -> String {
    cookie.encoded().to_string()
}
