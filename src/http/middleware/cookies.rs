//! Cookie header parsing.
//!
//! Parsed cookies are attached to the request as a [`RequestCookies`]
//! extension for the session middleware and provider handlers.

use std::collections::HashMap;

use axum::{body::Body, http::{header, Request}, middleware::Next, response::Response};
use cookie::Cookie;

/// Cookies sent with the request, by name. The first occurrence of a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies(pub HashMap<String, String>);

impl RequestCookies {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parse `Cookie` header values, percent-decoding names and values.
    /// Pairs that fail to parse are skipped.
    pub fn parse<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut cookies = HashMap::new();
        for line in headers {
            for cookie in Cookie::split_parse_encoded(line).flatten() {
                if cookie.name().is_empty() {
                    continue;
                }
                cookies
                    .entry(cookie.name().to_string())
                    .or_insert_with(|| cookie.value_trimmed().to_string());
            }
        }
        Self(cookies)
    }
}

pub async fn cookie_parser_middleware(mut request: Request<Body>, next: Next) -> Response {
    let cookies = RequestCookies::parse(
        request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    );
    request.extensions_mut().insert(cookies);
    next.run(request).await
}
