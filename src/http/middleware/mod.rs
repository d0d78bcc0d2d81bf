pub mod cookies;
pub mod cors;

pub use cookies::{cookie_parser_middleware, RequestCookies};
pub use cors::cors_headers;
