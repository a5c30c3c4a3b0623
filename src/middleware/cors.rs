//! Cross-origin resource sharing.
//!
//! Attach a [`Cors`] policy to the router with [`Router::cors`]. Once set:
//!
//! - `OPTIONS` to **any** path is answered `200` with the policy headers and
//!   no body, without reaching a handler.
//! - Every other response (handler output, 404, 405, 500) gets
//!   `Access-Control-Allow-Origin` added unless the handler set it itself.
//!
//! [`Router::cors`]: crate::Router::cors

use crate::response::Response;
use crate::status::Status;

pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
pub const ALLOW_METHODS: &str = "access-control-allow-methods";
pub const ALLOW_HEADERS: &str = "access-control-allow-headers";

/// A CORS policy.
#[derive(Clone, Debug)]
pub struct Cors {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
}

impl Cors {
    /// Any origin, `POST`/`OPTIONS`, `Content-Type` request header.
    pub fn permissive() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_methods: "POST, OPTIONS".to_owned(),
            allow_headers: "Content-Type".to_owned(),
        }
    }

    /// Answer to a pre-flight `OPTIONS` request.
    pub(crate) fn preflight(&self) -> Response {
        Response::builder()
            .status(Status::Ok)
            .header(ALLOW_ORIGIN, &self.allow_origin)
            .header(ALLOW_METHODS, &self.allow_methods)
            .header(ALLOW_HEADERS, &self.allow_headers)
            .no_body()
    }

    /// Adds the origin header to an ordinary response.
    pub(crate) fn apply(&self, res: &mut Response) {
        res.set_header_if_absent(ALLOW_ORIGIN, &self.allow_origin);
    }
}

impl Default for Cors {
    fn default() -> Self { Self::permissive() }
}
