//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. [`Router::handle`] is the
//! single entry point the server calls per request: it answers CORS
//! pre-flights, falls back to 404 / 405, runs the handler with panics
//! contained, and stamps the CORS origin header on whatever comes out.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::{debug, error};

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::Cors;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::start`](crate::Server::start)
/// or [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    cors: Option<Cors>,
}

/// Outcome of looking up a request's method and path.
pub(crate) enum Route<'a> {
    Found(BoxedHandler),
    Preflight(&'a Cors),
    /// Carries the `Allow` header value: the methods that do match the path.
    MethodNotAllowed(String),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), cors: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// ```rust
    /// # use natal_chart::{Method, Request, Response, Router};
    /// # async fn generate(_: Request) -> Response { Response::text("") }
    /// Router::new().on(Method::Post, "/generate-chart", generate);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Shorthand for `on(Method::Post, path, handler)`.
    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    /// Applies `cors` to every response and answers `OPTIONS` on any path.
    pub fn cors(mut self, cors: Cors) -> Self {
        self.cors = Some(cors);
        self
    }

    pub(crate) fn lookup(&self, method: &str, path: &str) -> Route<'_> {
        let known = method.parse::<Method>().ok();

        if let (Some(Method::Options), Some(cors)) = (known, &self.cors) {
            return Route::Preflight(cors);
        }

        if let Some(tree) = known.and_then(|m| self.routes.get(&m)) {
            if let Ok(matched) = tree.at(path) {
                return Route::Found(Arc::clone(matched.value));
            }
        }

        let mut allowed: Vec<&str> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect();

        if allowed.is_empty() {
            return Route::NotFound;
        }
        allowed.sort_unstable();
        Route::MethodNotAllowed(allowed.join(", "))
    }

    /// Routes one request and produces one response. Never fails: missing
    /// routes become 404 / 405 and a panicking handler becomes 500.
    pub async fn handle(&self, req: Request) -> Response {
        let mut response = match self.lookup(&req.method, &req.path) {
            Route::Found(handler) => call_contained(handler, req).await,
            Route::Preflight(cors) => return cors.preflight(),
            Route::MethodNotAllowed(allowed) => Response::builder()
                .status(Status::MethodNotAllowed)
                .header("allow", &allowed)
                .text(Status::MethodNotAllowed.reason()),
            Route::NotFound => Status::NotFound.into_response(),
        };

        self.decorate(&mut response);
        response
    }

    /// Applies router-wide response policy (CORS) to a response produced
    /// outside of [`Router::handle`], e.g. when the body could not be read.
    pub(crate) fn decorate(&self, response: &mut Response) {
        if let Some(cors) = &self.cors {
            cors.apply(response);
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Runs the handler on its own task so a panic surfaces as a `JoinError`
/// instead of tearing down the connection.
async fn call_contained(handler: BoxedHandler, req: Request) -> Response {
    let method = req.method.clone();
    let path = req.path.clone();

    let response = match tokio::spawn(handler.call(req)).await {
        Ok(res) => res,
        Err(e) => {
            let message = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            error!(
                %method, %path, error = %message,
                backtrace = %std::backtrace::Backtrace::force_capture(),
                "request handler aborted"
            );
            Response::error(Status::InternalServerError, format!("Internal server error: {message}"))
        }
    };

    debug!(%method, %path, status = response.status, "request handled");
    response
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => payload
            .downcast_ref::<&'static str>()
            .map_or_else(|| "handler panicked".to_owned(), |s| (*s).to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::cors::{ALLOW_METHODS, ALLOW_ORIGIN};

    async fn echo(req: Request) -> Response {
        Response::text(String::from_utf8_lossy(req.body()).into_owned())
    }

    async fn boom(_req: Request) -> Response {
        panic!("renderer exploded");
    }

    fn app() -> Router {
        Router::new()
            .post("/generate-chart", echo)
            .post("/boom", boom)
            .cors(Cors::permissive())
    }

    #[tokio::test]
    async fn routes_post_to_handler() {
        let res = app().handle(Request::for_test("POST", "/generate-chart", b"hi")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"hi");
        assert_eq!(res.header(ALLOW_ORIGIN), Some("*"));
    }

    #[tokio::test]
    async fn unknown_path_is_404_for_any_method() {
        for method in ["POST", "GET", "DELETE", "PURGE"] {
            let res = app().handle(Request::for_test(method, "/nope", b"{}")).await;
            assert_eq!(res.status_code(), 404, "{method}");
            assert_eq!(res.header(ALLOW_ORIGIN), Some("*"));
        }
    }

    #[tokio::test]
    async fn known_path_wrong_method_is_405() {
        let res = app().handle(Request::for_test("GET", "/generate-chart", b"")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("allow"), Some("POST"));
        assert_eq!(res.header(ALLOW_ORIGIN), Some("*"));
    }

    #[tokio::test]
    async fn allow_lists_every_method_registered_for_the_path() {
        let router = Router::new()
            .post("/charts", echo)
            .on(Method::Put, "/charts", echo)
            .on(Method::Get, "/other", echo);
        let res = router.handle(Request::for_test("DELETE", "/charts", b"")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("allow"), Some("POST, PUT"));
    }

    #[tokio::test]
    async fn options_anywhere_is_preflight() {
        for path in ["/generate-chart", "/anything/else"] {
            let res = app().handle(Request::for_test("OPTIONS", path, b"")).await;
            assert_eq!(res.status_code(), 200);
            assert!(res.body().is_empty());
            assert_eq!(res.header(ALLOW_ORIGIN), Some("*"));
            assert_eq!(res.header(ALLOW_METHODS), Some("POST, OPTIONS"));
        }
    }

    #[tokio::test]
    async fn options_without_cors_is_not_special() {
        let router = Router::new().post("/generate-chart", echo);
        let res = router.handle(Request::for_test("OPTIONS", "/generate-chart", b"")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header(ALLOW_ORIGIN), None);
    }

    #[tokio::test]
    async fn panicking_handler_becomes_500() {
        let res = app().handle(Request::for_test("POST", "/boom", b"")).await;
        assert_eq!(res.status_code(), 500);
        assert_eq!(res.body(), b"Internal server error: renderer exploded");
        assert_eq!(res.header(ALLOW_ORIGIN), Some("*"));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new().post("/a", echo).post("/a", echo);
    }
}
