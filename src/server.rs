//! HTTP server lifecycle.
//!
//! The server owns exactly one listener, created by [`Server::start`] and
//! released when the returned [`RunningServer`] is stopped. Connections are
//! served **one at a time**: the accept loop does not take the next
//! connection until the current one has been answered. Keep-alive is off,
//! so every connection carries a single request.
//!
//! [`Server::serve`] wraps the lifecycle for `main`: start, wait for Ctrl-C
//! or SIGTERM, stop. Stopping never interrupts an in-flight request. A
//! connection that has not sent its request yet is closed, so an idle
//! client cannot hold `stop` open.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// A server that has not started listening yet.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to listen on `addr` (`host:port`; host names
    /// such as `localhost` are resolved at start).
    ///
    /// ```rust,no_run
    /// use natal_chart::Server;
    /// let server = Server::bind("localhost:8001");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Binds the listener and starts the accept loop in the background.
    pub async fn start(self, router: Router) -> Result<RunningServer, Error> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(accept_loop(listener, Arc::new(router), stop_rx));
        info!(addr = %local_addr, "natal-chart listening");

        Ok(RunningServer { local_addr, stop: stop_tx, task })
    }

    /// Starts the server and runs it until Ctrl-C or SIGTERM.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let running = self.start(router).await?;
        shutdown_signal().await;
        info!("shutdown signal received");
        running.stop().await
    }
}

/// Handle to a listening server.
///
/// Dropping the handle also stops the accept loop, but only [`stop`]
/// waits for it to finish.
///
/// [`stop`]: RunningServer::stop
pub struct RunningServer {
    local_addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RunningServer {
    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections, lets an in-flight request finish,
    /// closes an idle connection, and releases the listener.
    pub async fn stop(self) -> Result<(), Error> {
        // Err means the loop already exited.
        let _ = self.stop.send(());
        self.task.await?;
        info!(addr = %self.local_addr, "natal-chart stopped");
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            // Check stop first so a pending stop wins over queued connections.
            biased;

            _ = &mut stop => break,

            res = listener.accept() => match res {
                Ok((stream, peer)) => {
                    if serve_connection(stream, peer, &router, &mut stop).await {
                        break;
                    }
                }
                Err(e) => error!("accept error: {e}"),
            },
        }
    }
}

/// Serves one connection to completion. Returns `true` when the stop signal
/// arrived meanwhile; the connection was then shut down gracefully.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: &Arc<Router>,
    stop: &mut oneshot::Receiver<()>,
) -> bool {
    let svc = service_fn(|req| dispatch(Arc::clone(router), req));
    let mut conn = pin!(http1::Builder::new()
        .keep_alive(false)
        .serve_connection(TokioIo::new(stream), svc));
    let mut stopping = false;

    loop {
        tokio::select! {
            res = conn.as_mut() => {
                if let Err(e) = res {
                    error!(%peer, "connection error: {e}");
                }
                return stopping;
            }

            // The receiver must not be polled again once it has resolved.
            _ = &mut *stop, if !stopping => {
                debug!(%peer, "stop requested, closing connection");
                stopping = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body and hands the request to the router. All failures are
/// turned into responses, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    debug!(method = %parts.method, path = parts.uri.path(), "request received");

    let response = match body.collect().await {
        Ok(collected) => {
            let req = Request::from_parts(&parts, collected.to_bytes());
            router.handle(req).await
        }
        Err(e) => {
            warn!(method = %parts.method, path = parts.uri.path(), "failed to read request body: {e}");
            let mut res = Response::error(Status::BadRequest, "Failed to read request body");
            router.decorate(&mut res);
            res
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
