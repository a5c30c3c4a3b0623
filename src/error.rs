//! Unified infrastructure error type.

/// The error type returned by the server's fallible operations.
///
/// Request-level failures (400, 404, 500) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: resolving or binding the listen address, or the
/// accept loop going away.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
