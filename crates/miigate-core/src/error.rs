//! Shared error type across miigate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid, out-of-range, or unparseable query input.
    BadRequest,
    /// Store-data key lookup miss.
    NotFound,
    /// Feature path that is not wired up.
    NotImplemented,
    /// Backend refused the connection.
    UpstreamUnavailable,
    /// Backend closed or reset before delivering the expected bytes.
    UpstreamTruncated,
    /// Backend sent a structured error string.
    UpstreamReported,
    /// Any other backend I/O failure.
    UpstreamIo,
    /// Backend did not answer within the configured deadline.
    UpstreamTimeout,
    /// Backend header failed sanity checks.
    UpstreamMalformed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::NotImplemented => "NOT_IMPLEMENTED",
            ClientCode::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ClientCode::UpstreamTruncated => "UPSTREAM_TRUNCATED",
            ClientCode::UpstreamReported => "UPSTREAM_REPORTED",
            ClientCode::UpstreamIo => "UPSTREAM_IO",
            ClientCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ClientCode::UpstreamMalformed => "UPSTREAM_MALFORMED",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status code the gateway answers with.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest => 400,
            ClientCode::NotFound => 404,
            ClientCode::NotImplemented => 501,
            ClientCode::UpstreamTimeout => 504,
            ClientCode::UpstreamUnavailable
            | ClientCode::UpstreamTruncated
            | ClientCode::UpstreamReported
            | ClientCode::UpstreamIo
            | ClientCode::UpstreamMalformed
            | ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("bad request: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("the site is up, but the renderer backend is down: {0}")]
    UpstreamUnavailable(String),
    #[error(
        "incomplete data from backend, render probably failed: \
         model init failed (internal error or out-of-bounds parts) \
         or the character data is invalid"
    )]
    UpstreamTruncated,
    #[error("renderer returned ERROR: {0}")]
    UpstreamReported(String),
    #[error("incomplete response from backend, error is: {0}")]
    UpstreamIo(String),
    #[error("renderer backend timed out")]
    UpstreamTimeout,
    #[error("malformed response from backend: {0}")]
    MalformedResponse(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl RenderError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            RenderError::Validation(_) => ClientCode::BadRequest,
            RenderError::NotFound(_) => ClientCode::NotFound,
            RenderError::NotImplemented(_) => ClientCode::NotImplemented,
            RenderError::UpstreamUnavailable(_) => ClientCode::UpstreamUnavailable,
            RenderError::UpstreamTruncated => ClientCode::UpstreamTruncated,
            RenderError::UpstreamReported(_) => ClientCode::UpstreamReported,
            RenderError::UpstreamIo(_) => ClientCode::UpstreamIo,
            RenderError::UpstreamTimeout => ClientCode::UpstreamTimeout,
            RenderError::MalformedResponse(_) => ClientCode::UpstreamMalformed,
            RenderError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Shorthand for a validation failure naming the offending field.
    pub fn invalid(field: &str, msg: impl std::fmt::Display) -> Self {
        RenderError::Validation(format!("{field}: {msg}"))
    }
}
