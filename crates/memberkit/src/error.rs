//! Error types for membership reconciliation.
//!
//! A missing remote entity is *not* an error: stores report it as `Ok(None)`
//! and the reconciler turns it into an absent state. Everything here is a
//! real failure and is propagated to the caller unmodified.

use std::fmt;

/// Result type alias for memberkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors for user feedback.
///
/// memberkit never retries on its own; the category only tells the caller
/// what kind of problem it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout or a 5xx from the server.
    Network,
    /// Credentials missing or rejected (401/403).
    Auth,
    /// The server refused the payload (4xx other than auth).
    Validation,
    /// Malformed response body.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::Validation => "Request rejected by server",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that the server URL is reachable and try again",
            Self::Auth => "Check the configured username and password",
            Self::Validation => "Check that every declared role exists on the server",
            Self::Format => "Check that the URL points at a Nexus Repository Manager",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to a remote entity store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url: String,
        /// Error message from the HTTP client.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response from {url}: {message}")]
    InvalidResponse {
        /// Request URL.
        url: String,
        /// Decoding error.
        message: String,
    },

    /// Generic error, mostly from test doubles.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP status error.
    pub fn http(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { status, .. } => match *status {
                401 | 403 => ErrorCategory::Auth,
                400..=499 => ErrorCategory::Validation,
                _ => ErrorCategory::Network,
            },
            Error::Transport { .. } => ErrorCategory::Network,
            Error::InvalidResponse { .. } => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }
}
