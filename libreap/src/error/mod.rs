//! Error types for reap.
//!
//! Every fallible operation in the library returns [`ReapError`]. Query-side
//! errors abort a run; the cleanup executor records mutation errors per
//! action instead of propagating them.

use thiserror::Error;


/// Failure of a registry query, a registry mutation or local setup.
///
/// HTTP failures are classified by status so callers can tell a rejected
/// token from a registry outage; `status_code` recovers the number.
#[derive(Error, Debug)]
pub enum ReapError {
    /// Transport failure, timeout, or a status outside the classified ones
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 401/403 from the registry, or a rejected token exchange
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// 429; `retry_after` holds the numeric `Retry-After` seconds
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// Input the registry or the user handed us that does not hold together:
    /// a digest that fails to parse, a tag list for the wrong repository, a
    /// matrix without releases
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Config or matrix file that cannot be read or deserialized
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend has no API for the requested mutation
    #[error("{backend} does not support {operation}")]
    Unsupported { backend: String, operation: String },
}

pub type Result<T> = std::result::Result<T, ReapError>;

impl ReapError {
    /// Transport-level failure without an underlying error.
    ///
    /// ```
    /// use libreap::error::ReapError;
    ///
    /// let err = ReapError::network("connection refused");
    /// assert!(matches!(err, ReapError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Credentials were refused. `status_code` is `None` when the failure
    /// came from the token endpoint rather than the registry itself.
    ///
    /// ```
    /// use libreap::error::ReapError;
    ///
    /// let err = ReapError::authentication("token rejected", Some(401));
    /// assert_eq!(err.status_code(), Some(401));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    pub fn not_found<S: Into<String>, N: Into<String>>(resource_type: S, name: N) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// ```
    /// use libreap::error::ReapError;
    ///
    /// let err = ReapError::validation("matrix file has no releases");
    /// assert!(matches!(err, ReapError::Validation { .. }));
    /// ```
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Config error, optionally naming the file it came from.
    pub fn config<S, P>(message: S, path: Option<P>) -> Self
    where
        S: Into<String>,
        P: Into<String>,
    {
        Self::Config {
            message: message.into(),
            path: path.map(Into::into),
            source: None,
        }
    }

    pub fn config_with_source<S, P, E>(message: S, path: Option<P>, source: E) -> Self
    where
        S: Into<String>,
        P: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(Into::into),
            source: Some(Box::new(source)),
        }
    }

    /// A mutation the backend cannot express, such as removing a single
    /// tag on GitHub Packages.
    ///
    /// ```
    /// use libreap::error::ReapError;
    ///
    /// let err = ReapError::unsupported("github", "tag deletion");
    /// assert_eq!(err.to_string(), "github does not support tag deletion");
    /// ```
    pub fn unsupported<B: Into<String>, O: Into<String>>(backend: B, operation: O) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    /// HTTP status behind the error, if it came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status_code, .. } => *status_code,
            Self::NotFound { .. } => Some(404),
            Self::RateLimit { .. } => Some(429),
            Self::Server { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
