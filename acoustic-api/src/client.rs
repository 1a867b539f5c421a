use std::time::Duration;

#[derive(Debug)]
/// An error that can occur when interacting with the client.
pub enum ClientError {
    /// An error that occurred when making a request.
    ReqwestError(reqwest::Error),
    /// An error that occurred when deserializing a response.
    DeserializationError(serde_json::Error),
    /// The backend answered with a non-success status.
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The `error` field of the response body, if there was one.
        message: Option<String>,
    },
    /// The caller passed an argument the backend would reject outright.
    InvalidArgument(String),
}
impl ClientError {
    /// Whether this error came out of the network call itself, rather than
    /// being rejected before any request was made.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ClientError::InvalidArgument(_))
    }

    /// The HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            ClientError::ReqwestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::ReqwestError(e) => write!(f, "Reqwest error: {e}"),
            ClientError::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            ClientError::HttpStatus { status, message } => {
                write!(f, "Backend returned HTTP {status}")?;
                if let Some(message) = message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            ClientError::InvalidArgument(message) => write!(f, "Invalid argument: {message}"),
        }
    }
}
impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::ReqwestError(e) => Some(e),
            ClientError::DeserializationError(e) => Some(e),
            _ => None,
        }
    }
}
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::ReqwestError(e)
    }
}
impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::DeserializationError(e)
    }
}
/// A result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// A client for the player backend.
///
/// Every call is a single request; nothing is retried.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) base_url: String,
    pub(crate) client: reqwest::Client,
}
impl Client {
    /// The default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new client with the default timeout.
    ///
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = Client::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_error_display() {
        let error = ClientError::HttpStatus {
            status: 400,
            message: Some("Path is required".to_string()),
        };
        assert_eq!(error.to_string(), "Backend returned HTTP 400: Path is required");
        assert!(error.is_transport());
        assert_eq!(error.status(), Some(400));

        let error = ClientError::InvalidArgument("empty query".to_string());
        assert!(!error.is_transport());
        assert_eq!(error.status(), None);
    }
}
