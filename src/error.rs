use thiserror::Error;

/// Error types that can occur when talking to the chat and content backends.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Transport failure: unreachable host, timeout or malformed response body
    #[error("Network error: {0}")]
    Network(String),
    /// The backend kept rate limiting after every retry was spent
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: usize },
    /// Any non-success status other than a rate limit
    #[error("Server error {status}: {detail}")]
    Server { status: u16, detail: String },
    /// Rejected locally before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),
    /// Configuration could not be read or is invalid
    #[error("Config error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Text shown in place of a bot answer when a query fails.
    ///
    /// Validation errors never reach the conversation log, so they map to an
    /// empty string.
    pub fn user_message(&self) -> &'static str {
        match self {
            BridgeError::RateLimitExceeded { .. } => {
                "The service is busy right now, please try again shortly."
            }
            BridgeError::Server { .. } => "The service is temporarily unavailable.",
            BridgeError::Network(_) => {
                "Could not reach the service, please check your connection."
            }
            BridgeError::Config(_) => "The assistant is not configured correctly.",
            BridgeError::Validation(_) => "",
        }
    }

    /// Whether this failure is silent at the UI boundary.
    pub fn is_silent(&self) -> bool {
        matches!(self, BridgeError::Validation(_))
    }
}

/// Converts reqwest transport errors into network errors
impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Network(format!(
            "malformed response: {} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}
