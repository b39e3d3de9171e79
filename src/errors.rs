use thiserror::Error;

/// Failure loading the directory or a thread. Cloneable so a thread's
/// error state can sit in its view alongside the last good messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {message}")]
    Decode { message: String },
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FetchError::Transport { message: err.to_string() }
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        FetchError::Decode { message: err.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

/// Failure submitting a composed message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Message body cannot be empty")]
    EmptyBody,

    #[error("No conversation is active")]
    NoActiveConversation,

    #[error("Message {id} is not in a failed state")]
    NotRetriable { id: String },

    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Send rejected with {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl SendError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        SendError::Transport { message: err.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {name} must be set")]
    Missing { name: &'static str },

    #[error("Environment variable {name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Errors raised by the development gateway server.
#[derive(Debug, Error)]
pub enum StubError {
    #[error("Missing or malformed bearer token")]
    Unauthenticated,

    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Listing '{id}' not found")]
    ListingNotFound { id: String },

    #[error("Cannot message yourself")]
    SelfMessage,
}

impl StubError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StubError::EmptyField { .. } | StubError::SelfMessage)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StubError::ListingNotFound { .. })
    }
}
