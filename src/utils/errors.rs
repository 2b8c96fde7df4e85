use thiserror::Error;

pub type PlayerResult<T> = Result<T, PlayerError>;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// An event or user action arrived while the controller was in a state
    /// that cannot accept it.
    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// Rejected before any state was touched.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Story error: {message}")]
    Story { message: String },

    #[error("Passage not found: {passage_id}")]
    PassageNotFound { passage_id: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl PlayerError {
    pub fn protocol_violation<S: Into<String>>(message: S) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn story<S: Into<String>>(message: S) -> Self {
        Self::Story {
            message: message.into(),
        }
    }

    pub fn passage_not_found<S: Into<String>>(passage_id: S) -> Self {
        Self::PassageNotFound {
            passage_id: passage_id.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
