use thiserror::Error;

/// Coarse classification used by the control loop to decide what a failure means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid startup configuration. Fatal.
    Configuration,
    /// Network, timeout, HTTP status, storage failures. Abandons the cycle.
    TransientIo,
    /// An expected entry was absent from a response. Abandons the cycle.
    DataShape,
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to load configuration: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    DataShape(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Config(_) | BotError::ConfigSource(_) => ErrorKind::Configuration,
            BotError::DataShape(_) => ErrorKind::DataShape,
            BotError::Http(_)
            | BotError::Status { .. }
            | BotError::Signing(_)
            | BotError::Json(_)
            | BotError::Io(_)
            | BotError::Redis(_) => ErrorKind::TransientIo,
        }
    }

    /// Only configuration problems stop the process.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_errors_are_fatal() {
        assert!(BotError::Config("KEY NOT FOUND".into()).is_fatal());
        assert!(!BotError::DataShape("no INR balance".into()).is_fatal());
        assert!(!BotError::Status {
            status: 502,
            body: "bad gateway".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            BotError::DataShape("missing".into()).kind(),
            ErrorKind::DataShape
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(BotError::from(io).kind(), ErrorKind::TransientIo);
    }
}
