use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings Error: {0}")]
    Error(String),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Logging Error: {0}")]
    Error(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Client Error: {0}")]
    Error(String),
}

/// Outcome of validating a dashboard endpoint during setup.
#[derive(Error, Debug, PartialEq)]
pub enum SetupError {
    /// Dashboard answered, but not with a 200.
    #[error("Request failed with status {status}: {body}")]
    CannotConnect { status: u16, body: String },

    /// Anything else: refused connection, DNS, timeouts, unreadable body.
    #[error("{name}: {message}")]
    Unknown { name: String, message: String },
}

impl SetupError {
    /// Key used in form errors shown back to the user.
    pub fn kind(&self) -> &'static str {
        match self {
            SetupError::CannotConnect { .. } => "cannot_connect",
            SetupError::Unknown { .. } => "unknown",
        }
    }

    pub fn describe(kind: &str) -> &'static str {
        match kind {
            "cannot_connect" => "Failed to connect",
            "invalid_input" => "Invalid input",
            "already_configured" => "Cluster is already configured",
            _ => "Unknown error",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to send request with error: {0}")]
    Transport(String),

    #[error("Failed to parse response with error: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Config entry not ready: {0}")]
    NotReady(#[from] PollError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Cluster {0} is already configured")]
    AlreadyConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_kind() {
        let err = SetupError::CannotConnect {
            status: 503,
            body: "down".to_string(),
        };
        assert_eq!(err.kind(), "cannot_connect");
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("down"));

        let err = SetupError::Unknown {
            name: "Connect".to_string(),
            message: "refused".to_string(),
        };
        assert_eq!(err.kind(), "unknown");
        assert_eq!(err.to_string(), "Connect: refused");
    }

    #[test]
    fn test_describe() {
        assert_eq!(SetupError::describe("cannot_connect"), "Failed to connect");
        assert_eq!(SetupError::describe("invalid_input"), "Invalid input");
        assert_eq!(
            SetupError::describe("already_configured"),
            "Cluster is already configured"
        );
        assert_eq!(SetupError::describe("unknown"), "Unknown error");
    }
}
