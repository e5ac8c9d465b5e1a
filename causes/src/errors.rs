use crate::config::ValidationError;
use crate::store::StoreError;
use hyper::StatusCode;
use thiserror::Error;

/// Errors that can occur while running the causes service
#[derive(Error, Debug)]
pub enum CausesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),
}

/// Outcomes of a single upsert that do not produce a cause.
#[derive(Error, Debug)]
pub enum UpsertError {
    /// `cause_desc` missing or empty, or a negative `follower_count`
    #[error("Invalid input")]
    InvalidInput,

    /// The cause to update does not exist
    #[error("failed to update the cause")]
    NotFound { cause_id: String },

    #[error("{0}")]
    MalformedInput(#[source] serde_json::Error),

    #[error("{0}")]
    RequestBody(String),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Serialization(#[source] serde_json::Error),
}

impl UpsertError {
    pub fn status(&self) -> StatusCode {
        match self {
            UpsertError::InvalidInput => StatusCode::BAD_REQUEST,
            // Not-found stays a server error for compatibility with existing clients
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field of the response body.
    pub fn message(&self) -> String {
        match self {
            UpsertError::InvalidInput | UpsertError::NotFound { .. } => self.to_string(),
            _ => format!("Unexpected server error: {self}"),
        }
    }

    /// Label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            UpsertError::InvalidInput => "invalid_input",
            UpsertError::NotFound { .. } => "not_found",
            _ => "unexpected_fault",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(UpsertError::InvalidInput.message(), "Invalid input");
        assert_eq!(UpsertError::InvalidInput.status(), StatusCode::BAD_REQUEST);

        let not_found = UpsertError::NotFound {
            cause_id: "c999".into(),
        };
        assert_eq!(not_found.message(), "failed to update the cause");
        assert_eq!(not_found.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let store = UpsertError::from(StoreError::Unavailable("connection reset".into()));
        assert_eq!(
            store.message(),
            "Unexpected server error: Store unavailable: connection reset"
        );
        assert_eq!(store.outcome(), "unexpected_fault");
    }

    #[test]
    fn test_malformed_input_message() {
        let err = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let message = UpsertError::MalformedInput(err).message();
        assert!(message.starts_with("Unexpected server error: "));
        assert!(message.contains("line 1"));
    }
}
