use thiserror::Error;

/// Shown whenever the service gave us nothing we can quote back to the user
pub const GENERIC_FAILURE: &str = "An error occurred while processing your request";

pub const EMPTY_PLAYLIST: &str = "No tracks found in playlist";

/// Ways a call to the conversion service can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The service answered `success: false` with a message
    #[error("{0}")]
    Rejected(String),
    /// Network error, non-2xx status, or an unreadable body
    #[error("request failed: {0}")]
    Transport(String),
    /// The body was JSON but not the shape we expect
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unexpected response phase: {0:?}")]
    UnexpectedPhase(Option<String>),
    #[error("No tracks found in playlist")]
    EmptyPlaylist,
}

impl ServiceError {
    /// The text shown to the user after "Error: "
    pub fn user_message(&self) -> &str {
        match self {
            ServiceError::Rejected(message) => message,
            ServiceError::EmptyPlaylist => EMPTY_PLAYLIST,
            ServiceError::Transport(_)
            | ServiceError::Malformed(_)
            | ServiceError::UnexpectedPhase(_) => GENERIC_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rejections_are_quoted_verbatim() {
        assert_eq!(
            ServiceError::Rejected("rate limited".to_string()).user_message(),
            "rate limited"
        );
        assert_eq!(
            ServiceError::Transport("connection refused".to_string()).user_message(),
            GENERIC_FAILURE
        );
        assert_eq!(
            ServiceError::Malformed("missing songs".to_string()).user_message(),
            GENERIC_FAILURE
        );
        assert_eq!(ServiceError::UnexpectedPhase(None).user_message(), GENERIC_FAILURE);
        assert_eq!(ServiceError::EmptyPlaylist.user_message(), EMPTY_PLAYLIST);
    }
}
