use thiserror::Error;

/// Failures surfaced by the dashboard core.
///
/// `Display` renders only the human-readable message, so the text can be
/// stored and shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// The provider answered with a non-success HTTP status.
    #[error("{message}")]
    Fetch { status: u16, message: String },

    /// The call never completed, or the response body was unusable.
    #[error("{0}")]
    Network(String),

    /// Position capability missing, or the platform reported a failure.
    #[error("{0}")]
    Geolocation(String),

    #[error("Invalid coordinates ({latitude}, {longitude}): latitude must be -90..=90, longitude -180..=180")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl DashboardError {
    /// Wrap an underlying failure, falling back to `fallback` when it has no text.
    pub(crate) fn network(err: impl std::fmt::Display, fallback: &str) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::Network(fallback.to_string())
        } else {
            Self::Network(message)
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_message() {
        let err = DashboardError::Fetch {
            status: 401,
            message: "Invalid API key".into(),
        };
        assert_eq!(err.to_string(), "Invalid API key");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn network_uses_fallback_for_empty_message() {
        let err = DashboardError::network("", "Failed to search locations");
        assert_eq!(err.to_string(), "Failed to search locations");

        let err = DashboardError::network("connection refused", "Failed to search locations");
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.status(), None);
    }
}
