use std::path::PathBuf;

/// Errors raised by the weather provider and the favorites store.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// Transport failure, timeout, or an unreadable response body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status (e.g. unknown city).
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input: {0}")]
    Validation(String),
}

impl WeatherError {
    /// True when the provider rejected the query itself (404-class).
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_includes_status_and_reason() {
        let err = WeatherError::Api { status: 404, message: "city not found".into() };

        assert_eq!(err.to_string(), "provider returned 404: city not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn io_error_mentions_path() {
        let err = WeatherError::Io {
            path: PathBuf::from("/tmp/favorites.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/tmp/favorites.json"));
        assert!(msg.contains("denied"));
        assert!(!err.is_not_found());
    }
}
