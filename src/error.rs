//! Error types and handling for the weather journal

use thiserror::Error;

/// Main error type for the weather journal
#[derive(Error, Debug)]
pub enum JournalError {
    /// The location search returned no match
    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    /// The requested date range cannot be served
    #[error("Invalid date range: {message}")]
    InvalidDateRange { message: String },

    /// Network failure or error status from an external dependency
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// Summary requested over zero days
    #[error("Cannot summarize an empty date range")]
    EmptyRange,

    /// CRUD operation on a missing record
    #[error("Search record {id} not found")]
    RecordNotFound { id: u64 },

    /// Malformed request shape
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Persistence failures
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Stable, machine-readable error tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocationNotFound,
    InvalidDateRange,
    UpstreamUnavailable,
    EmptyRange,
    RecordNotFound,
    Validation,
    Config,
    Storage,
    Io,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LocationNotFound => "location_not_found",
            ErrorKind::InvalidDateRange => "invalid_date_range",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::EmptyRange => "empty_range",
            ErrorKind::RecordNotFound => "record_not_found",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Config => "config_error",
            ErrorKind::Storage => "storage_error",
            ErrorKind::Io => "io_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JournalError {
    /// Create a new location-not-found error
    pub fn location_not_found<S: Into<String>>(query: S) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }

    /// Create a new invalid date range error
    pub fn invalid_range<S: Into<String>>(message: S) -> Self {
        Self::InvalidDateRange {
            message: message.into(),
        }
    }

    /// Create a new upstream error for the named service
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            JournalError::LocationNotFound { .. } => ErrorKind::LocationNotFound,
            JournalError::InvalidDateRange { .. } => ErrorKind::InvalidDateRange,
            JournalError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            JournalError::EmptyRange => ErrorKind::EmptyRange,
            JournalError::RecordNotFound { .. } => ErrorKind::RecordNotFound,
            JournalError::Validation { .. } => ErrorKind::Validation,
            JournalError::Config { .. } => ErrorKind::Config,
            JournalError::Storage { .. } => ErrorKind::Storage,
            JournalError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            JournalError::LocationNotFound { query } => {
                format!("No location matches '{query}'. Try a city name, postal code or 'lat,lon'.")
            }
            JournalError::InvalidDateRange { message } => message.clone(),
            JournalError::UpstreamUnavailable { service, message } => {
                format!("The {service} service could not be reached ({message}). Please try again later.")
            }
            JournalError::EmptyRange => "No weather data available for the requested dates.".to_string(),
            JournalError::RecordNotFound { id } => format!("Search record {id} not found."),
            JournalError::Validation { message } => format!("Invalid input: {message}"),
            JournalError::Config { .. } => {
                "Server configuration error. Please check the config file and API keys.".to_string()
            }
            JournalError::Storage { .. } | JournalError::Io { .. } => {
                "Search records could not be read or written.".to_string()
            }
        }
    }
}

impl From<fjall::Error> for JournalError {
    fn from(err: fjall::Error) -> Self {
        JournalError::storage(err.to_string())
    }
}

impl From<postcard::Error> for JournalError {
    fn from(err: postcard::Error) -> Self {
        JournalError::storage(format!("record encoding failed: {err}"))
    }
}

impl From<tokio::task::JoinError> for JournalError {
    fn from(err: tokio::task::JoinError) -> Self {
        JournalError::storage(format!("storage task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = JournalError::location_not_found("Qwxzzz123");
        assert!(matches!(err, JournalError::LocationNotFound { .. }));

        let err = JournalError::upstream("WeatherAPI", "connection refused");
        assert!(matches!(err, JournalError::UpstreamUnavailable { .. }));

        let err = JournalError::validation("location must not be empty");
        assert!(matches!(err, JournalError::Validation { .. }));
    }

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(JournalError::location_not_found("x").kind().as_str(), "location_not_found");
        assert_eq!(JournalError::invalid_range("x").kind().as_str(), "invalid_date_range");
        assert_eq!(JournalError::upstream("a", "b").kind().as_str(), "upstream_unavailable");
        assert_eq!(JournalError::EmptyRange.kind().as_str(), "empty_range");
        assert_eq!(JournalError::RecordNotFound { id: 3 }.kind().as_str(), "record_not_found");
        assert_eq!(JournalError::validation("x").kind().as_str(), "validation_error");
    }

    #[test]
    fn test_user_messages() {
        let err = JournalError::location_not_found("Qwxzzz123");
        assert!(err.user_message().contains("Qwxzzz123"));

        let err = JournalError::upstream("WeatherAPI history", "2024-01-02: status 503");
        assert!(err.user_message().contains("2024-01-02"));

        let err = JournalError::config("missing key");
        assert!(err.user_message().contains("configuration"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: JournalError = io_err.into();
        assert!(matches!(err, JournalError::Io { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
