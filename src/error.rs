use std::fmt;

/// Errors that can occur while building forms.
///
/// Only configuration problems surface as `Error`. Validation failures,
/// rate limiting and handler failures are recorded in the form state instead.
#[derive(Debug)]
pub enum Error {
    /// A schema or form configuration is contradictory
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Invalid form configuration: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// A configuration error with details about which rule is contradictory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The kind of configuration error
    pub kind: ConfigErrorKind,
    /// Human-readable message explaining the problem
    pub message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// The kind of configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A field was declared with an empty name
    EmptyFieldName,
    /// The same field name was declared twice
    DuplicateField {
        /// The repeated field name
        field: String,
    },
    /// Length bounds cannot be satisfied
    InvalidLengthBounds {
        /// The field carrying the bounds
        field: String,
    },
    /// A pattern constraint failed to compile
    InvalidPattern {
        /// The field carrying the pattern
        field: String,
    },
    /// A sanitized field is not declared in the schema
    UnknownSanitizeField {
        /// The undeclared field name
        field: String,
    },
    /// The rate-limit key or policy is unusable
    InvalidRateLimit,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::EmptyFieldName => write!(f, "Empty field name"),
            ConfigErrorKind::DuplicateField { field } => {
                write!(f, "Duplicate field '{}'", field)
            }
            ConfigErrorKind::InvalidLengthBounds { field } => {
                write!(f, "Invalid length bounds for '{}'", field)
            }
            ConfigErrorKind::InvalidPattern { field } => {
                write!(f, "Invalid pattern for '{}'", field)
            }
            ConfigErrorKind::UnknownSanitizeField { field } => {
                write!(f, "Unknown sanitize field '{}'", field)
            }
            ConfigErrorKind::InvalidRateLimit => write!(f, "Invalid rate limit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_field() {
        let err = ConfigError::new(
            ConfigErrorKind::InvalidLengthBounds {
                field: "name".to_string(),
            },
            "min length 10 exceeds max length 5",
        );

        let output = format!("{}", err);
        assert!(output.contains("'name'"));
        assert!(output.contains("min length 10"));
    }

    #[test]
    fn error_wraps_config_error() {
        let err: Error = ConfigError::new(ConfigErrorKind::InvalidRateLimit, "empty key").into();

        assert!(format!("{}", err).starts_with("Invalid form configuration"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
