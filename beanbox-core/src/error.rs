// Error types for bean resolution and injection

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No test double can be fabricated for the requested type.
    #[error("Cannot fabricate a test double for `{type_name}`: no mock factory registered")]
    UnmockableType { type_name: &'static str },

    /// The target type cannot be instantiated.
    #[error("Cannot create bean `{type_name}`: {reason}")]
    InvalidTarget {
        type_name: &'static str,
        reason: String,
    },

    /// A resolved dependency could not be written to its injection point.
    #[error("Cannot inject `{type_name}::{member}`: {reason}")]
    InjectionAccess {
        type_name: &'static str,
        member: &'static str,
        reason: String,
    },

    /// A required value key has not been set.
    #[error("No value set for key `{key}` required by `{type_name}::{member}`")]
    MissingValue {
        type_name: &'static str,
        member: &'static str,
        key: String,
    },

    /// The stored value is not of the requested type.
    #[error("Value for key `{key}` is not a `{expected}`")]
    ValueType { key: String, expected: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_target(type_name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidTarget {
            type_name,
            reason: reason.into(),
        }
    }

    pub(crate) fn injection_access(
        type_name: &'static str,
        member: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Error::InjectionAccess {
            type_name,
            member,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = Error::UnmockableType {
            type_name: "dyn app::Repository",
        };
        assert!(err.to_string().contains("dyn app::Repository"));

        let err = Error::injection_access("app::Service", "repository", "type mismatch");
        assert_eq!(
            err.to_string(),
            "Cannot inject `app::Service::repository`: type mismatch"
        );

        let err = Error::MissingValue {
            type_name: "app::Service",
            member: "timeout",
            key: "service.timeout".to_string(),
        };
        assert!(err.to_string().contains("service.timeout"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
