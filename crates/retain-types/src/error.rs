use std::error::Error;
use std::fmt;

/// Rejection raised when a descriptor is built from invalid inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    MissingField(&'static str),
    EmptyField(&'static str),
    NonUtf8Path(&'static str),
    UnsupportedVersion { expected: u32, got: u32 },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::EmptyField(field) => write!(f, "{field} must be non-empty"),
            Self::NonUtf8Path(field) => write!(f, "{field} must be valid UTF-8"),
            Self::UnsupportedVersion { expected, got } => {
                write!(f, "unsupported hand-off format version {got}, expected {expected}")
            }
        }
    }
}

impl Error for InvariantError {}
