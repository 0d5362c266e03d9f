use thiserror::Error;

/// Setup failures, reported synchronously before any asynchronous work
/// starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A precondition on an argument does not hold.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation needs a facility the environment does not provide,
    /// such as a running timer.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::CapabilityMissing {
            capability: "Timer".to_string(),
            message: "no async runtime is running on this thread".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Capability missing: Timer - no async runtime is running on this thread"
        );
        assert_eq!(
            Error::Config("bad filter".to_string()).to_string(),
            "Configuration error: bad filter"
        );
    }
}
