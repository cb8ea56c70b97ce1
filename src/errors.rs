//! Typed error kinds and their exit-code mapping (§7 Error Handling Design).
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbSampleError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("permission error: {0}")]
    Permission(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DbSampleError {
    /// Exit code per the table in §6/§7. Falls back to the general-error
    /// code when a raw `anyhow::Error` carries none of these variants.
    pub fn exit_code(&self) -> i32 {
        match self {
            DbSampleError::Configuration(_) => 5,
            DbSampleError::Connection(_) => 2,
            DbSampleError::Permission(_) => 3,
            DbSampleError::Integrity(_) => 4,
            DbSampleError::Io(_) => 6,
            DbSampleError::Timeout(_) => 7,
            DbSampleError::Internal(_) => 1,
        }
    }
}

/// Walk an `anyhow::Error`'s cause chain for a `DbSampleError`, returning its
/// exit code. Errors with no typed cause (programmer/internal bucket) map to
/// the general-error code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(typed) = cause.downcast_ref::<DbSampleError>() {
            return typed.exit_code();
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_match_table() {
        assert_eq!(DbSampleError::Configuration("x".into()).exit_code(), 5);
        assert_eq!(DbSampleError::Connection("x".into()).exit_code(), 2);
        assert_eq!(DbSampleError::Permission("x".into()).exit_code(), 3);
        assert_eq!(DbSampleError::Integrity("x".into()).exit_code(), 4);
        assert_eq!(DbSampleError::Io("x".into()).exit_code(), 6);
        assert_eq!(DbSampleError::Timeout("x".into()).exit_code(), 7);
        assert_eq!(DbSampleError::Internal("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_exit_code_for_wrapped_error() {
        let err = anyhow::Error::new(DbSampleError::Integrity("fk closure cap exceeded".into()))
            .context("sampling failed");
        assert_eq!(exit_code_for(&err), 4);
    }

    #[test]
    fn test_exit_code_for_untyped_error_defaults_to_general() {
        let err = anyhow::anyhow!("something went sideways");
        assert_eq!(exit_code_for(&err), 1);
    }
}
