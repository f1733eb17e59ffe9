use thiserror::Error;

/// The error kinds named in the error-handling design: configuration/logic
/// failures abort the process, transport failures are logged and counted,
/// and `ShutdownRequested` is a cooperative cancellation signal rather than
/// a real error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid scenario config at {file} (instance {instance:?}, field {field:?}): {message}")]
    ConfigInvalid {
        file: String,
        instance: Option<String>,
        field: Option<String>,
        message: String,
    },

    #[error("platform {id} has unknown variant tag")]
    UnknownVariant { id: String },

    #[error("destination out of range for platform {id}: {reason}")]
    InvalidDestination { id: String, reason: String },

    #[error("no platform with id {id}")]
    RegistryNotFound { id: String },

    #[error("value out of range: {message}")]
    OutOfRange { message: String },

    #[error("transient transport error: {0}")]
    TransportTransient(String),

    #[error("fatal transport error: {0}")]
    TransportFatal(String),

    #[error("shutdown requested")]
    ShutdownRequested,
}

pub type SimResult<T> = Result<T, SimError>;
