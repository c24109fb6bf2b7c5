use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Termination signals are already bound to a coordinator")]
    AlreadyListening,

    #[error("Signal error: {0}")]
    Signal(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GateError>;

impl From<std::io::Error> for GateError {
    fn from(e: std::io::Error) -> Self {
        GateError::Signal(e.to_string())
    }
}

impl From<anyhow::Error> for GateError {
    fn from(e: anyhow::Error) -> Self {
        GateError::Internal(e.to_string())
    }
}
