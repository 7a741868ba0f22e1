// Error types for sensor sessions and the exposure engine.

use std::fmt;

use canonical_error::{CanonicalError, failed_precondition_error,
                      invalid_argument_error};
use thiserror::Error;

use crate::streaming::StreamingState;

/// Direction of a failed register transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterOp {
    Read,
    Write,
}

impl fmt::Display for RegisterOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegisterOp::Read => write!(f, "read"),
            RegisterOp::Write => write!(f, "write"),
        }
    }
}

/// A failed transaction on a `RegisterPort`. The transport's own error is
/// flattened into `detail` so that ports with different bus error types can
/// sit behind the same trait object.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("register {op} at {addr:#06x} failed: {detail}")]
pub struct RegisterAccessError {
    pub addr: u16,
    pub op: RegisterOp,
    pub detail: String,
}

impl RegisterAccessError {
    pub fn read(addr: u16, detail: impl Into<String>) -> Self {
        RegisterAccessError{addr, op: RegisterOp::Read, detail: detail.into()}
    }

    pub fn write(addr: u16, detail: impl Into<String>) -> Self {
        RegisterAccessError{addr, op: RegisterOp::Write, detail: detail.into()}
    }
}

/// Errors returned by sensor sessions and the exposure controller.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IsiError {
    /// The session was released, or its exposure state was never created.
    #[error("sensor session handle is not initialized")]
    WrongHandle,

    /// The operation is not valid in the session's current streaming state.
    #[error("operation not valid in {0:?} state")]
    WrongState(StreamingState),

    /// The caller supplied an argument the session refuses to repair.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Mode enumeration past the end of the catalog.
    #[error("mode index {index} out of range (catalog has {len} modes)")]
    OutOfRange {
        index: usize,
        len: usize,
    },

    /// Channel or topology the current mode does not implement.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The connected sensor reported an unexpected chip id.
    #[error("chip id mismatch: expected {expected:#x}, found {found:#x}")]
    WrongChipId {
        expected: u32,
        found: u32,
    },

    #[error(transparent)]
    RegisterAccess(#[from] RegisterAccessError),
}

impl IsiError {
    pub fn not_supported(what: impl Into<String>) -> Self {
        IsiError::NotSupported(what.into())
    }

    pub fn invalid_argument(what: impl Into<String>) -> Self {
        IsiError::InvalidArgument(what.into())
    }
}

impl From<IsiError> for CanonicalError {
    fn from(err: IsiError) -> Self {
        match err {
            IsiError::InvalidArgument(_) | IsiError::OutOfRange{..} |
            IsiError::NotSupported(_) =>
                invalid_argument_error(&err.to_string()),
            IsiError::WrongHandle | IsiError::WrongState(_) |
            IsiError::WrongChipId{..} | IsiError::RegisterAccess(_) =>
                failed_precondition_error(&err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_error_display() {
        let err = RegisterAccessError::write(0x3208, "nack");
        let msg = format!("{err}");
        assert!(msg.contains("write"));
        assert!(msg.contains("0x3208"));
        assert!(msg.contains("nack"));
    }

    #[test]
    fn register_error_converts() {
        let err: IsiError = RegisterAccessError::read(0x0202, "timeout").into();
        assert!(matches!(err, IsiError::RegisterAccess(ref e) if e.addr == 0x0202));
    }

    #[test]
    fn out_of_range_display() {
        let err = IsiError::OutOfRange{index: 7, len: 2};
        let msg = format!("{err}");
        assert!(msg.contains('7'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn wrong_state_display() {
        let msg = format!("{}", IsiError::WrongState(StreamingState::Streaming));
        assert!(msg.contains("Streaming"));
    }
}
