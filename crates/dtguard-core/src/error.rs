use crate::dtype::Dtype;
use crate::site::CallSite;

/// Errors raised by dtguard.
///
/// Only two kinds are raised by checks and type mapping: `UnsupportedType`
/// (a programming error) and `PreconditionViolated` (a tensor property did
/// not match what the caller expected). The rest come from parsing and
/// construction helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Unsupported data for {op}: {type_name}")]
    UnsupportedType {
        op: &'static str,
        type_name: &'static str,
    },

    #[error("{op} does not support dtype {dtype}")]
    UnsupportedDtype { op: &'static str, dtype: Dtype },

    #[error("{site}: {message}")]
    PreconditionViolated { message: String, site: CallSite },

    #[error("dtype name '{name}' is {len} bytes, at most {max} allowed")]
    DtypeNameTooLong {
        name: String,
        len: usize,
        max: usize,
    },

    #[error("unknown dtype name '{0}'")]
    InvalidDtypeName(String),

    #[error("invalid device string '{0}'")]
    InvalidDevice(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl GuardError {
    /// Whether this error came from a failed tensor property check.
    pub fn is_precondition(&self) -> bool {
        matches!(self, GuardError::PreconditionViolated { .. })
    }

    /// Call site of a failed check, if this is a precondition error.
    pub fn site(&self) -> Option<&CallSite> {
        match self {
            GuardError::PreconditionViolated { site, .. } => Some(site),
            _ => None,
        }
    }

    /// The bare comparison message of a failed check, without location.
    pub fn message(&self) -> Option<&str> {
        match self {
            GuardError::PreconditionViolated { message, .. } => Some(message),
            _ => None,
        }
    }
}
