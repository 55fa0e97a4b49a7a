use pl_types::DType;
use thiserror::Error;

/// Failures reported by a [`Backend`](crate::Backend) while building values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },
    #[error("unknown column: {name}")]
    UnknownColumn { name: String },
    #[error("backend does not accept {dtype} literals")]
    UnsupportedLiteral { dtype: DType },
    #[error("invalid arguments to `{operation}`: {detail}")]
    InvalidArguments { operation: String, detail: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },
    #[error("invalid literal `{literal}` at position {position}: {reason}")]
    InvalidLiteral {
        position: usize,
        literal: String,
        reason: &'static str,
    },
    #[error("expression nesting exceeds the limit of {limit}")]
    NestingTooDeep {
        position: Option<usize>,
        limit: usize,
    },
    #[error("expression source is {len} bytes, limit is {limit}")]
    SourceTooLong { len: usize, limit: usize },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ExprError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Byte offset into the source where the failure was detected, if any.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Parse { position, .. } | Self::InvalidLiteral { position, .. } => Some(*position),
            Self::NestingTooDeep { position, .. } => *position,
            Self::SourceTooLong { .. } | Self::Backend(_) => None,
        }
    }
}
