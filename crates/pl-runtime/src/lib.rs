#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nesting limit applied when no policy is supplied.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// Nesting limit used by [`RuntimePolicy::hardened`].
pub const HARDENED_MAX_NESTING_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid policy: {0}")]
    InvalidLimit(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Resource limits for a single parse or evaluation call.
///
/// Every parenthesized group, call argument list and prefix operator counts
/// as one nesting level; binary chains like `a + b + c` count none. The
/// parser recurses once per level, so `max_nesting_depth` bounds its stack
/// usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimePolicy {
    pub max_nesting_depth: usize,
    pub max_source_bytes: Option<usize>,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_source_bytes: None,
        }
    }
}

impl RuntimePolicy {
    /// Tighter limits for expressions that come from untrusted callers.
    #[must_use]
    pub fn hardened(max_source_bytes: Option<usize>) -> Self {
        Self {
            max_nesting_depth: HARDENED_MAX_NESTING_DEPTH,
            max_source_bytes,
        }
    }

    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_nesting_depth == 0 {
            return Err(PolicyError::InvalidLimit(
                "max_nesting_depth must be at least 1",
            ));
        }
        if self.max_source_bytes == Some(0) {
            return Err(PolicyError::InvalidLimit(
                "max_source_bytes must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Load a policy from JSON. Missing fields fall back to the defaults.
    pub fn from_json(input: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(input)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Returns `true` when `len` bytes of source are within the cap.
    #[must_use]
    pub fn admits_source_len(&self, len: usize) -> bool {
        self.max_source_bytes.is_none_or(|limit| len <= limit)
    }
}
