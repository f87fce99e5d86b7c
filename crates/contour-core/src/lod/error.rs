//! LOD pyramid error types

use thiserror::Error;

/// Errors raised while building a pyramid from an analysis buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LodError {
    /// Channel count of zero
    #[error("Analysis buffer must have at least one channel")]
    ZeroChannels,

    /// Buffer length is not a whole number of fragments
    #[error("Analysis buffer of {len} values is not a multiple of {channels} channels")]
    RaggedBuffer { len: usize, channels: usize },

    /// Split (left/right) buffer with an odd number of values
    #[error("Split analysis buffer of {len} values cannot be halved")]
    OddSplit { len: usize },
}

/// Result type for pyramid construction
pub type LodResult<T> = Result<T, LodError>;
