//! Error types. Encoding and index-consistency failures are fatal for a run; filter rejections and
//! budget exhaustion are ordinary control flow and never surface here.

use crate::StateId;
use std::path::PathBuf;
use thiserror::Error;

/// A boxed error produced by an external collaborator (model source or generator).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The configured slice layout does not match a state buffer, or a value cannot be encoded.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EncodingError {
    #[error("Slice index out of bounds. index={index}, len={len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("State buffer of {bits} bits is not a whole multiple of the {width}-bit slice width.")]
    Misaligned { bits: usize, width: u8 },

    #[error("Invalid slice layout. width={width}, reserved={reserved}")]
    InvalidLayout { width: u8, reserved: u8 },

    #[error("Value {value} does not fit in {payload_bits} payload bits.")]
    Overflow { value: u32, payload_bits: u8 },

    #[error("Field order is not a permutation of 0..{len}. positions={positions:?}")]
    InvalidOrder { len: usize, positions: Vec<usize> },

    #[error("Field order covers {order_len} slices but the state has {len}.")]
    OrderLength { order_len: usize, len: usize },

    #[error("State buffer of {bit_len} bits needs {expected} words but has {words}.")]
    WordCount { bit_len: usize, expected: usize, words: usize },
}

/// Terminates an exploration run.
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The identifier allocated by the explorer differs from the one the index returned.
    #[error("Identity index disagrees with the explorer. expected={expected}, actual={actual}")]
    IdMismatch { expected: StateId, actual: StateId },

    /// The index reported a hit but could not produce an identifier for it.
    #[error("Identity index reported a hit without an identifier. size={size}")]
    LostIdentifier { size: usize },

    #[error("Generator failed: {0}")]
    Generator(#[source] BoxError),
}

impl ExploreError {
    /// Wraps a failure raised by a [`Generator`](crate::Generator) implementation.
    pub fn generator(error: impl Into<BoxError>) -> Self {
        ExploreError::Generator(error.into())
    }
}

/// Invalid or unreadable [`Settings`](crate::Settings).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown backend {0:?}. Expected one of: trie, hash, kd.")]
    UnknownBackend(String),

    #[error("Unknown field {name:?} in ordering. available={available:?}")]
    UnknownField { name: String, available: Vec<String> },

    #[error("Field {0:?} appears more than once in ordering.")]
    DuplicateField(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Any failure of a configured exploration session.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Explore(#[from] ExploreError),

    #[error("Unable to open model {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}
