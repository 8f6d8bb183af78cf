//! Error types for texsearch.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for texsearch operations.
pub type TexSearchResult<T> = std::result::Result<T, TexSearchError>;

/// Errors that can occur while configuring or running a search.
#[derive(Debug, Error)]
pub enum TexSearchError {
    /// The file is missing, not a decodable image, or not readable.
    #[error("unreadable input {path:?}: {reason}")]
    UnreadableInput { path: PathBuf, reason: String },
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is too small for the requested view.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Two images that must share a resolution do not.
    #[error("dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Descriptor extraction produced too few keypoints to match.
    #[error("too few keypoints: found {found}, need {needed}")]
    TooFewKeypoints { found: usize, needed: usize },

    /// The key image path does not name an existing file.
    #[error("key image not found: {0:?}")]
    MissingKeyImage(PathBuf),
    /// The candidate path is not a directory.
    #[error("candidate path is not a directory: {0:?}")]
    InvalidDirectory(PathBuf),
    /// Neither `compare` nor `highlowres` was given.
    #[error("a search mode is required: 'compare' or 'highlowres'")]
    MissingMode,
    /// Both search modes were given.
    #[error("more than one search mode given; choose 'compare' or 'highlowres'")]
    ConflictingModes,
    /// `threading=` value is not an integer.
    #[error("thread count {0:?} is not a number")]
    InvalidThreadCount(String),
    /// `threading=` value is outside 2..=4.
    #[error("thread count must be between 2 and 4, got {0}")]
    ThreadCountOutOfRange(usize),

    /// The match log could not be created or appended to.
    #[error("failed to write match log {path:?}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The candidate directory could not be listed.
    #[error("failed to list {path:?}: {reason}")]
    ListDirectory { path: PathBuf, reason: String },
    /// A worker process could not be started or fed its configuration.
    #[error("failed to launch worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
    /// A worker process exited unsuccessfully.
    #[error("worker {index} exited with status {status}")]
    WorkerFailed { index: usize, status: String },
    /// Run configuration could not be (de)serialized.
    #[error("invalid run configuration: {0}")]
    Config(#[from] serde_json::Error),
}
