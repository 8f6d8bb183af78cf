//! texsearch finds images in a directory that resemble a key image.
//!
//! Every image is decoded, resized to a fixed square and converted to 8-bit
//! grayscale before comparison. Two search modes are supported: pixel MSE for
//! the same picture at another resolution, and cross-checked ORB keypoint
//! correspondences for structurally similar pictures. Matches are appended to
//! a per-run log file, and a run may be split across up to four worker
//! processes with the `rayon` feature adding data parallelism inside the
//! metrics.

pub mod config;
pub mod image;
pub mod keypoint;
pub mod matchlog;
pub mod metric;
pub mod partition;
pub mod pool;
pub mod scan;
mod trace;
pub mod util;

pub use config::{RunConfig, RunOptions, Tuning};
pub use image::normalize::{normalize, NormalizedImage, Normalizer};
pub use image::{ImageView, OwnedImage};
pub use matchlog::{log_file_name, MatchLogger};
pub use metric::{MetricEngine, Score, SearchMode, Thresholds};
pub use partition::{partition, WorkerCount};
pub use pool::{dispatch, InlineLauncher, Launcher, ProcessLauncher};
pub use scan::{list_candidates, run_worker, ScanDriver, ScanSummary};
pub use util::{TexSearchError, TexSearchResult};
