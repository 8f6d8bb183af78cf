//! Append-only match log shared by every worker of a run.
//!
//! Each record is formatted in memory and handed to the OS as one `write` on a
//! file opened with `O_APPEND`, so concurrent workers never interleave within
//! a line. The log is never read back or rewritten.

use crate::metric::Score;
use crate::util::{TexSearchError, TexSearchResult};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of every log file name.
pub const LOG_SUFFIX: &str = "_matches.txt";

/// Log file name for a run started at `start`, e.g.
/// `03_05_24_14_07_09PM_matches.txt`.
pub fn log_file_name<Tz>(start: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}{LOG_SUFFIX}", start.format("%m_%d_%y_%H_%M_%S%p"))
}

/// One log line: candidate path, a space, the formatted score.
pub fn format_record(candidate: &Path, score: Score) -> String {
    format!("{} {}\n", candidate.display(), score)
}

/// Writer for a run's match log.
#[derive(Clone, Debug)]
pub struct MatchLogger {
    path: PathBuf,
}

impl MatchLogger {
    /// Logger appending to `path`; nothing is opened until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file this logger writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the log file if it does not exist yet, leaving any content.
    pub fn touch(&self) -> TexSearchResult<()> {
        self.open().map(drop)
    }

    /// Appends one record for `candidate`.
    pub fn record(&self, candidate: &Path, score: Score) -> TexSearchResult<()> {
        let line = format_record(candidate, score);
        let mut file = self.open()?;
        file.write_all(line.as_bytes())
            .map_err(|source| TexSearchError::LogWrite {
                path: self.path.clone(),
                source,
            })
    }

    fn open(&self) -> TexSearchResult<std::fs::File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| TexSearchError::LogWrite {
                path: self.path.clone(),
                source,
            })
    }
}

/// Appends one record to the log at `log_path`.
pub fn record(log_path: &Path, candidate: &Path, score: Score) -> TexSearchResult<()> {
    MatchLogger::new(log_path).record(candidate, score)
}
