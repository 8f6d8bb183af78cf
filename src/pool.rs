//! Fan-out of a run over a fixed number of workers.
//!
//! The parent partitions the candidate list, hands each non-empty chunk to a
//! [`Launcher`], then waits for every worker before returning. Workers share
//! nothing but the append-only match log.

use crate::config::RunConfig;
use crate::partition::partition;
use crate::scan::{run_worker, ScanSummary};
use crate::trace::{trace_event, trace_span};
use crate::util::{TexSearchError, TexSearchResult};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

/// Starts one worker per chunk and waits for it.
pub trait Launcher {
    type Handle;

    /// Starts worker `index` scanning `config.candidates`.
    fn launch(&self, index: usize, config: RunConfig) -> TexSearchResult<Self::Handle>;

    /// Blocks until worker `index` exits and returns its totals.
    fn join(&self, index: usize, handle: Self::Handle) -> TexSearchResult<ScanSummary>;
}

/// Runs each worker as a child process of `program`.
///
/// The child receives its [`RunConfig`] as JSON on stdin and prints its
/// [`ScanSummary`] as JSON on stdout. Its stderr is inherited.
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Launcher for ProcessLauncher {
    type Handle = Child;

    fn launch(&self, index: usize, config: RunConfig) -> TexSearchResult<Child> {
        let payload = config.to_json()?;
        let spawn_err = |source| TexSearchError::WorkerSpawn { index, source };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;

        // Dropping stdin closes the pipe so the worker sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(payload.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_err(source));
            }
        }
        Ok(child)
    }

    fn join(&self, index: usize, child: Child) -> TexSearchResult<ScanSummary> {
        let output = child
            .wait_with_output()
            .map_err(|source| TexSearchError::WorkerSpawn { index, source })?;
        if !output.status.success() {
            return Err(TexSearchError::WorkerFailed {
                index,
                status: output.status.to_string(),
            });
        }
        serde_json::from_slice(&output.stdout).map_err(|err| TexSearchError::WorkerFailed {
            index,
            status: format!("unreadable summary: {err}"),
        })
    }
}

/// Runs each worker on a thread of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineLauncher;

impl Launcher for InlineLauncher {
    type Handle = JoinHandle<TexSearchResult<ScanSummary>>;

    fn launch(&self, index: usize, config: RunConfig) -> TexSearchResult<Self::Handle> {
        std::thread::Builder::new()
            .name(format!("texsearch-worker-{index}"))
            .spawn(move || run_worker(&config))
            .map_err(|source| TexSearchError::WorkerSpawn { index, source })
    }

    fn join(&self, index: usize, handle: Self::Handle) -> TexSearchResult<ScanSummary> {
        handle.join().map_err(|_| TexSearchError::WorkerFailed {
            index,
            status: "panicked".to_string(),
        })?
    }
}

/// Partitions `config.candidates` over `config.workers` and runs every
/// non-empty chunk through `launcher`.
///
/// All launched workers are joined even when one of them fails; the first
/// error is returned afterwards. Summaries of successful workers are merged.
pub fn dispatch<L: Launcher>(config: &RunConfig, launcher: &L) -> TexSearchResult<ScanSummary> {
    let _span = trace_span!(
        "dispatch",
        workers = config.workers.get(),
        candidates = config.candidates.len()
    )
    .entered();

    let mut running = Vec::new();
    let mut first_err = None;
    for (index, chunk) in partition(&config.candidates, config.workers)
        .into_iter()
        .enumerate()
    {
        if chunk.is_empty() {
            continue;
        }
        match launcher.launch(index, config.with_candidates(chunk)) {
            Ok(handle) => {
                trace_event!("worker_started", index = index, candidates = chunk.len());
                running.push((index, handle));
            }
            Err(err) => {
                first_err = Some(err);
                break;
            }
        }
    }

    let mut total = ScanSummary::default();
    for (index, handle) in running {
        match launcher.join(index, handle) {
            Ok(summary) => {
                trace_event!("worker_finished", index = index, matched = summary.matched);
                total.merge(&summary);
            }
            Err(err) => {
                first_err.get_or_insert(err);
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(total),
    }
}
