use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use texsearch::config::resolve_against;
use texsearch::{
    dispatch, list_candidates, log_file_name, run_worker, MatchLogger, ProcessLauncher, RunConfig,
    RunOptions, ScanDriver, ScanSummary, Tuning,
};
use tracing_subscriber::EnvFilter;

/// Flag that turns the binary into a worker reading its config from stdin.
const WORKER_FLAG: &str = "--worker";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Find images in a directory that resemble a key image",
    after_help = "OPTIONS words (any order): compare | highlowres, -v, threading=N (N in 2..=4)"
)]
struct Cli {
    /// Image to search for.
    #[arg(required_unless_present_any = ["worker", "print_example"])]
    key: Option<PathBuf>,
    /// Directory whose files are compared against the key.
    #[arg(required_unless_present_any = ["worker", "print_example"])]
    dir: Option<PathBuf>,
    /// Option words following the directory.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    options: Vec<String>,
    /// JSON file with tuning constants (thresholds, canonical size, ORB).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the default tuning as JSON and exit.
    #[arg(long)]
    print_example: bool,
    /// Directory the match log is created in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    log_dir: PathBuf,
    /// Run as a worker: read a run config from stdin, print a summary.
    #[arg(long, hide = true)]
    worker: bool,
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn Error>> {
    let directive = if verbose {
        "texsearch=info"
    } else {
        "texsearch=warn"
    };
    // Workers print their summary on stdout, so diagnostics go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
    Ok(())
}

fn report(mut out: impl Write, summary: &ScanSummary) -> io::Result<()> {
    writeln!(out, "Ran in {:.4} seconds", summary.elapsed.as_secs_f64())?;
    writeln!(out, "Processed {} files", summary.processed)?;
    writeln!(
        out,
        "Matched {}, skipped {}, failed {}",
        summary.matched, summary.skipped, summary.failed
    )
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning, Box<dyn Error>> {
    match path {
        Some(path) => Ok(Tuning::from_json(&fs::read_to_string(path)?)?),
        None => Ok(Tuning::default()),
    }
}

fn run_as_worker() -> Result<ExitCode, Box<dyn Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let config = RunConfig::from_json(&input)?;
    init_tracing(config.verbose)?;

    let summary = run_worker(&config)?;
    if config.verbose {
        report(io::stderr().lock(), &summary)?;
    }
    println!("{}", serde_json::to_string(&summary)?);
    Ok(ExitCode::SUCCESS)
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    if cli.worker {
        return run_as_worker();
    }
    if cli.print_example {
        println!("{}", serde_json::to_string_pretty(&Tuning::default())?);
        return Ok(ExitCode::SUCCESS);
    }

    let start = Instant::now();
    let (Some(key), Some(dir)) = (cli.key, cli.dir) else {
        return Err("a key image and a candidate directory are required".into());
    };
    let options = RunOptions::parse(cli.options.as_slice())?;
    init_tracing(options.verbose)?;
    for word in &options.ignored {
        tracing::warn!(word = word.as_str(), "ignoring unknown option");
    }

    let tuning = load_tuning(cli.config.as_ref())?;
    let key = resolve_against(&std::env::current_dir()?, &key);
    let log_path = cli.log_dir.join(log_file_name(&Local::now()));
    let mut config = RunConfig::new(key, dir, &options, log_path, tuning)?;

    // Decoding the key here makes an unreadable key fatal before any worker starts.
    let driver = ScanDriver::new(&config)?;
    config.candidates = list_candidates(&config.candidate_dir)?;
    MatchLogger::new(&config.log_path).touch()?;

    if config.candidates.is_empty() {
        tracing::warn!(
            dir = %config.candidate_dir.display(),
            "candidate directory has no files"
        );
        if config.verbose {
            let summary = ScanSummary {
                elapsed: start.elapsed(),
                ..ScanSummary::default()
            };
            report(io::stdout().lock(), &summary)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let summary = if config.workers.is_pooled() {
        let launcher = ProcessLauncher::new(std::env::current_exe()?, [WORKER_FLAG]);
        dispatch(&config, &launcher)?
    } else {
        driver.scan(&config.candidates)?
    };

    if config.verbose {
        report(io::stdout().lock(), &summary)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("texsearch: {err}");
            ExitCode::FAILURE
        }
    }
}
