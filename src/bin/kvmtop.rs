//! kvmtop: live per-thread, network and block device rates for
//! virtualization hosts.
//!
//! Run: `sudo kvmtop -i 2`

use anyhow::{Context, Result};
use clap::Parser;
use kvmtop::collectors::procfs::effective_uid;
use kvmtop::collectors::procfs_sources;
use kvmtop::terminal::{install_panic_hook, CrosstermEvents, TerminalGuard};
use kvmtop::config::interval_from_secs;
use kvmtop::{debug, App, Config, KvmtopError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Pause after the non-root warning so it can be read.
const ROOT_WARNING_PAUSE: Duration = Duration::from_secs(2);

/// Upper bound on the warm-up between baseline and first sample.
const MAX_WARMUP: Duration = Duration::from_secs(1);

/// kvmtop: top for KVM hosts
#[derive(Parser, Debug)]
#[command(name = "kvmtop")]
#[command(author = "PAIML Team")]
#[command(version, disable_version_flag = true)]
#[command(about = "Per-thread CPU/IO, network and disk rates for virtualization hosts", long_about = None)]
struct Cli {
    /// Refresh interval in seconds
    #[arg(short, long, value_parser = parse_interval)]
    interval: Option<f64>,

    /// Only sample these process ids (repeatable)
    #[arg(short, long = "pid")]
    pid: Vec<u32>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable threshold colors
    #[arg(long)]
    no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Write debug logging to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long)]
    version: bool,
}

fn parse_interval(raw: &str) -> std::result::Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    match interval_from_secs(secs) {
        Some(_) => Ok(secs),
        None => Err(format!("must be a positive number of seconds, got {raw}")),
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    debug::enable_from_env();
    if !(cli.debug || debug::is_enabled()) {
        return Ok(());
    }
    match &cli.log_file {
        Some(path) => debug::enable_with_file(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?,
        None => debug::enable(),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::resolve(cli.config.as_deref()).context("loading configuration")?;
    if let Some(secs) = cli.interval {
        config.interval_secs = secs;
    }
    if cli.no_color {
        config.color = false;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli)?;
    let config = load_config(cli)?;
    kvmtop::info!("main", "config: {:?}", config);

    if effective_uid().is_some_and(|uid| uid != 0) {
        eprintln!(
            "Warning: Not running as root. IO stats will be unavailable for other users' processes."
        );
        std::thread::sleep(ROOT_WARNING_PAUSE);
    }

    let sources = procfs_sources(&config, cli.pid.clone());
    if !sources.threads.is_available() {
        return Err(KvmtopError::CollectorUnavailable(sources.threads.id()).into());
    }

    let warmup = config.interval().min(MAX_WARMUP);
    println!("Initializing (wait {:.1}s)...", warmup.as_secs_f64());

    let mut app = App::new(config, sources);
    app.capture_baseline().context("capturing baseline")?;
    std::thread::sleep(warmup);

    install_panic_hook();
    let mut guard = TerminalGuard::new().context("entering raw mode")?;
    app.run(guard.terminal(), &mut CrosstermEvents::new())?;
    Ok(())
}

fn exit_code_of(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<KvmtopError>().map_or(1, KvmtopError::exit_code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.version {
        println!("kvmtop {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            kvmtop::error!("main", "{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_of(&e))
        }
    }
}
