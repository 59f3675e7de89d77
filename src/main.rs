use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jammon::driver::Termination;
use jammon::{BandMode, Monitor, MonitorConfig};

/// Time left to background tasks once the decode loop has stopped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "jammon", version)]
#[command(about = "GNSS jamming and interference monitor for u-blox receivers")]
struct Cli {
    /// Receiver device node, e.g. /dev/ttyACM0
    #[arg(short = 'd', long)]
    device: Option<PathBuf>,
    /// Log every decoded message and snapshot
    #[arg(short = 'v', long)]
    verbose: bool,
    /// Receiver reports two RF bands (L1 and L2/L5)
    #[arg(short = 'M', long)]
    multiband: bool,
    /// UDP telemetry host
    #[arg(short = 'H', long)]
    host: Option<String>,
    /// UDP telemetry port
    #[arg(short = 'P', long)]
    port: Option<u16>,
    /// Reset the receiver before configuring it
    #[arg(short = 'r', long)]
    reset: bool,
    /// YAML configuration file; flags override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
    /// Directory for the daily CSV logs
    #[arg(long)]
    csv_dir: Option<PathBuf>,
    /// Disable CSV logging
    #[arg(long)]
    no_csv: bool,
    /// Disable UDP telemetry
    #[arg(long)]
    no_udp: bool,
    /// Maximum age of a message group in a snapshot
    #[arg(long)]
    freshness_ms: Option<u64>,
    /// Minimum time between two snapshots
    #[arg(long)]
    reemit_ms: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => MonitorConfig::default(),
        };

        if let Some(device) = self.device {
            config.device = Some(device);
        }
        if self.multiband {
            config.band_mode = BandMode::Dual;
        }
        if let Some(host) = self.host {
            config.udp.host = host;
        }
        if let Some(port) = self.port {
            config.udp.port = port;
        }
        if let Some(directory) = self.csv_dir {
            config.csv.directory = directory;
        }
        if let Some(freshness_ms) = self.freshness_ms {
            config.freshness_ms = freshness_ms;
        }
        if let Some(reemit_ms) = self.reemit_ms {
            config.reemit_ms = reemit_ms;
        }
        config.reset |= self.reset;
        config.csv.enabled &= !self.no_csv;
        config.udp.enabled &= !self.no_udp;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate =
            signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("waiting for Ctrl-C")?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    Ok(())
}

async fn run(config: MonitorConfig) -> Result<ExitCode> {
    let monitor = Monitor::start(&config).await.context("starting monitor")?;
    let cancel = monitor.cancellation_token();

    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Signal handling failed: {:#}", e),
        }
        cancel.cancel();
    });

    let report = monitor.join().await.context("receiver link failed")?;
    info!(
        "Processed {} frames into {} snapshots ({} rejected, {} sink failures)",
        report.frames, report.snapshots, report.pipeline.rejected, report.pipeline.sink_failures
    );

    Ok(match report.termination {
        Termination::Cancelled => ExitCode::SUCCESS,
        _ => {
            error!("Receiver stopped sending data");
            ExitCode::FAILURE
        }
    })
}

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("jammon: cannot start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(async_main());
    // A UDP send or sink write still in flight must not hold the exit
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}

async fn async_main() -> ExitCode {
    let cli = Cli::parse();

    if cli.device.is_none() && cli.config.is_none() {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    init_logging(cli.verbose);

    let config = match cli.into_config() {
        Ok(config) if config.device.is_some() => config,
        Ok(_) => {
            let _ = Cli::command().print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            if let Some(jammon) = e.downcast_ref::<jammon::JammonError>() {
                for suggestion in jammon.recovery_suggestions() {
                    info!("  - {}", suggestion);
                }
            }
            ExitCode::FAILURE
        }
    }
}
