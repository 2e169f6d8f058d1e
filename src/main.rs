//! virtwold - wakes local libvirt domains on Wake-on-LAN magic packets.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use virtwold::capture::{PacketCapture, PnetCapture};
use virtwold::classifier::{FrameClassifier, ValidationMode};
use virtwold::config::{Config, ConfigBuilder};
use virtwold::error::{CaptureError, ConfigError};
use virtwold::hypervisor::{SocketTransport, VirshConnector};
use virtwold::orchestrator::{ConnectionMode, FailurePolicy, WakeOrchestrator};
use virtwold::reporter::{EventReporter, LogReporter};

#[derive(Parser, Debug)]
#[command(name = "virtwold")]
#[command(about = "Virtual Wake-on-LAN: wakes libvirt domains on magic packets")]
#[command(version)]
struct Args {
    /// Network interface to listen on
    #[arg(short, long)]
    interface: Option<String>,

    /// libvirt socket type (unix or tcp)
    #[arg(long)]
    socket: Option<SocketTransport>,

    /// libvirt socket path, or host:port for tcp
    #[arg(long)]
    addr: Option<String>,

    /// Configuration file (key = value)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timeout for the initial control plane connection, in milliseconds
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// What a failed wake cycle does to the daemon (isolate or fail-fast)
    #[arg(long)]
    on_error: Option<FailurePolicy>,

    /// Hold one control plane session or open one per frame
    /// (persistent or per-frame)
    #[arg(long)]
    connection: Option<ConnectionMode>,

    /// Frame validation (filter or strict)
    #[arg(long)]
    validation: Option<ValidationMode>,

    /// Connection retries before a frame is given up on
    #[arg(long)]
    retries: Option<u32>,

    /// Delay before the first connection retry, in milliseconds
    #[arg(long)]
    retry_backoff_ms: Option<u64>,

    /// Path to the virsh program
    #[arg(long)]
    virsh: Option<PathBuf>,

    /// List available network interfaces and exit
    #[arg(short, long)]
    list_interfaces: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    /// Layer the command line over the file and environment settings.
    fn config(&self) -> Result<Config, ConfigError> {
        let mut builder = ConfigBuilder::new();
        if let Some(path) = &self.config {
            builder.load_file(path)?;
        }
        builder.load_env()?;

        if let Some(interface) = &self.interface {
            builder.interface = Some(interface.clone());
        }
        if let Some(transport) = self.socket {
            builder.transport = Some(transport);
        }
        if let Some(addr) = &self.addr {
            builder.address = Some(addr.clone());
        }
        if let Some(ms) = self.connect_timeout_ms {
            builder.connect_timeout_ms = Some(ms);
        }
        if let Some(policy) = self.on_error {
            builder.failure_policy = Some(policy);
        }
        if let Some(mode) = self.connection {
            builder.connection = Some(mode);
        }
        if let Some(mode) = self.validation {
            builder.validation = Some(mode);
        }
        if let Some(retries) = self.retries {
            builder.retries = Some(retries);
        }
        if let Some(ms) = self.retry_backoff_ms {
            builder.retry_backoff_ms = Some(ms);
        }
        if let Some(virsh) = &self.virsh {
            builder.virsh = Some(virsh.clone());
        }

        builder.build()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if args.list_interfaces {
        println!("Available network interfaces:");
        for iface in PnetCapture::list_interfaces() {
            println!("  {}", iface);
        }
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            if let Some(CaptureError::InsufficientPermissions) = e.downcast_ref::<CaptureError>() {
                error!("Try running with sudo or grant CAP_NET_RAW capability:");
                error!("  sudo setcap cap_net_raw+ep $(which virtwold)");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = match args.config() {
        Ok(config) => config,
        Err(ConfigError::MissingInterface) => {
            eprintln!("No interface to listen on specified");
            let _ = Args::command().print_help();
            anyhow::bail!(ConfigError::MissingInterface);
        }
        Err(e) => return Err(e).context("Invalid configuration"),
    };

    let mut capture = PnetCapture::new(&config.interface)?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        handler_flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;
    capture.set_running(Arc::clone(&running));

    let connector = VirshConnector::new(config.endpoint.clone())
        .with_program(config.virsh.clone())
        .with_connect_timeout(config.connect_timeout);
    let reporter = LogReporter::new().with_verbose(args.verbose);
    let classifier = FrameClassifier::new(config.validation);

    info!(
        "Control plane {} ({}), validation {}, on error {}",
        config.endpoint,
        config.endpoint.connection_uri(),
        config.validation,
        config.orchestrator.failure_policy
    );

    let mut orchestrator = WakeOrchestrator::new(connector, reporter, config.orchestrator);
    orchestrator.reporter().on_start(capture.interface_name());

    let frames = capture.capture_wol_frames()?;
    let result = orchestrator.run(frames, &classifier);
    orchestrator.reporter().on_stop();

    let summary = result.context("Stopping after a failed wake cycle")?;
    info!(
        "Handled {} wake requests: {} matched, {} unmatched, {} failed",
        summary.matched + summary.unmatched + summary.failed,
        summary.matched,
        summary.unmatched,
        summary.failed
    );

    Ok(())
}
