#[macro_use]
extern crate tracing;

use std::{path::PathBuf, sync::Arc};

use color_eyre::eyre::{self, WrapErr};
use structopt::StructOpt;
use tokio::runtime::Builder;
use tokio::signal;

use lumos::{
    methods::{File, Publisher, Stdout},
    models::{Config, ConfigExt},
    orchestrator::{load_devices, load_groups, Orchestrator},
    runtime::CompiledConfig,
};

#[derive(Debug, StructOpt)]
#[structopt(about = "Drives zigbee lights through slow perceptual color transitions")]
struct Opts {
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u32,
    #[structopt(short, long = "config", default_value = "/config/config.json")]
    config_path: PathBuf,
    /// Snapshot of the bridge device list
    #[structopt(long = "devices")]
    devices_path: Option<PathBuf>,
    /// Snapshot of the bridge group list
    #[structopt(long = "groups")]
    groups_path: Option<PathBuf>,
    /// Append commands to this file instead of writing them to stdout
    #[structopt(short, long = "output")]
    output_path: Option<PathBuf>,
    #[structopt(long)]
    dump_config: bool,
}

async fn load_config(opts: &Opts) -> eyre::Result<CompiledConfig> {
    let config = Config::load_file(&opts.config_path)
        .await
        .wrap_err_with(|| format!("loading {}", opts.config_path.display()))?;

    Ok(config.compile()?)
}

/// Feed the topology snapshots to the orchestrator
///
/// A missing or invalid snapshot is logged and skipped, the orchestrator
/// keeps waiting for a complete topology.
async fn load_topology(opts: &Opts, orchestrator: &Orchestrator) {
    if let Some(path) = opts.devices_path.as_deref() {
        match load_devices(path).await {
            Ok(update) => orchestrator.update(update).await,
            Err(error) => error!(path = %path.display(), error = %error, "failed to load devices"),
        }
    }

    if let Some(path) = opts.groups_path.as_deref() {
        match load_groups(path).await {
            Ok(update) => orchestrator.update(update).await,
            Err(error) => error!(path = %path.display(), error = %error, "failed to load groups"),
        }
    }
}

async fn reload(opts: &Opts, orchestrator: &Orchestrator) {
    match load_config(opts).await {
        Ok(config) => orchestrator.reload(config).await,
        Err(error) => {
            error!(error = %error, "failed to reload configuration, keeping the current one")
        }
    }

    load_topology(opts, orchestrator).await;
}

async fn run(opts: Opts) -> eyre::Result<()> {
    debug!("{}", env!("LUMOS_VERSION_ID"));

    // Dump configuration if this was asked
    if opts.dump_config {
        let config = Config::load_file(&opts.config_path).await?;
        print!("{}", config.to_string()?);
        return Ok(());
    }

    // An invalid configuration aborts startup
    let config = load_config(&opts).await?;

    let publisher: Arc<dyn Publisher> = match opts.output_path.as_deref() {
        Some(path) => Arc::new(File::open(path)?),
        None => Arc::new(Stdout::new()),
    };

    let orchestrator = Orchestrator::new(config, publisher);
    load_topology(&opts, &orchestrator).await;

    info!(devices = ?orchestrator.running().await, "started");

    #[cfg(unix)]
    {
        use signal::unix::{signal as unix_signal, SignalKind};

        let mut hangup = unix_signal(SignalKind::hangup())?;
        let mut terminate = unix_signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                _ = signal::ctrl_c() => break,
                _ = terminate.recv() => break,
                _ = hangup.recv() => {
                    info!("reloading");
                    reload(&opts, &orchestrator).await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    orchestrator.shutdown().await;
    Ok(())
}

fn install_tracing(opts: &Opts) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let fmt_layer = fmt::layer();

    let filter_layer = EnvFilter::try_from_env("LUMOS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match opts.verbose {
            0 => "lumos=info,lumosd=info",
            1 => "lumos=debug,lumosd=debug",
            _ => "lumos=trace,lumosd=trace",
        })
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer.with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init()
}

#[paw::main]
fn main(opts: Opts) -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    install_tracing(&opts)?;

    // Create tokio runtime
    let thd_count = match num_cpus::get() {
        1 => 2,
        other => other.min(4),
    };

    let rt = Builder::new_multi_thread()
        .worker_threads(thd_count)
        .enable_all()
        .build()?;
    rt.block_on(run(opts))
}
