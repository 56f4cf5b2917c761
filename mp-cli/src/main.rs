//! Marco/Polo link sweep tester
//!
//! Drives both ends of the time-slotted configuration sweep over a
//! simulated link: an Initiator transmitting `Marco` on every slot entry
//! and a Responder that locks onto its timing and answers `Polo`. The
//! per-configuration success table printed at exit shows which
//! configurations complete round trips at the simulated distance.
//!
//! The first Ctrl-C is the operator reset (zero statistics, start
//! round 1); a second within two seconds quits and prints the results.

mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use mp_protocol::{ChannelConfig, ConfigTable, Role};
use mp_sim::{SimLink, SimLinkConfig};
use mp_sweep::{run_sweep, RunnerCommand, SweepEngine, SweepEvent, SweepSnapshot};
use settings::Settings;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line options
struct Options {
    /// Role to persist for this device (`--role`)
    role: Option<Role>,
    /// Simulated distance: minimum spreading factor that still reaches
    /// the peer (`--min-sf`)
    min_spreading_factor: u8,
    /// Stop after this long instead of waiting for Ctrl-C
    /// (`--duration-secs`)
    duration: Option<Duration>,
    /// Optional JSON file with a custom configuration table (`--table`)
    table: Option<PathBuf>,
}

fn usage() -> &'static str {
    "marcopolo - Marco/Polo link sweep tester\n\
     \n\
     Options:\n\
       --role <initiator|responder>  persist this device's role\n\
       --min-sf <N>                  simulated distance: lowest spreading\n\
                                     factor that still reaches the peer\n\
       --duration-secs <N>           stop after N seconds\n\
       --table <file.json>           custom configuration table\n\
       --help                        show this help"
}

fn parse_args() -> Result<Options> {
    let mut opts = Options {
        role: None,
        min_spreading_factor: 0,
        duration: None,
        table: None,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--role" => {
                let value = args.next().context("--role needs a value")?;
                opts.role = Some(match value.as_str() {
                    "initiator" => Role::Initiator,
                    "responder" => Role::Responder,
                    other => bail!("unknown role '{}'", other),
                });
            }
            "--min-sf" => {
                let value = args.next().context("--min-sf needs a value")?;
                opts.min_spreading_factor =
                    value.parse().context("--min-sf must be a number")?;
            }
            "--duration-secs" => {
                let value = args.next().context("--duration-secs needs a value")?;
                let secs: u64 = value.parse().context("--duration-secs must be a number")?;
                opts.duration = Some(Duration::from_secs(secs));
            }
            "--table" => {
                let value = args.next().context("--table needs a path")?;
                opts.table = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("unknown option '{}'\n\n{}", other, usage()),
        }
    }

    Ok(opts)
}

/// Load the configuration table, refusing to run with an empty one
fn load_table(path: Option<&PathBuf>) -> Result<ConfigTable> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading table file {}", path.display()))?;
            let entries: Vec<ChannelConfig> =
                serde_json::from_str(&json).context("parsing configuration table")?;
            ConfigTable::new(entries, 4).context("configuration table rejected")
        }
        None => Ok(ConfigTable::standard()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marcopolo=info,mp_sweep=info,mp_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let opts = parse_args()?;

    let mut settings = Settings::load();
    if let Some(role) = opts.role {
        if role != settings.role {
            settings.role = role;
            settings.save().context("saving settings")?;
        }
    }
    info!(
        "persisted role for this device: {}",
        settings.role.name()
    );

    // Fatal at startup: an empty table would make the slot clock divide
    // by zero, so there is no degraded run.
    let table = load_table(opts.table.as_ref())?;
    info!(
        entries = table.len(),
        min_sf = opts.min_spreading_factor,
        "starting loopback sweep"
    );

    let (link_i, link_r) = SimLink::pair(SimLinkConfig {
        min_spreading_factor: opts.min_spreading_factor,
        ..Default::default()
    });

    let initiator = SweepEngine::new(table.clone(), Role::Initiator, 0);
    let responder = SweepEngine::new(table.clone(), Role::Responder, 0);

    let (cmd_tx_i, cmd_rx_i) = mpsc::channel(16);
    let (cmd_tx_r, cmd_rx_r) = mpsc::channel(16);
    let (event_tx_i, event_rx_i) = mpsc::channel(256);
    let (event_tx_r, event_rx_r) = mpsc::channel(256);

    tokio::spawn(run_sweep(initiator, link_i, cmd_rx_i, event_tx_i));
    tokio::spawn(run_sweep(responder, link_r, cmd_rx_r, event_tx_r));
    tokio::spawn(log_events(Role::Initiator, event_rx_i));
    tokio::spawn(log_events(Role::Responder, event_rx_r));

    let deadline = opts.duration.map(|d| Instant::now() + d);
    let mut last_interrupt: Option<Instant> = None;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("listening for Ctrl-C")?;
                let now = Instant::now();
                if last_interrupt
                    .is_some_and(|t| now.duration_since(t) < Duration::from_secs(2))
                {
                    break;
                }
                last_interrupt = Some(now);
                info!("operator reset (Ctrl-C again within 2s to quit)");
                let _ = cmd_tx_i.send(RunnerCommand::ResetStats).await;
                let _ = cmd_tx_r.send(RunnerCommand::ResetStats).await;
            }
            _ = async {
                match deadline {
                    Some(d) => tokio::time::sleep_until(d).await,
                    None => std::future::pending().await,
                }
            } => break,
        }
    }

    let snap_i = query(&cmd_tx_i).await?;
    let snap_r = query(&cmd_tx_r).await?;
    print_summary(&table, &snap_i, &snap_r);

    let _ = cmd_tx_i.send(RunnerCommand::Shutdown).await;
    let _ = cmd_tx_r.send(RunnerCommand::Shutdown).await;

    Ok(())
}

/// Render engine events as log lines, the stand-in for the status display
async fn log_events(role: Role, mut event_rx: mpsc::Receiver<SweepEvent>) {
    while let Some(event) = event_rx.recv().await {
        match event {
            SweepEvent::SlotChanged {
                to,
                description,
                round,
                slot_count,
                ..
            } => {
                info!(
                    "[{}] slot {} ({}) round {} ok={}",
                    role.name(),
                    to,
                    description,
                    round,
                    slot_count
                );
            }
            SweepEvent::TokenReceived {
                token,
                quality,
                slot_count,
                ..
            } => {
                info!(
                    "[{}] heard {} at {} (count {})",
                    role.name(),
                    token,
                    quality,
                    slot_count
                );
            }
            SweepEvent::SyncAcquired { index } => {
                info!("[{}] acquired sync on index {}", role.name(), index);
            }
            SweepEvent::SyncLost { misses } => {
                warn!(
                    "[{}] lost sync after {} silent slots, searching again",
                    role.name(),
                    misses
                );
            }
            SweepEvent::RoundCompleted { round } => {
                info!("[{}] completed sweep, entering round {}", role.name(), round);
            }
            SweepEvent::StatsReset => {
                info!("[{}] statistics reset", role.name());
            }
            SweepEvent::LinkFault { operation, message } => {
                warn!("[{}] link {} fault: {}", role.name(), operation, message);
            }
            // Plain sends and noise are debug-level chatter
            SweepEvent::TokenSent { .. } | SweepEvent::Activity { .. } => {}
        }
    }
}

async fn query(cmd_tx: &mpsc::Sender<RunnerCommand>) -> Result<SweepSnapshot> {
    let (tx, rx) = oneshot::channel();
    cmd_tx
        .send(RunnerCommand::QueryStats { response: tx })
        .await
        .context("sweep runner stopped")?;
    rx.await.context("sweep runner dropped the query")
}

fn print_summary(table: &ConfigTable, initiator: &SweepSnapshot, responder: &SweepSnapshot) {
    println!();
    println!(
        "Results after round {} ({}synced):",
        initiator.round,
        if responder.syncing { "never " } else { "" }
    );
    println!(
        "{:>3}  {:<12} {:>10} {:>10}",
        "idx", "config", "initiator", "responder"
    );
    for (index, config) in table.iter().enumerate() {
        println!(
            "{:>3}  {:<12} {:>10} {:>10}",
            index,
            config.description,
            initiator.counts.get(index).copied().unwrap_or(0),
            responder.counts.get(index).copied().unwrap_or(0),
        );
    }
}
