//! Async sweep runner
//!
//! Wraps a [`SweepEngine`] in a single tokio task: a fixed-tick poll
//! drives the engine, control commands arrive on one channel and drained
//! events leave on another. All state stays owned by the task, so there
//! is nothing to lock.

use mp_protocol::LinkTransport;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::SweepEngine;
use crate::events::SweepEvent;

/// How often the control loop polls the clock and the link
pub const POLL_INTERVAL_MS: u64 = 50;

/// Point-in-time snapshot of a running sweep
#[derive(Debug, Clone)]
pub struct SweepSnapshot {
    /// Per-configuration success counts in table order
    pub counts: Vec<u64>,
    /// Current round counter
    pub round: u32,
    /// Whether the engine is still searching for sync
    pub syncing: bool,
    /// Currently active configuration index
    pub active: Option<usize>,
}

/// Commands sent to the sweep runner
#[derive(Debug)]
pub enum RunnerCommand {
    /// Operator reset: zero statistics, start round 1
    ResetStats,

    /// Query the current sweep state
    QueryStats {
        /// Channel to send the snapshot back on
        response: oneshot::Sender<SweepSnapshot>,
    },

    /// Stop the runner
    Shutdown,
}

/// Drive a sweep engine until shutdown
///
/// The engine's millisecond clock starts at 0 when the runner starts.
/// Events are forwarded over `event_tx`; if the receiver goes away the
/// runner stops, since nobody is watching the measurement anymore.
pub async fn run_sweep<L: LinkTransport>(
    mut engine: SweepEngine,
    mut link: L,
    mut cmd_rx: mpsc::Receiver<RunnerCommand>,
    event_tx: mpsc::Sender<SweepEvent>,
) {
    let started = Instant::now();
    let mut poll = interval(Duration::from_millis(POLL_INTERVAL_MS));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(role = engine.role().name(), "sweep runner started");

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let now_ms = started.elapsed().as_millis() as u64;
                engine.poll(now_ms, &mut link);

                for event in engine.drain_events() {
                    if event_tx.send(event).await.is_err() {
                        debug!("event receiver dropped, stopping runner");
                        return;
                    }
                }
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(RunnerCommand::ResetStats) => {
                        engine.reset_stats();
                        for event in engine.drain_events() {
                            if event_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(RunnerCommand::QueryStats { response }) => {
                        let _ = response.send(snapshot(&engine));
                    }
                    Some(RunnerCommand::Shutdown) | None => {
                        info!(role = engine.role().name(), "sweep runner stopping");
                        return;
                    }
                }
            }
        }
    }
}

fn snapshot(engine: &SweepEngine) -> SweepSnapshot {
    SweepSnapshot {
        counts: engine.stats().counts().to_vec(),
        round: engine.round(),
        syncing: engine.is_syncing(),
        active: engine.active_index(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_protocol::{ConfigTable, Role};
    use mp_sim::{SimLink, SimLinkConfig};

    #[tokio::test(start_paused = true)]
    async fn test_runner_sweeps_and_answers_queries() {
        let (link, _peer) = SimLink::pair(SimLinkConfig::default());
        let engine = SweepEngine::new(ConfigTable::standard(), Role::Initiator, 0);

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(256);

        let task = tokio::spawn(run_sweep(engine, link, cmd_rx, event_tx));

        // Two slot periods of virtual time
        tokio::time::sleep(Duration::from_millis(6100)).await;

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(RunnerCommand::QueryStats { response: tx })
            .await
            .unwrap();
        let snap = rx.await.unwrap();
        assert_eq!(snap.active, Some(2));
        assert!(!snap.syncing);

        // The Initiator transmitted on each slot entry
        let mut sent = 0;
        while let Ok(event) = event_rx.try_recv() {
            if matches!(event, SweepEvent::TokenSent { .. }) {
                sent += 1;
            }
        }
        assert_eq!(sent, 3);

        cmd_tx.send(RunnerCommand::Shutdown).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_reset_command() {
        let (link, _peer) = SimLink::pair(SimLinkConfig::default());
        let engine = SweepEngine::new(ConfigTable::standard(), Role::Initiator, 0);

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(256);
        let task = tokio::spawn(run_sweep(engine, link, cmd_rx, event_tx));

        tokio::time::sleep(Duration::from_millis(200)).await;
        cmd_tx.send(RunnerCommand::ResetStats).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut saw_reset = false;
        while let Ok(event) = event_rx.try_recv() {
            if matches!(event, SweepEvent::StatsReset) {
                saw_reset = true;
            }
        }
        assert!(saw_reset);

        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(RunnerCommand::QueryStats { response: tx })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap().round, 1);

        drop(cmd_tx);
        task.await.unwrap();
    }
}
