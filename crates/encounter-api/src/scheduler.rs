//! Background tasks: the startup orphan sweep and the periodic scan.

use std::time::Duration;

use encounter_quest::application::context::EncounterContext;
use encounter_quest::application::proximity::run_scan;
use encounter_quest::application::reaper::{SweepReport, sweep};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Waits `delay`, then runs one orphan sweep. A failed sweep is logged and
/// not retried.
pub async fn sweep_after(ctx: EncounterContext, delay: Duration) -> Option<SweepReport> {
    tokio::time::sleep(delay).await;
    match sweep(&ctx).await {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(%err, "orphan sweep aborted");
            None
        }
    }
}

/// Runs the proximity scan every `period` until the task is dropped.
pub async fn scan_loop(ctx: EncounterContext, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match run_scan(&ctx).await {
            Ok(report) if !report.triggered.is_empty() || !report.spawned.is_empty() => {
                debug!(?report, "scan changed encounters");
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "proximity scan failed"),
        }
    }
}

/// Handles of the spawned background tasks.
#[derive(Debug)]
pub struct Background {
    /// The one-shot startup sweep.
    pub sweep: JoinHandle<Option<SweepReport>>,
    /// The scan loop.
    pub scan: JoinHandle<()>,
}

/// Spawns the startup sweep and the scan loop with the configured timings.
pub fn spawn_background(ctx: &EncounterContext) -> Background {
    let sweep_delay = ctx.config.reaper_delay();
    let scan_period = ctx.config.scan_interval();
    info!(
        sweep_delay_ms = sweep_delay.as_millis(),
        scan_period_ms = scan_period.as_millis(),
        "starting background tasks"
    );
    Background {
        sweep: tokio::spawn(sweep_after(ctx.clone(), sweep_delay)),
        scan: tokio::spawn(scan_loop(ctx.clone(), scan_period)),
    }
}
