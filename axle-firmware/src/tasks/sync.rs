//! Multi-controller synchronization task
//!
//! Reserved slot in the schedule for synchronized multi-axis starts. The
//! sync-move protocol is not implemented; the dispatcher rejects the
//! command and this task only idles at its period.

use defmt::*;
use embassy_time::{Duration, Ticker};

/// Sync service period
const SYNC_PERIOD_MS: u64 = 1_000;

#[embassy_executor::task]
pub async fn sync_task() {
    info!("Sync task started (idle)");

    let mut ticker = Ticker::every(Duration::from_millis(SYNC_PERIOD_MS));
    loop {
        ticker.next().await;
        trace!("Sync idle");
    }
}
