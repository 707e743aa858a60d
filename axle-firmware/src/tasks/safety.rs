//! Safety task
//!
//! Runs at the fastest cadence, feeds the hardware watchdog, and samples
//! the safety inputs (e-stop and limit switch, both active-low). A stuck
//! task anywhere in the system stops the watchdog feed and resets the MCU.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Ticker};

use crate::channels::{SafetyInputs, SAFETY_INPUTS};

/// Safety sampling period (200 Hz)
const SAFETY_PERIOD_MS: u64 = 5;

/// Watchdog timeout
const WATCHDOG_TIMEOUT_MS: u64 = 500;

#[embassy_executor::task]
pub async fn safety_task(mut watchdog: Watchdog, estop: Input<'static>, limit: Input<'static>) {
    info!("Safety task started");

    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));

    let mut ticker = Ticker::every(Duration::from_millis(SAFETY_PERIOD_MS));
    let mut last = SafetyInputs {
        estop: false,
        limit: false,
        over_current: false,
    };

    loop {
        ticker.next().await;
        watchdog.feed();

        let inputs = SafetyInputs {
            estop: estop.is_low(),
            limit: limit.is_low(),
            over_current: false,
        };

        if inputs.estop && !last.estop {
            warn!("Emergency stop input asserted");
        }
        if inputs.limit && !last.limit {
            warn!("Limit switch hit");
        }

        SAFETY_INPUTS.signal(inputs);
        last = inputs;
    }
}
