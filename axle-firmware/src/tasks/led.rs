//! Status LED heartbeat

use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

/// Heartbeat half-period
const BLINK_MS: u64 = 500;

#[embassy_executor::task]
pub async fn led_task(mut led: Output<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(BLINK_MS));
    loop {
        ticker.next().await;
        led.toggle();
    }
}
