//! Sensor task
//!
//! Samples the RP2040 on-die temperature sensor and publishes readings in
//! 0.1 °C units. A conversion error is published as a sensor fault.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Ticker};

use crate::channels::TEMP_READING;

/// Sensor sampling period
const SENSOR_PERIOD_MS: u64 = 10;

/// Convert a raw ADC reading of the on-die sensor to 0.1 °C
///
/// T = 27 − (V − 0.706) / 0.001721, with a 12-bit conversion at 3.3 V.
fn convert_temp(raw: u16) -> i16 {
    let v_mv = raw as i32 * 3_300 / 4_096;
    (270 - (v_mv - 706) * 5_811 / 1_000) as i16
}

#[embassy_executor::task]
pub async fn sensor_task(mut adc: Adc<'static, Async>, mut sensor: Channel<'static>) {
    info!("Sensor task started");

    let mut ticker = Ticker::every(Duration::from_millis(SENSOR_PERIOD_MS));

    loop {
        ticker.next().await;

        match adc.read(&mut sensor).await {
            Ok(raw) => TEMP_READING.signal(Some(convert_temp(raw))),
            Err(e) => {
                warn!("ADC read error: {:?}", e);
                TEMP_READING.signal(None);
            }
        }
    }
}
