//! Host link communication tasks
//!
//! The RX task owns the UART receive side and the frame decoder; validated
//! frames go to the motion task through the command queue. The TX task
//! owns the transmit side, the response queue, deferred flash operations,
//! and the telemetry stream.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Duration, Ticker};
use embedded_io_async::{Read, Write};

use axle_core::config::AxisConfig;
use axle_protocol::messages::{PositionReport, MSG_GET_POSITION};
use axle_protocol::{FrameDecoder, ResponseStatus};

use crate::channels::{
    CommEvent, ConfigOp, COMMAND_CHANNEL, CONFIG_OPS, RESPONSE_CHANNEL, STATUS_WATCH,
};
use crate::config_store::ConfigStore;

/// UART receive chunk size
const RX_BUF_SIZE: usize = 64;

/// Telemetry stream period
const STREAM_PERIOD_MS: u64 = 100;

/// Link RX task: bytes in, validated frames out
#[embassy_executor::task]
pub async fn comm_rx_task(mut rx: BufferedUartRx) {
    info!("Comm RX task started");

    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    match decoder.feed(byte) {
                        Ok(Some(frame)) => {
                            if COMMAND_CHANNEL.try_send(CommEvent::Frame(frame)).is_err() {
                                warn!("Command queue full, dropping frame");
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Frame error: {:?}", e);
                            let _ = COMMAND_CHANNEL.try_send(CommEvent::LinkError);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Link TX task: responses, flash operations, telemetry stream
#[embassy_executor::task]
pub async fn comm_tx_task(mut tx: BufferedUartTx, mut store: ConfigStore<'static>) {
    info!("Comm TX task started");

    let mut status_rx = STATUS_WATCH.receiver().unwrap();
    let mut stream_ticker = Ticker::every(Duration::from_millis(STREAM_PERIOD_MS));

    loop {
        match select3(
            RESPONSE_CHANNEL.receive(),
            CONFIG_OPS.receive(),
            stream_ticker.next(),
        )
        .await
        {
            Either3::First(frame) => send_frame(&mut tx, &frame).await,
            Either3::Second(op) => handle_config_op(op, &mut store),
            Either3::Third(()) => {
                let Some(snapshot) = status_rx.try_get() else {
                    continue;
                };
                if !snapshot.streaming {
                    continue;
                }
                let report = PositionReport {
                    status: ResponseStatus::Ok,
                    position: snapshot.position,
                    velocity: snapshot.velocity,
                };
                if let Ok(frame) = report.to_frame(MSG_GET_POSITION) {
                    send_frame(&mut tx, &frame).await;
                }
            }
        }
    }
}

async fn send_frame(tx: &mut BufferedUartTx, frame: &axle_protocol::Frame) {
    match frame.encode_to_vec() {
        Ok(bytes) => {
            if let Err(e) = tx.write_all(&bytes).await {
                warn!("UART write error: {:?}", e);
            }
        }
        Err(e) => {
            warn!("Frame encode error: {:?}", e);
        }
    }
}

fn handle_config_op(op: ConfigOp, store: &mut ConfigStore<'static>) {
    match op {
        ConfigOp::Save(block) => {
            if let Err(e) = store.save(&block) {
                warn!("Config save failed: {:?}", e);
            }
        }
        ConfigOp::Load => match store.load() {
            Ok(config) => {
                let _ = COMMAND_CHANNEL.try_send(CommEvent::ApplyConfig(config));
            }
            Err(e) => {
                warn!("Config load failed: {:?}", e);
                let _ = COMMAND_CHANNEL.try_send(CommEvent::ApplyConfig(AxisConfig::default()));
            }
        },
        ConfigOp::ResetMcu => {
            info!("Host-requested MCU reset");
            cortex_m::peripheral::SCB::sys_reset();
        }
    }
}
