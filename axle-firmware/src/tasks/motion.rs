//! Motion control task
//!
//! Sole owner of the motion controller, the axis configuration, and the
//! safety monitor. Dispatches host commands between ticks and advances the
//! axis state machine at a 1 ms cadence. Never blocks on I/O; everything
//! it waits on is the tick itself.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use axle_core::config::AxisConfig;
use axle_core::controller::{MotionConfig, MotionController, DEFAULT_MOTION_CONFIG};
use axle_core::dispatch::{self, CommandContext, SystemAction};
use axle_core::safety::SafetyMonitor;
use axle_drivers::{PwmStepper, StepDirDriver};
use axle_hal_rp2040::RpPwmTimer;
use axle_protocol::FrameError;

use embassy_rp::gpio::Output;
use embassy_time::Delay;

use crate::channels::{
    CommEvent, ConfigOp, StatusSnapshot, COMMAND_CHANNEL, CONFIG_OPS, RESPONSE_CHANNEL,
    SAFETY_INPUTS, STATUS_WATCH, TEMP_READING,
};

/// Motion tick period
pub const MOTION_TICK_US: u32 = 1_000;

/// Concrete driver type for this board
pub type AxisDriver = StepDirDriver<Output<'static>, Output<'static>, Output<'static>, Delay>;

/// Concrete pulse generator type for this board
pub type AxisStepper = PwmStepper<RpPwmTimer<'static>>;

/// Concrete controller type
pub type AxisController = MotionController<AxisDriver, AxisStepper>;

/// Motion configuration derived from the persisted parameter table
pub fn motion_config_from(config: &AxisConfig) -> MotionConfig {
    MotionConfig {
        default_velocity: DEFAULT_MOTION_CONFIG.default_velocity.min(config.max_velocity),
        default_acceleration: DEFAULT_MOTION_CONFIG
            .default_acceleration
            .min(config.max_acceleration),
        ..DEFAULT_MOTION_CONFIG
    }
}

#[embassy_executor::task]
pub async fn motion_task(mut controller: AxisController, mut config: AxisConfig) {
    info!("Motion task started");

    let mut safety = SafetyMonitor::new();
    let mut streaming = false;
    let mut temperature_decic: i16 = 0;

    let status_tx = STATUS_WATCH.sender();
    let mut ticker = Ticker::every(Duration::from_micros(MOTION_TICK_US as u64));
    let mut last_tick = Instant::now();
    let mut ms_remainder: u32 = 0;

    loop {
        ticker.next().await;

        let now = Instant::now();
        let dt_us = (now - last_tick).as_micros() as u32;
        last_tick = now;

        // Safety inputs latched by the safety task
        if let Some(inputs) = SAFETY_INPUTS.try_take() {
            safety.update_estop(inputs.estop);
            safety.update_limit(inputs.limit);
            safety.update_over_current(inputs.over_current);
        }
        if let Some(reading) = TEMP_READING.try_take() {
            safety.update_temperature(reading);
            if let Some(t) = reading {
                temperature_decic = t;
            }
        }

        // Host-link inactivity clock runs in milliseconds
        ms_remainder += dt_us;
        safety.update_time(ms_remainder / 1_000);
        ms_remainder %= 1_000;

        if let Some(kind) = safety.check() {
            warn!("Fault latched: {:?}", kind);
            controller.latch_fault();
        }

        // Drain pending host commands before advancing the axis
        while let Ok(event) = COMMAND_CHANNEL.try_receive() {
            handle_event(
                event,
                &mut controller,
                &mut config,
                &mut safety,
                &mut streaming,
                temperature_decic,
            );
        }

        controller.tick(dt_us);

        let status = controller.status();
        let velocity = (status.current_velocity / 10).min(i16::MAX as u32) as i32
            * controller.direction().sign();
        status_tx.send(StatusSnapshot {
            state: status.state.code(),
            position: status.current_position,
            velocity: velocity as i16,
            error_flags: safety.flags().bits(),
            streaming,
        });
    }
}

fn handle_event(
    event: CommEvent,
    controller: &mut AxisController,
    config: &mut AxisConfig,
    safety: &mut SafetyMonitor,
    streaming: &mut bool,
    temperature_decic: i16,
) {
    match event {
        CommEvent::Frame(frame) => {
            trace!("Dispatching frame id={=u8:#x}", frame.id);
            let mut ctx = CommandContext {
                controller,
                config,
                safety,
                streaming,
                temperature_decic,
            };
            let outcome = dispatch::dispatch_frame(&frame, &mut ctx);

            if RESPONSE_CHANNEL.try_send(outcome.response).is_err() {
                warn!("Response queue full, dropping response");
            }

            if let Some(action) = outcome.action {
                let op = match action {
                    SystemAction::SaveConfig | SystemAction::ResetConfig => {
                        ConfigOp::Save(config.encode_block())
                    }
                    SystemAction::LoadConfig => ConfigOp::Load,
                    SystemAction::ResetMcu => ConfigOp::ResetMcu,
                };
                if CONFIG_OPS.try_send(op).is_err() {
                    warn!("Config operation queue full");
                }
            }
        }
        CommEvent::LinkError => {
            let response = dispatch::link_error_response(safety, FrameError::Crc);
            let _ = RESPONSE_CHANNEL.try_send(response);
        }
        CommEvent::ApplyConfig(new_config) => {
            info!("Applying configuration loaded from flash");
            *config = new_config;
            let motion = motion_config_from(config);
            controller.set_max_velocity(motion.default_velocity);
            controller.set_acceleration(motion.default_acceleration);
        }
    }
}
