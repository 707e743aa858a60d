//! Host command dispatcher
//!
//! Maps validated frames onto controller and configuration operations and
//! builds the response frame. Link and parameter errors answer with the
//! matching status code and never touch motion state; flash and MCU-level
//! operations are returned as actions for the communication task to carry
//! out.

use axle_protocol::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use axle_protocol::messages::{self, status_response, HostCommand, MessageError, StopMode};
use axle_protocol::{ErrorFlags, ParamId, ParamValue, ResponseStatus};
use heapless::Vec;

use crate::config::{AxisConfig, ConfigError, DEFAULT_AXIS_CONFIG};
use crate::controller::{MotionController, MotionError, MotionParams, MoveKind};
use crate::motion::ProfileKind;
use crate::safety::SafetyMonitor;
use crate::traits::{MotorDriver, StepGenerator};
use crate::{VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH};

/// Side effects the communication task must perform after a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemAction {
    /// Persist the configuration block to nonvolatile storage
    SaveConfig,
    /// Reload the configuration block from nonvolatile storage
    LoadConfig,
    /// Persist the restored defaults
    ResetConfig,
    /// Reset the MCU
    ResetMcu,
}

/// Result of dispatching one frame
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Response to send on the link
    pub response: Frame,
    /// Deferred side effect, if any
    pub action: Option<SystemAction>,
}

impl DispatchOutcome {
    fn reply(response: Frame) -> Self {
        Self {
            response,
            action: None,
        }
    }

    fn with_action(response: Frame, action: SystemAction) -> Self {
        Self {
            response,
            action: Some(action),
        }
    }
}

/// Mutable system state the dispatcher operates on
pub struct CommandContext<'a, D: MotorDriver, G: StepGenerator> {
    pub controller: &'a mut MotionController<D, G>,
    pub config: &'a mut AxisConfig,
    pub safety: &'a mut SafetyMonitor,
    /// Telemetry streaming enable
    pub streaming: &'a mut bool,
    /// Latest temperature reading (0.1 °C)
    pub temperature_decic: i16,
}

/// Build the response for a frame that failed link-level validation
///
/// The request id is unrecoverable, so the response carries the bare
/// response bit.
pub fn link_error_response(safety: &mut SafetyMonitor, _error: FrameError) -> Frame {
    safety.record_link_error(ErrorFlags::CRC_FAIL);
    status_response(0x00, ResponseStatus::CrcErr)
}

/// Dispatch one validated frame
pub fn dispatch_frame<D: MotorDriver, G: StepGenerator>(
    frame: &Frame,
    ctx: &mut CommandContext<'_, D, G>,
) -> DispatchOutcome {
    // Any CRC-valid frame proves the host is alive.
    ctx.safety.host_activity();

    let command = match HostCommand::from_frame(frame) {
        Ok(command) => command,
        Err(MessageError::UnknownId) => {
            ctx.safety.record_link_error(ErrorFlags::INVALID_CMD);
            return DispatchOutcome::reply(status_response(frame.id, ResponseStatus::UnknownCmd));
        }
        Err(MessageError::BadPayload) => {
            ctx.safety.record_link_error(ErrorFlags::INVALID_PARAM);
            return DispatchOutcome::reply(status_response(frame.id, ResponseStatus::BadParam));
        }
    };

    let id = frame.id;
    match command {
        HostCommand::Ping => {
            DispatchOutcome::reply(payload_response(id, &[ctx.config.node_id]))
        }
        HostCommand::Version => DispatchOutcome::reply(payload_response(
            id,
            &[VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH],
        )),
        HostCommand::Reset => DispatchOutcome::with_action(
            status_response(id, ResponseStatus::Ok),
            SystemAction::ResetMcu,
        ),
        HostCommand::Status => {
            let status = ctx.controller.status();
            let report = messages::StatusReport {
                status: ResponseStatus::Ok,
                axis_state: status.state.code(),
                error_flags: ctx.safety.flags().bits(),
                position: status.current_position,
                velocity: signed_velocity_div10(ctx),
            };
            DispatchOutcome::reply(
                report
                    .to_frame(id)
                    .unwrap_or_else(|_| status_response(id, ResponseStatus::Ok)),
            )
        }
        HostCommand::NodeInfo => DispatchOutcome::reply(payload_response(
            id,
            &[ctx.config.node_id, VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH],
        )),
        HostCommand::SetNodeId { node_id } => {
            DispatchOutcome::reply(set_param(ctx, id, ParamId::NodeId, ParamValue::U8(node_id)))
        }

        HostCommand::MoveTo {
            position,
            velocity,
            acceleration,
        } => {
            let max_velocity = if velocity == 0 {
                ctx.controller.config().default_velocity
            } else {
                (velocity as u32 * 10).min(ctx.config.max_velocity)
            };
            let accel = if acceleration == 0 {
                ctx.controller.config().default_acceleration
            } else {
                (acceleration as u32 * 100).min(ctx.config.max_acceleration)
            };

            let result = ctx.controller.start_move(&MotionParams {
                target_position: position,
                max_velocity,
                acceleration: accel,
                deceleration: accel,
                jerk: 0,
                profile: ProfileKind::Trapezoidal,
                move_kind: MoveKind::Absolute,
            });
            DispatchOutcome::reply(motion_response(id, result))
        }
        HostCommand::MoveVelocity { velocity } => {
            let scaled = velocity as i32 * 10;
            let limit = ctx.config.max_velocity as i32;
            let clamped = scaled.clamp(-limit, limit);
            DispatchOutcome::reply(motion_response(id, ctx.controller.start_velocity(clamped)))
        }
        HostCommand::Stop { mode } => {
            match mode {
                StopMode::Decelerate => ctx.controller.stop(),
                StopMode::Immediate => ctx.controller.emergency_stop(),
            }
            DispatchOutcome::reply(status_response(id, ResponseStatus::Ok))
        }
        HostCommand::Home { .. } => {
            // Homing is scaffolded but not implemented
            DispatchOutcome::reply(status_response(id, ResponseStatus::BadParam))
        }
        HostCommand::SetPosition { position } => {
            if ctx.controller.is_moving() {
                DispatchOutcome::reply(status_response(id, ResponseStatus::Busy))
            } else {
                ctx.controller.set_position(position);
                DispatchOutcome::reply(status_response(id, ResponseStatus::Ok))
            }
        }
        HostCommand::Jog {
            direction,
            velocity,
        } => {
            if direction == 0 {
                ctx.safety.record_link_error(ErrorFlags::INVALID_PARAM);
                return DispatchOutcome::reply(status_response(id, ResponseStatus::BadParam));
            }
            let scaled =
                (velocity as i32 * 10).min(ctx.config.max_velocity as i32) * i32::from(direction.signum());
            DispatchOutcome::reply(motion_response(id, ctx.controller.start_velocity(scaled)))
        }
        HostCommand::SyncMove => {
            // Multi-axis synchronization is out of scope
            DispatchOutcome::reply(status_response(id, ResponseStatus::BadParam))
        }

        HostCommand::GetParam { id: param_id } => {
            let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
            let _ = payload.push(ResponseStatus::Ok as u8);
            let _ = payload.push(param_id as u8);
            if ctx.config.get(param_id).encode(&mut payload).is_err() {
                return DispatchOutcome::reply(status_response(id, ResponseStatus::BadParam));
            }
            DispatchOutcome::reply(raw_response(id, &payload))
        }
        HostCommand::SetParam {
            id: param_id,
            value,
        } => DispatchOutcome::reply(set_param(ctx, id, param_id, value)),
        HostCommand::SaveConfig => DispatchOutcome::with_action(
            status_response(id, ResponseStatus::Ok),
            SystemAction::SaveConfig,
        ),
        HostCommand::LoadConfig => DispatchOutcome::with_action(
            status_response(id, ResponseStatus::Ok),
            SystemAction::LoadConfig,
        ),
        HostCommand::ResetConfig => {
            *ctx.config = DEFAULT_AXIS_CONFIG;
            apply_motion_limits(ctx);
            DispatchOutcome::with_action(
                status_response(id, ResponseStatus::Ok),
                SystemAction::ResetConfig,
            )
        }

        HostCommand::GetPosition => {
            let report = messages::PositionReport {
                status: ResponseStatus::Ok,
                position: ctx.controller.position(),
                velocity: signed_velocity_div10(ctx),
            };
            DispatchOutcome::reply(
                report
                    .to_frame(id)
                    .unwrap_or_else(|_| status_response(id, ResponseStatus::Ok)),
            )
        }
        HostCommand::GetVelocity => {
            let velocity = signed_velocity_div10(ctx);
            let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
            let _ = payload.push(ResponseStatus::Ok as u8);
            let _ = payload.extend_from_slice(&velocity.to_le_bytes());
            DispatchOutcome::reply(raw_response(id, &payload))
        }
        HostCommand::GetTemperature => {
            let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
            let _ = payload.push(ResponseStatus::Ok as u8);
            let _ = payload.extend_from_slice(&ctx.temperature_decic.to_le_bytes());
            DispatchOutcome::reply(raw_response(id, &payload))
        }
        HostCommand::GetError => {
            let flags = ctx.safety.flags().bits();
            let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
            let _ = payload.push(ResponseStatus::Ok as u8);
            let _ = payload.extend_from_slice(&flags.to_le_bytes());
            DispatchOutcome::reply(raw_response(id, &payload))
        }
        HostCommand::StreamStart => {
            *ctx.streaming = true;
            DispatchOutcome::reply(status_response(id, ResponseStatus::Ok))
        }
        HostCommand::StreamStop => {
            *ctx.streaming = false;
            DispatchOutcome::reply(status_response(id, ResponseStatus::Ok))
        }
    }
}

// Response with [status=Ok, data...] payload
fn payload_response(request_id: u8, data: &[u8]) -> Frame {
    let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
    let _ = payload.push(ResponseStatus::Ok as u8);
    let _ = payload.extend_from_slice(data);
    raw_response(request_id, &payload)
}

fn raw_response(request_id: u8, payload: &[u8]) -> Frame {
    Frame::new(messages::response_id(request_id), payload)
        .unwrap_or_else(|_| status_response(request_id, ResponseStatus::Ok))
}

fn motion_response(request_id: u8, result: Result<(), MotionError>) -> Frame {
    let status = match result {
        Ok(()) => ResponseStatus::Ok,
        Err(MotionError::Busy) => ResponseStatus::Busy,
        Err(MotionError::PlanRejected) | Err(MotionError::Unsupported) => ResponseStatus::BadParam,
        Err(
            MotionError::FaultLatched
            | MotionError::HardwareMissing
            | MotionError::EnableFailed
            | MotionError::FrequencyOutOfRange,
        ) => ResponseStatus::Fault,
    };
    status_response(request_id, status)
}

fn set_param<D: MotorDriver, G: StepGenerator>(
    ctx: &mut CommandContext<'_, D, G>,
    request_id: u8,
    param_id: ParamId,
    value: ParamValue,
) -> Frame {
    match ctx.config.set(param_id, value) {
        Ok(()) => {
            apply_motion_limits(ctx);
            status_response(request_id, ResponseStatus::Ok)
        }
        Err(ConfigError::OutOfRange | ConfigError::WrongType) => {
            ctx.safety.record_link_error(ErrorFlags::INVALID_PARAM);
            status_response(request_id, ResponseStatus::BadParam)
        }
        Err(_) => status_response(request_id, ResponseStatus::BadParam),
    }
}

// Keep the controller defaults in step with the parameter table
fn apply_motion_limits<D: MotorDriver, G: StepGenerator>(ctx: &mut CommandContext<'_, D, G>) {
    let velocity = ctx
        .controller
        .config()
        .default_velocity
        .min(ctx.config.max_velocity);
    let acceleration = ctx
        .controller
        .config()
        .default_acceleration
        .min(ctx.config.max_acceleration);
    ctx.controller.set_max_velocity(velocity);
    ctx.controller.set_acceleration(acceleration);
}

fn signed_velocity_div10<D: MotorDriver, G: StepGenerator>(
    ctx: &CommandContext<'_, D, G>,
) -> i16 {
    let magnitude = (ctx.controller.velocity() / 10).min(i16::MAX as u32) as i32;
    (magnitude * ctx.controller.direction().sign()) as i16
}
