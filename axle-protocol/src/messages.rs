//! Message types for the Axle host protocol
//!
//! Message ids are partitioned by range:
//! - `0x00-0x0F` system (ping, version, reset, status, node management)
//! - `0x10-0x2F` motion (move, stop, home, jog)
//! - `0x30-0x3F` configuration (parameters, persistence)
//! - `0x40-0x4F` telemetry (position, velocity, temperature, error)
//! - `0x80-0xFF` responses: `0x80 | request_id`

use heapless::Vec;

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

// Message ids: system (0x00-0x0F)
pub const MSG_PING: u8 = 0x00;
pub const MSG_VERSION: u8 = 0x01;
pub const MSG_RESET: u8 = 0x02;
pub const MSG_STATUS: u8 = 0x03;
pub const MSG_NODE_INFO: u8 = 0x04;
pub const MSG_SET_NODE_ID: u8 = 0x05;

// Message ids: motion (0x10-0x2F)
pub const MSG_MOVE_TO: u8 = 0x10;
pub const MSG_MOVE_VELOCITY: u8 = 0x11;
pub const MSG_STOP: u8 = 0x12;
pub const MSG_HOME: u8 = 0x13;
pub const MSG_SET_POSITION: u8 = 0x14;
pub const MSG_JOG: u8 = 0x15;
pub const MSG_SYNC_MOVE: u8 = 0x16;

// Message ids: configuration (0x30-0x3F)
pub const MSG_GET_PARAM: u8 = 0x30;
pub const MSG_SET_PARAM: u8 = 0x31;
pub const MSG_SAVE_CONFIG: u8 = 0x32;
pub const MSG_LOAD_CONFIG: u8 = 0x33;
pub const MSG_RESET_CONFIG: u8 = 0x34;

// Message ids: telemetry (0x40-0x4F)
pub const MSG_GET_POSITION: u8 = 0x40;
pub const MSG_GET_VELOCITY: u8 = 0x41;
pub const MSG_GET_TEMP: u8 = 0x42;
pub const MSG_GET_ERROR: u8 = 0x43;
pub const MSG_STREAM_START: u8 = 0x44;
pub const MSG_STREAM_STOP: u8 = 0x45;

/// Response id bit: a response to request `id` carries `RESPONSE_BIT | id`
pub const RESPONSE_BIT: u8 = 0x80;

/// Status byte leading every response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseStatus {
    /// Command successful
    Ok = 0x00,
    /// CRC check failed
    CrcErr = 0x01,
    /// Unknown command id
    UnknownCmd = 0x02,
    /// Invalid parameter id or value
    BadParam = 0x03,
    /// Device busy with another motion
    Busy = 0x04,
    /// Fault condition active
    Fault = 0x05,
}

impl ResponseStatus {
    /// Parse a status byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ResponseStatus::Ok),
            0x01 => Some(ResponseStatus::CrcErr),
            0x02 => Some(ResponseStatus::UnknownCmd),
            0x03 => Some(ResponseStatus::BadParam),
            0x04 => Some(ResponseStatus::Busy),
            0x05 => Some(ResponseStatus::Fault),
            _ => None,
        }
    }
}

/// Wire type of a configuration parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamType {
    U8,
    U16,
    U32,
    F32,
}

impl ParamType {
    /// Encoded width in bytes
    pub fn width(self) -> usize {
        match self {
            ParamType::U8 => 1,
            ParamType::U16 => 2,
            ParamType::U32 | ParamType::F32 => 4,
        }
    }
}

/// Parameter ids for get/set parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamId {
    /// Steps per revolution (u16)
    StepsPerRev = 0x00,
    /// Microstepping divisor (u8)
    Microsteps = 0x01,
    /// Maximum velocity, steps/s (u32)
    MaxVelocity = 0x02,
    /// Maximum acceleration, steps/s² (u32)
    MaxAccel = 0x03,
    /// Run current index, 0-31 (u8)
    RunCurrent = 0x04,
    /// Hold current index, 0-31 (u8)
    HoldCurrent = 0x05,
    /// Position PID proportional gain (f32)
    PidKp = 0x10,
    /// Position PID integral gain (f32)
    PidKi = 0x11,
    /// Position PID derivative gain (f32)
    PidKd = 0x12,
    /// Encoder counts per revolution (u16)
    EncoderCpr = 0x20,
    /// Node id (u8)
    NodeId = 0x30,
}

impl ParamId {
    /// Parse a parameter id byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ParamId::StepsPerRev),
            0x01 => Some(ParamId::Microsteps),
            0x02 => Some(ParamId::MaxVelocity),
            0x03 => Some(ParamId::MaxAccel),
            0x04 => Some(ParamId::RunCurrent),
            0x05 => Some(ParamId::HoldCurrent),
            0x10 => Some(ParamId::PidKp),
            0x11 => Some(ParamId::PidKi),
            0x12 => Some(ParamId::PidKd),
            0x20 => Some(ParamId::EncoderCpr),
            0x30 => Some(ParamId::NodeId),
            _ => None,
        }
    }

    /// Wire type for this parameter
    pub fn param_type(self) -> ParamType {
        match self {
            ParamId::Microsteps
            | ParamId::RunCurrent
            | ParamId::HoldCurrent
            | ParamId::NodeId => ParamType::U8,
            ParamId::StepsPerRev | ParamId::EncoderCpr => ParamType::U16,
            ParamId::MaxVelocity | ParamId::MaxAccel => ParamType::U32,
            ParamId::PidKp | ParamId::PidKi | ParamId::PidKd => ParamType::F32,
        }
    }
}

/// A typed parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamValue {
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
}

impl ParamValue {
    /// Wire type of this value
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::U8(_) => ParamType::U8,
            ParamValue::U16(_) => ParamType::U16,
            ParamValue::U32(_) => ParamType::U32,
            ParamValue::F32(_) => ParamType::F32,
        }
    }

    /// Decode a value of the given type from little-endian bytes
    pub fn decode(ty: ParamType, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ty.width() {
            return None;
        }
        Some(match ty {
            ParamType::U8 => ParamValue::U8(bytes[0]),
            ParamType::U16 => ParamValue::U16(u16::from_le_bytes([bytes[0], bytes[1]])),
            ParamType::U32 => {
                ParamValue::U32(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            ParamType::F32 => {
                ParamValue::F32(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        })
    }

    /// Append the little-endian encoding of this value to `out`
    pub fn encode<const N: usize>(&self, out: &mut Vec<u8, N>) -> Result<(), ()> {
        let result = match self {
            ParamValue::U8(v) => out.push(*v).map(|_| ()).map_err(|_| ()),
            ParamValue::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            ParamValue::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ParamValue::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
        };
        result.map_err(|_| ())
    }
}

/// Stop command mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopMode {
    /// Decelerate to a stop using the active profile
    Decelerate = 0,
    /// Stop immediately (emergency stop)
    Immediate = 1,
}

/// Errors from command parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// No command with this message id
    UnknownId,
    /// Payload length or content does not match the command
    BadPayload,
}

/// Commands parsed from host-originated frames
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    Ping,
    Version,
    Reset,
    Status,
    NodeInfo,
    SetNodeId {
        node_id: u8,
    },
    /// Move to absolute position. Velocity is steps/s ÷ 10, acceleration is
    /// steps/s² ÷ 100; zero selects the configured default.
    MoveTo {
        position: i32,
        velocity: u16,
        acceleration: u16,
    },
    /// Constant-velocity move, steps/s ÷ 10. Sign selects direction; zero
    /// stops.
    MoveVelocity {
        velocity: i16,
    },
    Stop {
        mode: StopMode,
    },
    Home {
        direction: u8,
        velocity: u16,
    },
    SetPosition {
        position: i32,
    },
    Jog {
        direction: i8,
        velocity: u16,
    },
    SyncMove,
    GetParam {
        id: ParamId,
    },
    SetParam {
        id: ParamId,
        value: ParamValue,
    },
    SaveConfig,
    LoadConfig,
    ResetConfig,
    GetPosition,
    GetVelocity,
    GetTemperature,
    GetError,
    StreamStart,
    StreamStop,
}

impl HostCommand {
    /// Parse a command from a validated frame
    pub fn from_frame(frame: &Frame) -> Result<Self, MessageError> {
        let p = frame.payload.as_slice();
        match frame.id {
            MSG_PING => Ok(HostCommand::Ping),
            MSG_VERSION => Ok(HostCommand::Version),
            MSG_RESET => Ok(HostCommand::Reset),
            MSG_STATUS => Ok(HostCommand::Status),
            MSG_NODE_INFO => Ok(HostCommand::NodeInfo),
            MSG_SET_NODE_ID => match p {
                [node_id] => Ok(HostCommand::SetNodeId { node_id: *node_id }),
                _ => Err(MessageError::BadPayload),
            },
            MSG_MOVE_TO => {
                if p.len() != 8 {
                    return Err(MessageError::BadPayload);
                }
                Ok(HostCommand::MoveTo {
                    position: i32::from_le_bytes([p[0], p[1], p[2], p[3]]),
                    velocity: u16::from_le_bytes([p[4], p[5]]),
                    acceleration: u16::from_le_bytes([p[6], p[7]]),
                })
            }
            MSG_MOVE_VELOCITY => match p {
                [lo, hi] => Ok(HostCommand::MoveVelocity {
                    velocity: i16::from_le_bytes([*lo, *hi]),
                }),
                _ => Err(MessageError::BadPayload),
            },
            MSG_STOP => match p {
                [0] => Ok(HostCommand::Stop {
                    mode: StopMode::Decelerate,
                }),
                [1] => Ok(HostCommand::Stop {
                    mode: StopMode::Immediate,
                }),
                _ => Err(MessageError::BadPayload),
            },
            MSG_HOME => match p {
                [direction, lo, hi] => Ok(HostCommand::Home {
                    direction: *direction,
                    velocity: u16::from_le_bytes([*lo, *hi]),
                }),
                _ => Err(MessageError::BadPayload),
            },
            MSG_SET_POSITION => {
                if p.len() != 4 {
                    return Err(MessageError::BadPayload);
                }
                Ok(HostCommand::SetPosition {
                    position: i32::from_le_bytes([p[0], p[1], p[2], p[3]]),
                })
            }
            MSG_JOG => match p {
                [direction, lo, hi] => Ok(HostCommand::Jog {
                    direction: *direction as i8,
                    velocity: u16::from_le_bytes([*lo, *hi]),
                }),
                _ => Err(MessageError::BadPayload),
            },
            MSG_SYNC_MOVE => Ok(HostCommand::SyncMove),
            MSG_GET_PARAM => match p {
                [id] => ParamId::from_byte(*id)
                    .map(|id| HostCommand::GetParam { id })
                    .ok_or(MessageError::BadPayload),
                _ => Err(MessageError::BadPayload),
            },
            MSG_SET_PARAM => {
                let (&id_byte, value_bytes) = p.split_first().ok_or(MessageError::BadPayload)?;
                let id = ParamId::from_byte(id_byte).ok_or(MessageError::BadPayload)?;
                let value = ParamValue::decode(id.param_type(), value_bytes)
                    .ok_or(MessageError::BadPayload)?;
                Ok(HostCommand::SetParam { id, value })
            }
            MSG_SAVE_CONFIG => Ok(HostCommand::SaveConfig),
            MSG_LOAD_CONFIG => Ok(HostCommand::LoadConfig),
            MSG_RESET_CONFIG => Ok(HostCommand::ResetConfig),
            MSG_GET_POSITION => Ok(HostCommand::GetPosition),
            MSG_GET_VELOCITY => Ok(HostCommand::GetVelocity),
            MSG_GET_TEMP => Ok(HostCommand::GetTemperature),
            MSG_GET_ERROR => Ok(HostCommand::GetError),
            MSG_STREAM_START => Ok(HostCommand::StreamStart),
            MSG_STREAM_STOP => Ok(HostCommand::StreamStop),
            _ => Err(MessageError::UnknownId),
        }
    }

    /// Encode this command into a frame (host side, and tests)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            HostCommand::Ping => Ok(Frame::empty(MSG_PING)),
            HostCommand::Version => Ok(Frame::empty(MSG_VERSION)),
            HostCommand::Reset => Ok(Frame::empty(MSG_RESET)),
            HostCommand::Status => Ok(Frame::empty(MSG_STATUS)),
            HostCommand::NodeInfo => Ok(Frame::empty(MSG_NODE_INFO)),
            HostCommand::SetNodeId { node_id } => Frame::new(MSG_SET_NODE_ID, &[*node_id]),
            HostCommand::MoveTo {
                position,
                velocity,
                acceleration,
            } => {
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                let _ = payload.extend_from_slice(&position.to_le_bytes());
                let _ = payload.extend_from_slice(&velocity.to_le_bytes());
                let _ = payload.extend_from_slice(&acceleration.to_le_bytes());
                Frame::new(MSG_MOVE_TO, &payload)
            }
            HostCommand::MoveVelocity { velocity } => {
                Frame::new(MSG_MOVE_VELOCITY, &velocity.to_le_bytes())
            }
            HostCommand::Stop { mode } => Frame::new(MSG_STOP, &[*mode as u8]),
            HostCommand::Home {
                direction,
                velocity,
            } => {
                let v = velocity.to_le_bytes();
                Frame::new(MSG_HOME, &[*direction, v[0], v[1]])
            }
            HostCommand::SetPosition { position } => {
                Frame::new(MSG_SET_POSITION, &position.to_le_bytes())
            }
            HostCommand::Jog {
                direction,
                velocity,
            } => {
                let v = velocity.to_le_bytes();
                Frame::new(MSG_JOG, &[*direction as u8, v[0], v[1]])
            }
            HostCommand::SyncMove => Ok(Frame::empty(MSG_SYNC_MOVE)),
            HostCommand::GetParam { id } => Frame::new(MSG_GET_PARAM, &[*id as u8]),
            HostCommand::SetParam { id, value } => {
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                let _ = payload.push(*id as u8);
                value.encode(&mut payload).map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(MSG_SET_PARAM, &payload)
            }
            HostCommand::SaveConfig => Ok(Frame::empty(MSG_SAVE_CONFIG)),
            HostCommand::LoadConfig => Ok(Frame::empty(MSG_LOAD_CONFIG)),
            HostCommand::ResetConfig => Ok(Frame::empty(MSG_RESET_CONFIG)),
            HostCommand::GetPosition => Ok(Frame::empty(MSG_GET_POSITION)),
            HostCommand::GetVelocity => Ok(Frame::empty(MSG_GET_VELOCITY)),
            HostCommand::GetTemperature => Ok(Frame::empty(MSG_GET_TEMP)),
            HostCommand::GetError => Ok(Frame::empty(MSG_GET_ERROR)),
            HostCommand::StreamStart => Ok(Frame::empty(MSG_STREAM_START)),
            HostCommand::StreamStop => Ok(Frame::empty(MSG_STREAM_STOP)),
        }
    }
}

/// Build the response id for a request id
pub fn response_id(request_id: u8) -> u8 {
    RESPONSE_BIT | request_id
}

/// Build a status-only response frame for a request
pub fn status_response(request_id: u8, status: ResponseStatus) -> Frame {
    // A one-byte payload always fits.
    Frame::new(response_id(request_id), &[status as u8]).unwrap_or_else(|_| Frame::empty(response_id(request_id)))
}

/// Position response payload: status, position (i32), velocity (i16, ÷10)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionReport {
    pub status: ResponseStatus,
    pub position: i32,
    pub velocity: i16,
}

impl PositionReport {
    /// Encode into a response frame for `request_id`
    pub fn to_frame(&self, request_id: u8) -> Result<Frame, FrameError> {
        let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
        let _ = payload.push(self.status as u8);
        let _ = payload.extend_from_slice(&self.position.to_le_bytes());
        let _ = payload.extend_from_slice(&self.velocity.to_le_bytes());
        Frame::new(response_id(request_id), &payload)
    }

    /// Parse from a response payload
    pub fn from_payload(p: &[u8]) -> Option<Self> {
        if p.len() != 7 {
            return None;
        }
        Some(Self {
            status: ResponseStatus::from_byte(p[0])?,
            position: i32::from_le_bytes([p[1], p[2], p[3], p[4]]),
            velocity: i16::from_le_bytes([p[5], p[6]]),
        })
    }
}

/// Status response payload: status, axis state, error flags, position,
/// velocity (i16, ÷10)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub status: ResponseStatus,
    pub axis_state: u8,
    pub error_flags: u16,
    pub position: i32,
    pub velocity: i16,
}

impl StatusReport {
    /// Encode into a response frame for `request_id`
    pub fn to_frame(&self, request_id: u8) -> Result<Frame, FrameError> {
        let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
        let _ = payload.push(self.status as u8);
        let _ = payload.push(self.axis_state);
        let _ = payload.extend_from_slice(&self.error_flags.to_le_bytes());
        let _ = payload.extend_from_slice(&self.position.to_le_bytes());
        let _ = payload.extend_from_slice(&self.velocity.to_le_bytes());
        Frame::new(response_id(request_id), &payload)
    }

    /// Parse from a response payload
    pub fn from_payload(p: &[u8]) -> Option<Self> {
        if p.len() != 10 {
            return None;
        }
        Some(Self {
            status: ResponseStatus::from_byte(p[0])?,
            axis_state: p[1],
            error_flags: u16::from_le_bytes([p[2], p[3]]),
            position: i32::from_le_bytes([p[4], p[5], p[6], p[7]]),
            velocity: i16::from_le_bytes([p[8], p[9]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_roundtrip() {
        let frame = HostCommand::Ping.to_frame().unwrap();
        assert_eq!(frame.id, MSG_PING);
        assert!(frame.payload.is_empty());
        assert_eq!(HostCommand::from_frame(&frame), Ok(HostCommand::Ping));
    }

    #[test]
    fn test_move_to_layout() {
        let cmd = HostCommand::MoveTo {
            position: 10_000,
            velocity: 1_000, // 10 000 steps/s
            acceleration: 500,
        };
        let frame = cmd.to_frame().unwrap();
        assert_eq!(frame.id, MSG_MOVE_TO);
        assert_eq!(frame.payload.len(), 8);
        assert_eq!(&frame.payload[..4], &10_000i32.to_le_bytes());
        assert_eq!(&frame.payload[4..6], &1_000u16.to_le_bytes());
        assert_eq!(&frame.payload[6..8], &500u16.to_le_bytes());
        assert_eq!(HostCommand::from_frame(&frame), Ok(cmd));
    }

    #[test]
    fn test_move_to_bad_length() {
        let frame = Frame::new(MSG_MOVE_TO, &[0x01, 0x02]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Err(MessageError::BadPayload)
        );
    }

    #[test]
    fn test_stop_modes() {
        let frame = Frame::new(MSG_STOP, &[0]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Ok(HostCommand::Stop {
                mode: StopMode::Decelerate
            })
        );
        let frame = Frame::new(MSG_STOP, &[1]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Ok(HostCommand::Stop {
                mode: StopMode::Immediate
            })
        );
        let frame = Frame::new(MSG_STOP, &[7]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Err(MessageError::BadPayload)
        );
    }

    #[test]
    fn test_unknown_id() {
        let frame = Frame::empty(0x6E);
        assert_eq!(HostCommand::from_frame(&frame), Err(MessageError::UnknownId));
    }

    #[test]
    fn test_set_param_typed_widths() {
        // u32 parameter takes exactly four value bytes
        let frame = Frame::new(MSG_SET_PARAM, &[0x02, 0x10, 0x27, 0x00, 0x00]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Ok(HostCommand::SetParam {
                id: ParamId::MaxVelocity,
                value: ParamValue::U32(10_000),
            })
        );

        // Wrong width for the declared type is rejected
        let frame = Frame::new(MSG_SET_PARAM, &[0x02, 0x10, 0x27]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Err(MessageError::BadPayload)
        );

        // f32 parameter
        let mut p = heapless::Vec::<u8, 8>::new();
        p.push(0x10).unwrap();
        p.extend_from_slice(&2.5f32.to_le_bytes()).unwrap();
        let frame = Frame::new(MSG_SET_PARAM, &p).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Ok(HostCommand::SetParam {
                id: ParamId::PidKp,
                value: ParamValue::F32(2.5),
            })
        );
    }

    #[test]
    fn test_param_id_types() {
        assert_eq!(ParamId::Microsteps.param_type(), ParamType::U8);
        assert_eq!(ParamId::StepsPerRev.param_type(), ParamType::U16);
        assert_eq!(ParamId::MaxAccel.param_type(), ParamType::U32);
        assert_eq!(ParamId::PidKd.param_type(), ParamType::F32);
        assert_eq!(ParamId::from_byte(0x30), Some(ParamId::NodeId));
        assert_eq!(ParamId::from_byte(0x31), None);
    }

    #[test]
    fn test_response_id() {
        assert_eq!(response_id(MSG_PING), 0x80);
        assert_eq!(response_id(MSG_MOVE_TO), 0x90);
        assert_eq!(response_id(MSG_GET_ERROR), 0xC3);
    }

    #[test]
    fn test_status_response() {
        let frame = status_response(MSG_MOVE_TO, ResponseStatus::Busy);
        assert_eq!(frame.id, 0x90);
        assert_eq!(frame.payload.as_slice(), &[0x04]);
    }

    #[test]
    fn test_position_report_roundtrip() {
        let report = PositionReport {
            status: ResponseStatus::Ok,
            position: -1_234,
            velocity: 250,
        };
        let frame = report.to_frame(MSG_GET_POSITION).unwrap();
        assert_eq!(frame.id, 0xC0);
        assert_eq!(frame.payload.len(), 7);
        assert_eq!(PositionReport::from_payload(&frame.payload), Some(report));
    }

    #[test]
    fn test_status_report_roundtrip() {
        let report = StatusReport {
            status: ResponseStatus::Ok,
            axis_state: 2,
            error_flags: 0x0081,
            position: 99_000,
            velocity: -120,
        };
        let frame = report.to_frame(MSG_STATUS).unwrap();
        assert_eq!(frame.id, 0x83);
        assert_eq!(StatusReport::from_payload(&frame.payload), Some(report));
    }
}
