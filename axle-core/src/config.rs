//! Axis configuration and the persisted parameter block
//!
//! The parameter table is addressed by the protocol's parameter ids. The
//! persisted form is a packed little-endian record preceded by a format
//! version and followed by a CRC-16 over everything before it, using the
//! link-layer polynomial. A block whose CRC does not match is rejected.

use axle_protocol::crc16;
use axle_protocol::{ParamId, ParamValue};

/// Persisted block format version
pub const CONFIG_VERSION: u16 = 1;

/// Size of the packed block: version + record + CRC
pub const CONFIG_BLOCK_SIZE: usize = 2 + 28 + 2;

/// Errors from parameter access and block decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Value outside the legal range for the parameter
    OutOfRange,
    /// Value type does not match the parameter
    WrongType,
    /// Persisted block has the wrong size or version
    BadBlock,
    /// Persisted block failed its CRC check
    BadCrc,
}

/// The axis parameter table
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisConfig {
    /// Full steps per motor revolution
    pub steps_per_rev: u16,
    /// Microstepping divisor
    pub microsteps: u8,
    /// Maximum velocity (steps/s)
    pub max_velocity: u32,
    /// Maximum acceleration (steps/s²)
    pub max_acceleration: u32,
    /// Run current index (0-31)
    pub run_current: u8,
    /// Hold current index (0-31)
    pub hold_current: u8,
    /// Position PID gains (reserved for closed-loop operation)
    pub pid_kp: f32,
    pub pid_ki: f32,
    pub pid_kd: f32,
    /// Encoder counts per revolution
    pub encoder_cpr: u16,
    /// Node id on the link
    pub node_id: u8,
}

/// Compile-time defaults; `reset config` restores these
pub const DEFAULT_AXIS_CONFIG: AxisConfig = AxisConfig {
    steps_per_rev: 200,
    microsteps: 16,
    max_velocity: 10_000,
    max_acceleration: 50_000,
    run_current: 16,
    hold_current: 8,
    pid_kp: 1.0,
    pid_ki: 0.0,
    pid_kd: 0.0,
    encoder_cpr: 4_096,
    node_id: 1,
};

impl Default for AxisConfig {
    fn default() -> Self {
        DEFAULT_AXIS_CONFIG
    }
}

impl AxisConfig {
    /// Read a parameter by id
    pub fn get(&self, id: ParamId) -> ParamValue {
        match id {
            ParamId::StepsPerRev => ParamValue::U16(self.steps_per_rev),
            ParamId::Microsteps => ParamValue::U8(self.microsteps),
            ParamId::MaxVelocity => ParamValue::U32(self.max_velocity),
            ParamId::MaxAccel => ParamValue::U32(self.max_acceleration),
            ParamId::RunCurrent => ParamValue::U8(self.run_current),
            ParamId::HoldCurrent => ParamValue::U8(self.hold_current),
            ParamId::PidKp => ParamValue::F32(self.pid_kp),
            ParamId::PidKi => ParamValue::F32(self.pid_ki),
            ParamId::PidKd => ParamValue::F32(self.pid_kd),
            ParamId::EncoderCpr => ParamValue::U16(self.encoder_cpr),
            ParamId::NodeId => ParamValue::U8(self.node_id),
        }
    }

    /// Write a parameter by id, validating type and range
    pub fn set(&mut self, id: ParamId, value: ParamValue) -> Result<(), ConfigError> {
        if value.param_type() != id.param_type() {
            return Err(ConfigError::WrongType);
        }

        match (id, value) {
            (ParamId::StepsPerRev, ParamValue::U16(v)) => {
                if v == 0 {
                    return Err(ConfigError::OutOfRange);
                }
                self.steps_per_rev = v;
            }
            (ParamId::Microsteps, ParamValue::U8(v)) => {
                if !v.is_power_of_two() || v > 128 {
                    return Err(ConfigError::OutOfRange);
                }
                self.microsteps = v;
            }
            (ParamId::MaxVelocity, ParamValue::U32(v)) => {
                if v == 0 || v > 500_000 {
                    return Err(ConfigError::OutOfRange);
                }
                self.max_velocity = v;
            }
            (ParamId::MaxAccel, ParamValue::U32(v)) => {
                if v == 0 {
                    return Err(ConfigError::OutOfRange);
                }
                self.max_acceleration = v;
            }
            (ParamId::RunCurrent, ParamValue::U8(v)) => {
                if v > 31 {
                    return Err(ConfigError::OutOfRange);
                }
                self.run_current = v;
            }
            (ParamId::HoldCurrent, ParamValue::U8(v)) => {
                if v > 31 {
                    return Err(ConfigError::OutOfRange);
                }
                self.hold_current = v;
            }
            (ParamId::PidKp, ParamValue::F32(v)) => self.pid_kp = v,
            (ParamId::PidKi, ParamValue::F32(v)) => self.pid_ki = v,
            (ParamId::PidKd, ParamValue::F32(v)) => self.pid_kd = v,
            (ParamId::EncoderCpr, ParamValue::U16(v)) => {
                if v == 0 {
                    return Err(ConfigError::OutOfRange);
                }
                self.encoder_cpr = v;
            }
            (ParamId::NodeId, ParamValue::U8(v)) => self.node_id = v,
            _ => return Err(ConfigError::WrongType),
        }
        Ok(())
    }

    /// Pack the configuration into the persisted block form
    pub fn encode_block(&self) -> [u8; CONFIG_BLOCK_SIZE] {
        let mut block = [0u8; CONFIG_BLOCK_SIZE];
        block[0..2].copy_from_slice(&CONFIG_VERSION.to_le_bytes());
        block[2..4].copy_from_slice(&self.steps_per_rev.to_le_bytes());
        block[4] = self.microsteps;
        block[5..9].copy_from_slice(&self.max_velocity.to_le_bytes());
        block[9..13].copy_from_slice(&self.max_acceleration.to_le_bytes());
        block[13] = self.run_current;
        block[14] = self.hold_current;
        block[15..19].copy_from_slice(&self.pid_kp.to_le_bytes());
        block[19..23].copy_from_slice(&self.pid_ki.to_le_bytes());
        block[23..27].copy_from_slice(&self.pid_kd.to_le_bytes());
        block[27..29].copy_from_slice(&self.encoder_cpr.to_le_bytes());
        block[29] = self.node_id;

        let crc = crc16::calculate(&block[..CONFIG_BLOCK_SIZE - 2]);
        block[CONFIG_BLOCK_SIZE - 2..].copy_from_slice(&crc.to_le_bytes());
        block
    }

    /// Unpack a persisted block, rejecting size, version, and CRC mismatches
    pub fn decode_block(block: &[u8]) -> Result<Self, ConfigError> {
        if block.len() != CONFIG_BLOCK_SIZE {
            return Err(ConfigError::BadBlock);
        }

        let expected = u16::from_le_bytes([block[CONFIG_BLOCK_SIZE - 2], block[CONFIG_BLOCK_SIZE - 1]]);
        if !crc16::verify(&block[..CONFIG_BLOCK_SIZE - 2], expected) {
            return Err(ConfigError::BadCrc);
        }

        let version = u16::from_le_bytes([block[0], block[1]]);
        if version != CONFIG_VERSION {
            return Err(ConfigError::BadBlock);
        }

        Ok(Self {
            steps_per_rev: u16::from_le_bytes([block[2], block[3]]),
            microsteps: block[4],
            max_velocity: u32::from_le_bytes([block[5], block[6], block[7], block[8]]),
            max_acceleration: u32::from_le_bytes([block[9], block[10], block[11], block[12]]),
            run_current: block[13],
            hold_current: block[14],
            pid_kp: f32::from_le_bytes([block[15], block[16], block[17], block[18]]),
            pid_ki: f32::from_le_bytes([block[19], block[20], block[21], block[22]]),
            pid_kd: f32::from_le_bytes([block[23], block[24], block[25], block[26]]),
            encoder_cpr: u16::from_le_bytes([block[27], block[28]]),
            node_id: block[29],
        })
    }
}
