//! Inter-task communication channels
//!
//! The cross-task surface is deliberately small: a command queue from the
//! link into the motion task, a status snapshot from the motion task out to
//! the link, and the safety inputs that latch faults into the axis. The
//! response queue and config-operation queue stay within the communication
//! side.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_sync::watch::Watch;

use axle_core::config::{AxisConfig, CONFIG_BLOCK_SIZE};
use axle_protocol::Frame;

/// Command queue depth
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Response queue depth
const RESPONSE_CHANNEL_SIZE: usize = 8;

/// Events delivered to the motion task
#[derive(Debug)]
pub enum CommEvent {
    /// A validated frame from the host
    Frame(Frame),
    /// A frame failed link-level validation
    LinkError,
    /// A configuration block loaded from flash
    ApplyConfig(AxisConfig),
}

/// Deferred operations carried out on the communication side
#[derive(Debug, Clone, Copy)]
pub enum ConfigOp {
    /// Write this block to flash
    Save([u8; CONFIG_BLOCK_SIZE]),
    /// Read the block from flash and apply it
    Load,
    /// Reset the MCU
    ResetMcu,
}

/// Axis status snapshot published every motion tick
#[derive(Debug, Clone, Copy, defmt::Format)]
pub struct StatusSnapshot {
    /// Axis state wire code
    pub state: u8,
    /// Current position (steps)
    pub position: i32,
    /// Signed velocity, steps/s ÷ 10
    pub velocity: i16,
    /// Sticky error word
    pub error_flags: u16,
    /// Telemetry streaming enabled
    pub streaming: bool,
}

/// Safety inputs sampled by the safety task
#[derive(Debug, Clone, Copy, defmt::Format)]
pub struct SafetyInputs {
    pub estop: bool,
    pub limit: bool,
    pub over_current: bool,
}

/// Host frames and link events (communication → motion)
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, CommEvent, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Response frames to transmit (motion → communication)
pub static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, Frame, RESPONSE_CHANNEL_SIZE> =
    Channel::new();

/// Flash and system operations (motion → communication)
pub static CONFIG_OPS: Channel<CriticalSectionRawMutex, ConfigOp, 2> = Channel::new();

/// Latest axis status (motion → communication)
pub static STATUS_WATCH: Watch<CriticalSectionRawMutex, StatusSnapshot, 2> = Watch::new();

/// Latched safety inputs (safety → motion)
pub static SAFETY_INPUTS: Signal<CriticalSectionRawMutex, SafetyInputs> = Signal::new();

/// Temperature reading in 0.1 °C, None on sensor fault (sensor → motion)
pub static TEMP_READING: Signal<CriticalSectionRawMutex, Option<i16>> = Signal::new();
