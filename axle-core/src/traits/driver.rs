//! Motor driver trait
//!
//! Abstracts over step/dir/enable driver hardware (discrete GPIO drivers,
//! UART-configured driver ICs). The driver owns direction and enable
//! control and is the position authority for the axis: its software step
//! counter is what the motion controller reads back every tick.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motion direction along the axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Positive step count
    #[default]
    Forward,
    /// Negative step count
    Reverse,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Sign multiplier for position arithmetic
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Direction of a signed distance (zero counts as forward)
    pub fn from_distance(distance: i32) -> Self {
        if distance >= 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }
}

/// Driver operational state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Outputs disabled, motor free
    Disabled,
    /// Outputs enabled, ready to step
    Enabled,
    /// Driver fault condition
    Fault,
}

/// Step timing and pin polarity configuration
///
/// Immutable for the lifetime of a driver instance.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// Step pulse width in microseconds (typ. 2-5)
    pub step_pulse_us: u16,
    /// Direction setup time before the next step (typ. 5-20)
    pub dir_setup_us: u16,
    /// Delay after enable before stepping is allowed (typ. 5-10)
    pub enable_delay_ms: u16,
    /// Enable pin is active-low (typical for driver ICs)
    pub enable_active_low: bool,
    /// Invert the direction pin logic
    pub dir_invert: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step_pulse_us: 3,
            dir_setup_us: 10,
            enable_delay_ms: 5,
            enable_active_low: true,
            dir_invert: false,
        }
    }
}

/// Trait for stepper motor drivers
///
/// Implementations provide enable, direction, single-step, and position
/// tracking while abstracting the underlying hardware interface.
pub trait MotorDriver {
    /// Enable the driver outputs
    ///
    /// Returns false if the driver is in fault or enabling failed.
    fn enable(&mut self) -> bool;

    /// Disable the driver outputs; the motor is free to rotate
    fn disable(&mut self);

    /// Check if the driver is enabled and ready to step
    fn is_enabled(&self) -> bool;

    /// Get the current driver state
    fn state(&self) -> DriverState;

    /// Set the motion direction
    ///
    /// Takes effect on the next step pulse, after the configured direction
    /// setup time.
    fn set_direction(&mut self, dir: Direction);

    /// Get the current direction setting
    fn direction(&self) -> Direction;

    /// Generate a single blocking step pulse
    ///
    /// Returns false if the driver is not enabled.
    fn step(&mut self) -> bool;

    /// Generate `count` step pulses at `steps_per_second` (blocking)
    ///
    /// Returns the number of steps actually generated.
    fn step_multiple(&mut self, count: u32, steps_per_second: u32) -> u32;

    /// Current signed step position
    fn position(&self) -> i32;

    /// Set the current position value (homing / synchronization)
    fn set_position(&mut self, position: i32);

    /// Reset position to zero
    fn reset_position(&mut self) {
        self.set_position(0);
    }

    /// Check for a fault condition
    fn is_fault(&self) -> bool;

    /// Attempt to clear a fault; returns false if the fault persists
    fn clear_fault(&mut self) -> bool;

    /// Driver-specific fault code (0 = no fault)
    fn fault_code(&self) -> u8;
}
