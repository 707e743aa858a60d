//! Hardware abstraction traits
//!
//! The motion controller drives two collaborators through these contracts:
//! a motor driver (enable/direction/position authority) and a pulse
//! generator (step frequency). Concrete implementations live in the driver
//! crates.

pub mod driver;
pub mod stepgen;

pub use driver::{Direction, DriverConfig, DriverState, MotorDriver};
pub use stepgen::{StepGenState, StepGenerator};
