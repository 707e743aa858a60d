//! Hardware collaborators for the Axle motion core
//!
//! Implements the core's driver and pulse-generator contracts against
//! small hardware capability traits, so the same logic runs on real
//! peripherals and in host tests:
//!
//! - [`StepDirDriver`]: discrete step/dir/enable driver over
//!   `embedded-hal` output pins
//! - [`PwmStepper`]: hardware-PWM pulse generator, capped at 500 kHz
//! - [`TimerStepper`]: interrupt-timer pulse generator, capped at 50 kHz

#![no_std]
#![deny(unsafe_code)]

pub mod stepdir;
pub mod stepgen;

pub use stepdir::StepDirDriver;
pub use stepgen::{PulseCounter, PulseTimer, PwmStepper, PwmTimer, TimerStepper};
