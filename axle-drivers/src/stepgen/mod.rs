//! Pulse generator implementations
//!
//! Two variants sit behind the core's `StepGenerator` contract, differing
//! only in their frequency caps:
//!
//! - [`PwmStepper`]: backed by a hardware PWM timer, up to 500 kHz
//! - [`TimerStepper`]: backed by a periodic interrupt timer, up to 50 kHz
//!
//! The hardware itself hides behind the [`PwmTimer`] and [`PulseTimer`]
//! capability traits, implemented per platform in the hal crates and by
//! mocks in tests.

pub mod pwm;
pub mod timer;

pub use pwm::{PwmStepper, PwmTimer};
pub use timer::{PulseCounter, PulseTimer, TimerStepper};
