//! RP2040 peripheral adapters
//!
//! Backs the driver crate's hardware capability traits with RP2040
//! peripherals: a PWM slice for step pulse generation and the last flash
//! sector for the persisted configuration block.

#![no_std]

pub mod flash;
pub mod pwm;

pub use flash::ConfigFlash;
pub use pwm::{calc_pwm_params, RpPwmTimer, SYS_CLK_HZ};
