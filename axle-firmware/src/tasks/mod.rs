//! Firmware tasks
//!
//! Five cooperating periodic tasks plus the LED heartbeat. Scheduling
//! pressure follows the period of each task: safety at 5 ms, motion at
//! 1 ms, sensor at 10 ms, sync and communication event-driven.

pub mod comm;
pub mod led;
pub mod motion;
pub mod safety;
pub mod sensor;
pub mod sync;

pub use comm::{comm_rx_task, comm_tx_task};
pub use led::led_task;
pub use motion::{motion_task, AxisController, AxisDriver, AxisStepper};
pub use safety::safety_task;
pub use sensor::sensor_task;
pub use sync::sync_task;
