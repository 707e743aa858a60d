//! Pulse generator trait
//!
//! The pulse generator emits step pulses at a commanded frequency and
//! counts them. It is deliberately not responsible for direction or enable
//! control (driver's job) or for acceleration ramps (controller's job).

/// Pulse generator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepGenState {
    /// Not generating steps
    Idle,
    /// Actively generating step pulses
    Running,
    /// Ramping down to a stop
    Stopping,
}

/// Trait for step pulse generators
///
/// Two hardware variants implement this contract: a PWM-backed generator
/// capped at 500 kHz and an interrupt-timer generator capped at 50 kHz.
/// The frequency caps are the only externally visible difference.
pub trait StepGenerator {
    /// Initialize the generator hardware
    ///
    /// Must be called before `start`. May be called again to reinitialize.
    fn init(&mut self) -> bool;

    /// Start generating step pulses
    ///
    /// Fails unless initialized and a non-zero frequency has been set.
    fn start(&mut self) -> bool;

    /// Stop generating pulses immediately, leaving the output low
    ///
    /// Idempotent: stopping while idle is a no-op.
    fn stop(&mut self);

    /// Check if currently generating steps
    fn is_running(&self) -> bool;

    /// Get the current state
    fn state(&self) -> StepGenState;

    /// Set the step frequency in Hz
    ///
    /// Fails without side effect for zero or out-of-range frequencies.
    /// While running, the period adjusts on the next pulse boundary.
    fn set_frequency(&mut self, frequency_hz: u32) -> bool;

    /// Get the current frequency setting in Hz
    fn frequency(&self) -> u32;

    /// Minimum supported frequency in Hz
    fn min_frequency(&self) -> u32;

    /// Maximum supported frequency in Hz
    fn max_frequency(&self) -> u32;

    /// Steps emitted since the last counter reset
    fn step_count(&self) -> u32;

    /// Reset the step counter to zero
    fn reset_step_count(&mut self);

    /// Set a target step count for auto-stop
    ///
    /// Generation stops once the counter reaches the target. Zero disables
    /// auto-stop (continuous mode).
    fn set_target_steps(&mut self, target_steps: u32);

    /// Step pulse width in microseconds
    fn pulse_width_us(&self) -> u16;
}
