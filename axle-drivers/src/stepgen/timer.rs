//! Interrupt-timer pulse generator
//!
//! Fallback variant for platforms without a free PWM slice. A periodic
//! hardware timer interrupt raises the step edge and schedules the falling
//! edge one pulse width later. ISR overhead caps this variant at 50 kHz.
//!
//! The ISR shares exactly two things with the owning task: the step
//! counter (task reads) and the stop flag (ISR writes). Both live in
//! [`PulseCounter`] as atomic cells; no locks cross the boundary.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use axle_core::traits::{StepGenState, StepGenerator};

/// Periodic pulse timer capability
///
/// Implementations arm a hardware timer whose interrupt calls
/// [`PulseCounter::on_pulse_start`] and stop it when that returns false.
pub trait PulseTimer {
    /// Arm the periodic interrupt at `period_us`
    fn start(&mut self, period_us: u64) -> bool;

    /// Change the period while armed; takes effect on the next expiry
    fn set_period(&mut self, period_us: u64);

    /// Disarm the timer and drive the step output low
    fn stop(&mut self);
}

/// ISR-shared pulse accounting
///
/// Single writer (the timer ISR) for the counter; the owning task only
/// reads it, so plain load/store ordering suffices.
#[derive(Debug)]
pub struct PulseCounter {
    step_count: AtomicU32,
    target_steps: AtomicU32,
    stopped: AtomicBool,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseCounter {
    /// Create an idle counter
    pub const fn new() -> Self {
        Self {
            step_count: AtomicU32::new(0),
            target_steps: AtomicU32::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// ISR entry at each timer expiry, before the step edge is raised
    ///
    /// Returns false once the target step count has been reached; the ISR
    /// must then stop the hardware timer instead of pulsing.
    pub fn on_pulse_start(&self) -> bool {
        let target = self.target_steps.load(Ordering::Relaxed);
        let count = self.step_count.load(Ordering::Relaxed);

        if target > 0 && count >= target {
            self.stopped.store(true, Ordering::Release);
            return false;
        }

        self.step_count.store(count + 1, Ordering::Relaxed);
        true
    }

    /// Steps emitted since the last reset
    pub fn count(&self) -> u32 {
        self.step_count.load(Ordering::Relaxed)
    }

    /// Reset the step counter
    pub fn reset(&self) {
        self.step_count.store(0, Ordering::Relaxed);
    }

    /// Set the auto-stop target; 0 disables
    pub fn set_target(&self, target: u32) {
        self.target_steps.store(target, Ordering::Relaxed);
        self.stopped.store(false, Ordering::Relaxed);
    }

    /// Whether the ISR has auto-stopped the timer
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Clear the ISR stop flag (on task-side stop/start)
    pub fn clear_stopped(&self) {
        self.stopped.store(false, Ordering::Relaxed);
    }
}

/// Minimum commandable frequency (Hz)
pub const TIMER_MIN_FREQUENCY: u32 = 1;

/// Maximum commandable frequency (Hz); bounded by ISR overhead
pub const TIMER_MAX_FREQUENCY: u32 = 50_000;

/// Interrupt-timer step pulse generator, capped at 50 kHz
pub struct TimerStepper<T> {
    timer: T,
    counter: &'static PulseCounter,
    pulse_width_us: u16,
    frequency_hz: u32,
    running: bool,
    initialized: bool,
}

impl<T: PulseTimer> TimerStepper<T> {
    /// Create a generator over the given timer and its ISR-shared counter
    pub fn new(timer: T, counter: &'static PulseCounter, pulse_width_us: u16) -> Self {
        Self {
            timer,
            counter,
            pulse_width_us,
            frequency_hz: 0,
            running: false,
            initialized: false,
        }
    }

    fn period_us(frequency_hz: u32) -> u64 {
        1_000_000 / frequency_hz as u64
    }
}

impl<T: PulseTimer> StepGenerator for TimerStepper<T> {
    fn init(&mut self) -> bool {
        self.timer.stop();
        self.counter.reset();
        self.counter.clear_stopped();
        self.initialized = true;
        true
    }

    fn start(&mut self) -> bool {
        if !self.initialized || self.frequency_hz == 0 {
            return false;
        }

        self.counter.clear_stopped();
        if !self.timer.start(Self::period_us(self.frequency_hz)) {
            return false;
        }
        self.running = true;
        true
    }

    fn stop(&mut self) {
        if !self.running {
            return;
        }

        self.timer.stop();
        self.counter.clear_stopped();
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running && !self.counter.is_stopped()
    }

    fn state(&self) -> StepGenState {
        if self.is_running() {
            StepGenState::Running
        } else {
            StepGenState::Idle
        }
    }

    fn set_frequency(&mut self, frequency_hz: u32) -> bool {
        if !(TIMER_MIN_FREQUENCY..=TIMER_MAX_FREQUENCY).contains(&frequency_hz) {
            return false;
        }

        self.frequency_hz = frequency_hz;

        if self.running {
            self.timer.set_period(Self::period_us(frequency_hz));
        }
        true
    }

    fn frequency(&self) -> u32 {
        self.frequency_hz
    }

    fn min_frequency(&self) -> u32 {
        TIMER_MIN_FREQUENCY
    }

    fn max_frequency(&self) -> u32 {
        TIMER_MAX_FREQUENCY
    }

    fn step_count(&self) -> u32 {
        self.counter.count()
    }

    fn reset_step_count(&mut self) {
        self.counter.reset();
    }

    fn set_target_steps(&mut self, target_steps: u32) {
        self.counter.set_target(target_steps);
    }

    fn pulse_width_us(&self) -> u16 {
        self.pulse_width_us
    }
}
