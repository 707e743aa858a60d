//! PWM-backed pulse generator
//!
//! Uses a hardware PWM timer to emit step pulses with no per-step CPU
//! cost. The frequency programs the PWM period; the pulse width is held
//! near-constant by recomputing the duty cycle at every frequency change.

use axle_core::traits::{StepGenState, StepGenerator};

/// Hardware PWM timer capability
///
/// Implementations program a PWM slice/channel and count emitted pulses
/// (typically from the period-wrap interrupt). The pulse limit is enforced
/// in the same interrupt context, so auto-stop does not depend on task
/// scheduling.
pub trait PwmTimer {
    /// Program the period for `frequency_hz` and the compare value for
    /// `duty_permille` (‰ of the period)
    fn configure(&mut self, frequency_hz: u32, duty_permille: u16);

    /// Start the PWM output
    fn start(&mut self);

    /// Stop the PWM output, leaving the pin low
    fn stop(&mut self);

    /// Whether the output is currently running (false after the hardware
    /// hit its pulse limit)
    fn is_running(&self) -> bool;

    /// Pulses emitted since the last reset
    fn pulse_count(&self) -> u32;

    /// Reset the pulse counter
    fn reset_pulse_count(&mut self);

    /// Stop automatically once `limit` pulses have been emitted; 0 runs
    /// continuously
    fn set_pulse_limit(&mut self, limit: u32);
}

/// Minimum commandable frequency (Hz)
pub const PWM_MIN_FREQUENCY: u32 = 1;

/// Maximum commandable frequency (Hz)
pub const PWM_MAX_FREQUENCY: u32 = 500_000;

/// Duty-cycle floor: 0.1 % keeps the leading edge at very low rates
const MIN_DUTY_PERMILLE: u16 = 1;

/// Duty-cycle ceiling: 50 % caps the pulse width at high rates
const MAX_DUTY_PERMILLE: u16 = 500;

/// PWM-backed step pulse generator, capped at 500 kHz
pub struct PwmStepper<T> {
    timer: T,
    pulse_width_us: u16,
    frequency_hz: u32,
    running: bool,
    initialized: bool,
}

impl<T: PwmTimer> PwmStepper<T> {
    /// Create a generator over the given PWM timer
    pub fn new(timer: T, pulse_width_us: u16) -> Self {
        Self {
            timer,
            pulse_width_us,
            frequency_hz: 0,
            running: false,
            initialized: false,
        }
    }

    /// Duty cycle in per-mille that keeps the configured pulse width,
    /// clamped into [0.1 %, 50 %]
    fn duty_permille(&self, frequency_hz: u32) -> u16 {
        // duty = pulse_width / period = pulse_width_us · f / 10⁶
        let permille = (self.pulse_width_us as u64 * frequency_hz as u64) / 1_000;
        (permille as u16).clamp(MIN_DUTY_PERMILLE, MAX_DUTY_PERMILLE)
    }

    /// Borrow the backing timer
    pub fn timer(&self) -> &T {
        &self.timer
    }
}

impl<T: PwmTimer> StepGenerator for PwmStepper<T> {
    fn init(&mut self) -> bool {
        self.timer.stop();
        self.timer.reset_pulse_count();
        self.initialized = true;
        true
    }

    fn start(&mut self) -> bool {
        if !self.initialized || self.frequency_hz == 0 {
            return false;
        }

        let duty = self.duty_permille(self.frequency_hz);
        self.timer.configure(self.frequency_hz, duty);
        self.timer.start();
        self.running = true;
        true
    }

    fn stop(&mut self) {
        if !self.running {
            return;
        }

        self.timer.stop();
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running && self.timer.is_running()
    }

    fn state(&self) -> StepGenState {
        if self.is_running() {
            StepGenState::Running
        } else {
            StepGenState::Idle
        }
    }

    fn set_frequency(&mut self, frequency_hz: u32) -> bool {
        if !(PWM_MIN_FREQUENCY..=PWM_MAX_FREQUENCY).contains(&frequency_hz) {
            return false;
        }

        self.frequency_hz = frequency_hz;

        if self.running {
            // Takes effect at the next period boundary
            let duty = self.duty_permille(frequency_hz);
            self.timer.configure(frequency_hz, duty);
        }
        true
    }

    fn frequency(&self) -> u32 {
        self.frequency_hz
    }

    fn min_frequency(&self) -> u32 {
        PWM_MIN_FREQUENCY
    }

    fn max_frequency(&self) -> u32 {
        PWM_MAX_FREQUENCY
    }

    fn step_count(&self) -> u32 {
        self.timer.pulse_count()
    }

    fn reset_step_count(&mut self) {
        self.timer.reset_pulse_count();
    }

    fn set_target_steps(&mut self, target_steps: u32) {
        self.timer.set_pulse_limit(target_steps);
    }

    fn pulse_width_us(&self) -> u16 {
        self.pulse_width_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockPwmTimer {
        frequency: u32,
        duty_permille: u16,
        running: bool,
        pulses: u32,
        limit: u32,
        configure_calls: u32,
    }

    impl MockPwmTimer {
        // Simulate the period-wrap interrupt emitting n pulses
        fn emit(&mut self, n: u32) {
            for _ in 0..n {
                if !self.running {
                    break;
                }
                self.pulses += 1;
                if self.limit > 0 && self.pulses >= self.limit {
                    self.running = false;
                }
            }
        }
    }

    impl PwmTimer for MockPwmTimer {
        fn configure(&mut self, frequency_hz: u32, duty_permille: u16) {
            self.frequency = frequency_hz;
            self.duty_permille = duty_permille;
            self.configure_calls += 1;
        }

        fn start(&mut self) {
            self.running = true;
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn pulse_count(&self) -> u32 {
            self.pulses
        }

        fn reset_pulse_count(&mut self) {
            self.pulses = 0;
        }

        fn set_pulse_limit(&mut self, limit: u32) {
            self.limit = limit;
        }
    }

    fn stepper() -> PwmStepper<MockPwmTimer> {
        let mut s = PwmStepper::new(MockPwmTimer::default(), 3);
        s.init();
        s
    }

    #[test]
    fn test_start_requires_init_and_frequency() {
        let mut s = PwmStepper::new(MockPwmTimer::default(), 3);
        assert!(!s.start());

        s.init();
        assert!(!s.start());

        assert!(s.set_frequency(10_000));
        assert!(s.start());
        assert!(s.is_running());
    }

    #[test]
    fn test_frequency_range() {
        let mut s = stepper();
        assert!(!s.set_frequency(0));
        assert!(!s.set_frequency(PWM_MAX_FREQUENCY + 1));
        assert!(s.set_frequency(PWM_MIN_FREQUENCY));
        assert!(s.set_frequency(PWM_MAX_FREQUENCY));
        // Rejected frequencies leave the setting untouched
        assert!(!s.set_frequency(0));
        assert_eq!(s.frequency(), PWM_MAX_FREQUENCY);
    }

    #[test]
    fn test_set_frequency_while_running_reconfigures() {
        let mut s = stepper();
        s.set_frequency(10_000);
        s.start();
        let calls = s.timer().configure_calls;

        s.set_frequency(20_000);
        assert_eq!(s.timer().frequency, 20_000);
        assert!(s.timer().configure_calls > calls);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut s = stepper();
        s.stop();
        assert_eq!(s.state(), StepGenState::Idle);

        s.set_frequency(1_000);
        s.start();
        s.stop();
        s.stop();
        assert!(!s.is_running());
    }

    #[test]
    fn test_duty_clamps_low_and_high() {
        let s = stepper();
        // 3 µs at 100 Hz is 0.03 %: clamps up to the 0.1 % floor
        assert_eq!(s.duty_permille(100), MIN_DUTY_PERMILLE);
        // 3 µs at 10 kHz is exactly 3 %
        assert_eq!(s.duty_permille(10_000), 30);
        // 3 µs at 500 kHz would be 150 %: clamps to the 50 % ceiling
        assert_eq!(s.duty_permille(500_000), MAX_DUTY_PERMILLE);
    }

    #[test]
    fn test_counts_and_auto_stop() {
        let mut s = stepper();
        s.set_frequency(10_000);
        s.set_target_steps(100);
        s.start();

        s.timer.emit(150);
        assert_eq!(s.step_count(), 100);
        assert!(!s.is_running());

        s.stop();
        s.reset_step_count();
        assert_eq!(s.step_count(), 0);
    }

    #[test]
    fn test_continuous_mode_without_target() {
        let mut s = stepper();
        s.set_frequency(10_000);
        s.set_target_steps(0);
        s.start();

        s.timer.emit(10_000);
        assert_eq!(s.step_count(), 10_000);
        assert!(s.is_running());
    }
}
