//! PWM slice adapter for step pulse generation
//!
//! One PWM slice generates the step pulses: the slice period sets the step
//! frequency and the compare value sets the pulse width. The 8.4
//! fixed-point clock divider extends the reachable range down to ~0.5 Hz.

use core::cell::Cell;

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::Instant;
use fixed::FixedU16;

use axle_drivers::PwmTimer;

/// System clock frequency (RP2040 default)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// Compute the clock divider (×16, for the 8.4 fixed-point field) and the
/// wrap value for a target step frequency.
///
/// `freq = SYS_CLK / (divider · (top + 1))`; the smallest divider that
/// brings `top` into range maximizes period resolution.
pub fn calc_pwm_params(freq_hz: u32) -> (u16, u16) {
    if freq_hz == 0 {
        return (16, u16::MAX);
    }

    let clk_x16 = SYS_CLK_HZ as u64 * 16;
    let span = freq_hz as u64 * 65_536;

    let mut div_x16 = clk_x16.div_ceil(span);
    if div_x16 < 16 {
        div_x16 = 16; // divider floor is 1.0
    }
    if div_x16 > 0xFFF {
        div_x16 = 0xFFF; // 8.4 field maximum (255.9375)
    }

    let top = (clk_x16 / (div_x16 * freq_hz as u64)).clamp(1, 65_536) as u32 - 1;
    (div_x16 as u16, top as u16)
}

/// Compare value for a duty cycle in per-mille of the period
pub fn duty_to_compare(top: u16, duty_permille: u16) -> u16 {
    let compare = (top as u32 + 1) * duty_permille as u32 / 1_000;
    compare.max(1) as u16
}

/// PWM slice backing for the 500 kHz pulse generator
///
/// The pulse count is derived from elapsed time at the programmed
/// frequency, the same accounting the slice itself would report from wrap
/// events. The pulse limit is enforced on the task-side poll: `is_running`
/// goes false as soon as the estimate crosses the limit, and the slice is
/// disabled on the next mutable access.
pub struct RpPwmTimer<'d> {
    pwm: Pwm<'d>,
    frequency_hz: u32,
    duty_permille: u16,
    /// Pulses accumulated before the last reconfigure/stop
    base_count: u32,
    started_at: Option<Instant>,
    limit: u32,
    /// Deferred disable after the limit was observed crossed
    limit_hit: Cell<bool>,
}

impl<'d> RpPwmTimer<'d> {
    /// Wrap a configured PWM slice (output A is the step pin)
    pub fn new(pwm: Pwm<'d>) -> Self {
        Self {
            pwm,
            frequency_hz: 0,
            duty_permille: 1,
            base_count: 0,
            started_at: None,
            limit: 0,
            limit_hit: Cell::new(false),
        }
    }

    fn live_count(&self) -> u32 {
        let Some(started) = self.started_at else {
            return self.base_count;
        };
        let elapsed_us = started.elapsed().as_micros();
        let live = (self.frequency_hz as u64 * elapsed_us) / 1_000_000;
        let total = self.base_count.saturating_add(live as u32);

        if self.limit > 0 && total >= self.limit {
            self.limit_hit.set(true);
            return self.limit;
        }
        total
    }

    fn accumulate(&mut self) {
        self.base_count = self.live_count();
        self.started_at = None;
    }

    fn apply(&mut self, enable: bool) {
        let (div_x16, top) = calc_pwm_params(self.frequency_hz);

        let mut config = PwmConfig::default();
        config.divider = FixedU16::from_bits(div_x16);
        config.top = top;
        config.compare_a = duty_to_compare(top, self.duty_permille);
        config.enable = enable;
        self.pwm.set_config(&config);
    }
}

impl PwmTimer for RpPwmTimer<'_> {
    fn configure(&mut self, frequency_hz: u32, duty_permille: u16) {
        let was_running = self.started_at.is_some();
        self.accumulate();

        self.frequency_hz = frequency_hz;
        self.duty_permille = duty_permille;

        if self.limit_hit.take() {
            self.apply(false);
            return;
        }

        self.apply(was_running);
        if was_running {
            self.started_at = Some(Instant::now());
        }
    }

    fn start(&mut self) {
        self.limit_hit.set(false);
        self.apply(true);
        self.started_at = Some(Instant::now());
    }

    fn stop(&mut self) {
        self.accumulate();
        self.limit_hit.set(false);
        self.apply(false);
        self.pwm.set_counter(0);
    }

    fn is_running(&self) -> bool {
        if self.started_at.is_none() {
            return false;
        }
        // Refreshes the limit estimate as a side effect
        let _ = self.live_count();
        !self.limit_hit.get()
    }

    fn pulse_count(&self) -> u32 {
        self.live_count()
    }

    fn reset_pulse_count(&mut self) {
        self.base_count = 0;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn set_pulse_limit(&mut self, limit: u32) {
        let was_running = self.started_at.is_some();
        self.accumulate();
        self.limit = limit;
        self.limit_hit.set(false);
        if was_running {
            self.started_at = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divider_and_top_for_common_rates() {
        // 1 kHz: divider 31/16 = 1.9375, top ≈ 64515
        let (div, top) = calc_pwm_params(1_000);
        assert_eq!(div, 31);
        assert_eq!(top, 64_515);

        // 500 kHz: divider floor, top = 249
        let (div, top) = calc_pwm_params(500_000);
        assert_eq!(div, 16);
        assert_eq!(top, 249);
    }

    #[test]
    fn test_realized_frequency_error_is_small() {
        for freq in [10u32, 100, 1_000, 10_000, 50_000, 250_000, 500_000] {
            let (div_x16, top) = calc_pwm_params(freq);
            let realized = SYS_CLK_HZ as u64 * 16 / (div_x16 as u64 * (top as u64 + 1));
            let error = realized.abs_diff(freq as u64);
            // Within 0.2% of the requested rate
            assert!(error * 500 <= freq as u64, "freq {} realized {}", freq, realized);
        }
    }

    #[test]
    fn test_duty_compare() {
        assert_eq!(duty_to_compare(999, 500), 500);
        // Floor keeps at least one count high
        assert_eq!(duty_to_compare(100, 1), 1);
    }
}
