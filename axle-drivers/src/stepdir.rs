//! Generic step/dir/enable motor driver
//!
//! Drives any stepper driver IC with a discrete step/dir/enable interface
//! through `embedded-hal` output pins. Pin polarities and step timing come
//! from the immutable [`DriverConfig`].
//!
//! The software position counter maintained here is the position authority
//! for the axis.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use axle_core::traits::{Direction, DriverConfig, DriverState, MotorDriver};

/// Step/dir/enable driver over GPIO
pub struct StepDirDriver<S, D, E, DL> {
    step_pin: S,
    dir_pin: D,
    enable_pin: E,
    delay: DL,
    config: DriverConfig,
    state: DriverState,
    direction: Direction,
    position: i32,
}

impl<S, D, E, DL> StepDirDriver<S, D, E, DL>
where
    S: OutputPin,
    D: OutputPin,
    E: OutputPin,
    DL: DelayNs,
{
    /// Create a driver with outputs in the safe state (disabled, forward)
    pub fn new(step_pin: S, dir_pin: D, enable_pin: E, delay: DL, config: DriverConfig) -> Self {
        let mut driver = Self {
            step_pin,
            dir_pin,
            enable_pin,
            delay,
            config,
            state: DriverState::Disabled,
            direction: Direction::Forward,
            position: 0,
        };
        driver.write_enable(false);
        driver.write_direction(Direction::Forward);
        let _ = driver.step_pin.set_low();
        driver
    }

    /// The driver's timing and polarity configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn write_enable(&mut self, on: bool) {
        // Enable pin is typically active-low
        let level_high = on != self.config.enable_active_low;
        if level_high {
            let _ = self.enable_pin.set_high();
        } else {
            let _ = self.enable_pin.set_low();
        }
    }

    fn write_direction(&mut self, dir: Direction) {
        let level_high = (dir == Direction::Reverse) != self.config.dir_invert;
        if level_high {
            let _ = self.dir_pin.set_high();
        } else {
            let _ = self.dir_pin.set_low();
        }
    }
}

impl<S, D, E, DL> MotorDriver for StepDirDriver<S, D, E, DL>
where
    S: OutputPin,
    D: OutputPin,
    E: OutputPin,
    DL: DelayNs,
{
    fn enable(&mut self) -> bool {
        if self.state == DriverState::Fault {
            return false;
        }

        self.write_enable(true);
        if self.config.enable_delay_ms > 0 {
            self.delay.delay_ms(self.config.enable_delay_ms as u32);
        }
        self.state = DriverState::Enabled;
        true
    }

    fn disable(&mut self) {
        self.write_enable(false);
        if self.state != DriverState::Fault {
            self.state = DriverState::Disabled;
        }
    }

    fn is_enabled(&self) -> bool {
        self.state == DriverState::Enabled
    }

    fn state(&self) -> DriverState {
        self.state
    }

    fn set_direction(&mut self, dir: Direction) {
        if dir == self.direction {
            return;
        }

        self.direction = dir;
        self.write_direction(dir);
        // Direction setup time before the next step edge
        self.delay.delay_us(self.config.dir_setup_us as u32);
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn step(&mut self) -> bool {
        if self.state != DriverState::Enabled {
            return false;
        }

        let _ = self.step_pin.set_high();
        self.delay.delay_us(self.config.step_pulse_us as u32);
        let _ = self.step_pin.set_low();

        self.position += self.direction.sign();
        true
    }

    fn step_multiple(&mut self, count: u32, steps_per_second: u32) -> u32 {
        if self.state != DriverState::Enabled || steps_per_second == 0 {
            return 0;
        }

        let period_us = 1_000_000 / steps_per_second;
        let low_us = period_us.saturating_sub(self.config.step_pulse_us as u32);

        for done in 0..count {
            if !self.step() {
                return done;
            }
            self.delay.delay_us(low_us);
        }
        count
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    fn is_fault(&self) -> bool {
        // The discrete interface has no fault feedback line
        false
    }

    fn clear_fault(&mut self) -> bool {
        true
    }

    fn fault_code(&self) -> u8 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;

    struct SharedPin<'a> {
        level: &'a Cell<bool>,
    }

    impl embedded_hal::digital::ErrorType for SharedPin<'_> {
        type Error = Infallible;
    }

    impl OutputPin for SharedPin<'_> {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.level.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.level.set(true);
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    type Pins = (Cell<bool>, Cell<bool>, Cell<bool>);

    fn pins() -> Pins {
        (Cell::new(false), Cell::new(false), Cell::new(false))
    }

    fn driver_with_pins(
        (step, dir, enable): &Pins,
        config: DriverConfig,
    ) -> StepDirDriver<SharedPin<'_>, SharedPin<'_>, SharedPin<'_>, NoDelay> {
        StepDirDriver::new(
            SharedPin { level: step },
            SharedPin { level: dir },
            SharedPin { level: enable },
            NoDelay,
            config,
        )
    }

    #[test]
    fn test_starts_disabled_with_safe_levels() {
        let pins = pins();
        let driver = driver_with_pins(&pins, DriverConfig::default());

        assert_eq!(driver.state(), DriverState::Disabled);
        assert!(!driver.is_enabled());
        // Active-low enable: disabled = high
        assert!(pins.2.get());
        assert!(!pins.0.get());
    }

    #[test]
    fn test_enable_respects_active_low() {
        let pins = pins();
        let mut driver = driver_with_pins(&pins, DriverConfig::default());

        assert!(driver.enable());
        assert!(driver.is_enabled());
        assert!(!pins.2.get());

        driver.disable();
        assert!(pins.2.get());
    }

    #[test]
    fn test_enable_active_high_polarity() {
        let config = DriverConfig {
            enable_active_low: false,
            ..DriverConfig::default()
        };
        let pins = pins();
        let mut driver = driver_with_pins(&pins, config);

        assert!(!pins.2.get());
        driver.enable();
        assert!(pins.2.get());
    }

    #[test]
    fn test_step_requires_enable() {
        let pins = pins();
        let mut driver = driver_with_pins(&pins, DriverConfig::default());

        assert!(!driver.step());
        assert_eq!(driver.position(), 0);

        driver.enable();
        assert!(driver.step());
        assert_eq!(driver.position(), 1);
    }

    #[test]
    fn test_direction_updates_position_sign() {
        let pins = pins();
        let mut driver = driver_with_pins(&pins, DriverConfig::default());
        driver.enable();

        driver.set_direction(Direction::Reverse);
        assert!(pins.1.get());
        driver.step();
        driver.step();
        assert_eq!(driver.position(), -2);

        driver.set_direction(Direction::Forward);
        assert!(!pins.1.get());
        driver.step();
        assert_eq!(driver.position(), -1);
    }

    #[test]
    fn test_direction_invert() {
        let config = DriverConfig {
            dir_invert: true,
            ..DriverConfig::default()
        };
        let pins = pins();
        let mut driver = driver_with_pins(&pins, config);

        // Inverted: forward drives the pin high
        assert!(pins.1.get());
        driver.set_direction(Direction::Reverse);
        assert!(!pins.1.get());
    }

    #[test]
    fn test_step_multiple() {
        let pins = pins();
        let mut driver = driver_with_pins(&pins, DriverConfig::default());

        assert_eq!(driver.step_multiple(10, 1_000), 0);

        driver.enable();
        assert_eq!(driver.step_multiple(10, 1_000), 10);
        assert_eq!(driver.position(), 10);
        assert_eq!(driver.step_multiple(5, 0), 0);
    }

    #[test]
    fn test_set_position() {
        let pins = pins();
        let mut driver = driver_with_pins(&pins, DriverConfig::default());

        driver.set_position(-500);
        assert_eq!(driver.position(), -500);
        driver.reset_position();
        assert_eq!(driver.position(), 0);
    }
}
