//! Mock hardware collaborators for unit tests

use crate::traits::{Direction, DriverState, MotorDriver, StepGenState, StepGenerator};

/// Mock motor driver backed by plain fields
#[derive(Debug, Clone)]
pub struct MockDriver {
    pub enabled: bool,
    pub direction: Direction,
    pub position: i32,
    pub fault: bool,
    /// Refuse the next enable() calls
    pub fail_enable: bool,
    pub steps_taken: u32,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            enabled: false,
            direction: Direction::Forward,
            position: 0,
            fault: false,
            fail_enable: false,
            steps_taken: 0,
        }
    }
}

impl MotorDriver for MockDriver {
    fn enable(&mut self) -> bool {
        if self.fault || self.fail_enable {
            return false;
        }
        self.enabled = true;
        true
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn state(&self) -> DriverState {
        if self.fault {
            DriverState::Fault
        } else if self.enabled {
            DriverState::Enabled
        } else {
            DriverState::Disabled
        }
    }

    fn set_direction(&mut self, dir: Direction) {
        self.direction = dir;
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn step(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.position += self.direction.sign();
        self.steps_taken += 1;
        true
    }

    fn step_multiple(&mut self, count: u32, _steps_per_second: u32) -> u32 {
        if !self.enabled {
            return 0;
        }
        for _ in 0..count {
            self.step();
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
        self.fault
    }

    fn clear_fault(&mut self) -> bool {
        self.fault = false;
        true
    }

    fn fault_code(&self) -> u8 {
        u8::from(self.fault)
    }
}

/// Mock pulse generator with a simulated step counter
#[derive(Debug, Clone)]
pub struct MockStepGen {
    pub initialized: bool,
    pub state: StepGenState,
    pub frequency: u32,
    pub step_count: u32,
    pub target_steps: u32,
    pub max_frequency: u32,
}

impl Default for MockStepGen {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStepGen {
    pub fn new() -> Self {
        Self::with_max_frequency(500_000)
    }

    pub fn with_max_frequency(max_frequency: u32) -> Self {
        Self {
            initialized: true,
            state: StepGenState::Idle,
            frequency: 0,
            step_count: 0,
            target_steps: 0,
            max_frequency,
        }
    }

    /// Simulate `n` emitted pulses, honoring target-steps auto-stop
    pub fn simulate_steps(&mut self, n: u32) {
        if self.state != StepGenState::Running {
            return;
        }
        for _ in 0..n {
            self.step_count += 1;
            if self.target_steps > 0 && self.step_count >= self.target_steps {
                self.state = StepGenState::Idle;
                break;
            }
        }
    }
}

impl StepGenerator for MockStepGen {
    fn init(&mut self) -> bool {
        self.initialized = true;
        true
    }

    fn start(&mut self) -> bool {
        if !self.initialized || self.frequency == 0 {
            return false;
        }
        self.state = StepGenState::Running;
        true
    }

    fn stop(&mut self) {
        self.state = StepGenState::Idle;
    }

    fn is_running(&self) -> bool {
        self.state == StepGenState::Running
    }

    fn state(&self) -> StepGenState {
        self.state
    }

    fn set_frequency(&mut self, frequency_hz: u32) -> bool {
        if frequency_hz == 0 || frequency_hz > self.max_frequency {
            return false;
        }
        self.frequency = frequency_hz;
        true
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn min_frequency(&self) -> u32 {
        1
    }

    fn max_frequency(&self) -> u32 {
        self.max_frequency
    }

    fn step_count(&self) -> u32 {
        self.step_count
    }

    fn reset_step_count(&mut self) {
        self.step_count = 0;
    }

    fn set_target_steps(&mut self, target_steps: u32) {
        self.target_steps = target_steps;
    }

    fn pulse_width_us(&self) -> u16 {
        3
    }
}
