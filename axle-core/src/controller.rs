//! Axis motion controller
//!
//! Open-loop state machine for a single axis. Owns the motor driver and the
//! pulse generator by value. Position moves are planned and then executed
//! through the trajectory subsystem: the periodic tick advances the active
//! profile and restrains the pulse generator with its velocity:
//!
//! 1. Advance the active trajectory and take its velocity
//! 2. Apply the velocity to the pulse generator
//! 3. Fold generator step counts into the driver and read position back
//! 4. Evaluate state transitions
//!
//! Velocity-mode moves have no planned distance and ramp linearly against
//! the commanded rate; a cooperative stop detaches from the plan and winds
//! down the same way.
//!
//! The driver is the position authority: the controller never writes
//! position from its own integration, only from generator count feedback
//! and explicit `set_position`.

use crate::motion::{
    ProfileKind, SCurveParams, SCurveTrajectory, TrajectoryParams, TrapezoidalTrajectory,
};
use crate::traits::{Direction, MotorDriver, StepGenerator};

/// Axis operational state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisState {
    /// Stopped, ready for commands
    #[default]
    Idle,
    /// Ramping up speed
    Accelerating,
    /// At target velocity
    Cruising,
    /// Ramping down speed
    Decelerating,
    /// At position, motor enabled
    Holding,
    /// Latched fault; outputs disabled
    Fault,
    /// Homing sequence (reserved; not implemented)
    Homing,
}

impl AxisState {
    /// Wire encoding for status reports
    pub fn code(self) -> u8 {
        match self {
            AxisState::Idle => 0,
            AxisState::Accelerating => 1,
            AxisState::Cruising => 2,
            AxisState::Decelerating => 3,
            AxisState::Holding => 4,
            AxisState::Fault => 5,
            AxisState::Homing => 6,
        }
    }

    /// True for the three moving states
    pub fn is_moving(self) -> bool {
        matches!(
            self,
            AxisState::Accelerating | AxisState::Cruising | AxisState::Decelerating
        )
    }
}

/// Move command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveKind {
    /// Move relative to the current position
    Relative,
    /// Move to an absolute position
    #[default]
    Absolute,
    /// Constant velocity, no target position
    Velocity,
    /// Homing move (reserved; not implemented)
    Homing,
}

/// Parameters for one move; immutable for the duration of the move
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionParams {
    /// Target position in steps (absolute) or distance (relative)
    pub target_position: i32,
    /// Maximum velocity in steps/s
    pub max_velocity: u32,
    /// Acceleration in steps/s²
    pub acceleration: u32,
    /// Deceleration in steps/s² (0 = use acceleration)
    pub deceleration: u32,
    /// Jerk limit for S-curve profiles (steps/s³)
    pub jerk: u32,
    /// Profile family
    pub profile: ProfileKind,
    /// Move kind
    pub move_kind: MoveKind,
}

/// Snapshot of the axis state for status queries
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionStatus {
    pub state: AxisState,
    pub current_position: i32,
    pub target_position: i32,
    pub current_velocity: u32,
    pub distance_to_go: u32,
    pub in_motion: bool,
    pub at_target: bool,
}

/// Motion controller configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionConfig {
    /// Default max velocity for simple moves (steps/s)
    pub default_velocity: u32,
    /// Default acceleration (steps/s²)
    pub default_acceleration: u32,
    /// Minimum stepping velocity; the generator never runs below this
    pub min_velocity: u32,
    /// Steps within target that count as "at position"
    pub position_tolerance: u32,
    /// Auto-enable the driver when a move starts
    pub enable_on_motion: bool,
    /// Auto-disable the driver after holding for `idle_disable_ms`
    pub disable_on_idle: bool,
    /// Hold time before auto-disable (ms)
    pub idle_disable_ms: u32,
}

/// Compile-time default configuration
pub const DEFAULT_MOTION_CONFIG: MotionConfig = MotionConfig {
    default_velocity: 10_000,
    default_acceleration: 50_000,
    min_velocity: 100,
    position_tolerance: 1,
    enable_on_motion: true,
    disable_on_idle: false,
    idle_disable_ms: 5_000,
};

impl Default for MotionConfig {
    fn default() -> Self {
        DEFAULT_MOTION_CONFIG
    }
}

/// Errors surfaced by motion commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Driver or pulse generator not attached
    HardwareMissing,
    /// Driver refused to enable
    EnableFailed,
    /// Planner rejected the parameters
    PlanRejected,
    /// A move is already in progress
    Busy,
    /// Axis is latched in the Fault state
    FaultLatched,
    /// Command refers to an unimplemented operation
    Unsupported,
    /// Pulse generator refused the commanded frequency
    FrequencyOutOfRange,
}

/// Open-loop motion controller for a single axis
///
/// Takes its hardware collaborators by value; there are no back-references.
/// `tick` must be called from the motion task at a regular period (≤ 1 ms)
/// and never blocks.
pub struct MotionController<D, G> {
    driver: Option<D>,
    stepper: Option<G>,
    config: MotionConfig,
    state: AxisState,

    current_position: i32,
    target_position: i32,
    current_velocity: u32,
    target_velocity: u32,
    direction: Direction,

    active: MotionParams,
    trapezoid: TrapezoidalTrajectory,
    scurve: SCurveTrajectory,

    last_step_count: u32,
    hold_elapsed_us: u32,
    /// A cooperative stop is winding the axis down; the planned profile no
    /// longer applies
    stopping: bool,
    enabled: bool,
    last_error: Option<MotionError>,
}

impl<D: MotorDriver, G: StepGenerator> MotionController<D, G> {
    /// Create a controller with the given configuration and no hardware
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            ..Self::default_parts()
        }
    }

    fn default_parts() -> Self {
        Self {
            driver: None,
            stepper: None,
            config: DEFAULT_MOTION_CONFIG,
            state: AxisState::Idle,
            current_position: 0,
            target_position: 0,
            current_velocity: 0,
            target_velocity: 0,
            direction: Direction::Forward,
            active: MotionParams::default(),
            trapezoid: TrapezoidalTrajectory::new(),
            scurve: SCurveTrajectory::new(),
            last_step_count: 0,
            hold_elapsed_us: 0,
            stopping: false,
            enabled: false,
            last_error: None,
        }
    }

    /// Attach the motor driver
    pub fn attach_driver(&mut self, driver: D) {
        self.driver = Some(driver);
    }

    /// Attach the pulse generator
    pub fn attach_stepper(&mut self, stepper: G) {
        self.stepper = Some(stepper);
    }

    /// Check that both hardware collaborators are attached
    pub fn is_hardware_attached(&self) -> bool {
        self.driver.is_some() && self.stepper.is_some()
    }

    /// Enable the motor driver
    pub fn enable(&mut self) -> bool {
        let Some(driver) = self.driver.as_mut() else {
            return false;
        };

        if driver.enable() {
            self.enabled = true;
            true
        } else {
            false
        }
    }

    /// Disable the motor driver, stopping any motion first
    pub fn disable(&mut self) {
        if self.state != AxisState::Idle {
            self.emergency_stop();
        }

        if let Some(driver) = self.driver.as_mut() {
            driver.disable();
        }
        self.enabled = false;
    }

    /// Check if the driver is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.driver.as_ref().is_some_and(|d| d.is_enabled())
    }

    /// Start a move with explicit parameters
    ///
    /// Plans the trajectory first; a rejected plan leaves the controller,
    /// the driver, and the target untouched. On success the direction is
    /// applied to the driver and the pulse generator is armed at the floor
    /// frequency.
    pub fn start_move(&mut self, params: &MotionParams) -> Result<(), MotionError> {
        if self.state == AxisState::Fault {
            return self.fail(MotionError::FaultLatched);
        }
        if self.state.is_moving() {
            return self.fail(MotionError::Busy);
        }
        if !self.is_hardware_attached() {
            return self.fail(MotionError::HardwareMissing);
        }

        if self.config.enable_on_motion && !self.is_enabled() && !self.enable() {
            return self.fail(MotionError::EnableFailed);
        }

        let target = match params.move_kind {
            MoveKind::Absolute => params.target_position,
            MoveKind::Relative => self.current_position + params.target_position,
            MoveKind::Velocity => return self.start_velocity(params.max_velocity as i32),
            MoveKind::Homing => return self.fail(MotionError::Unsupported),
        };

        let distance = target - self.current_position;

        // Already at target
        if distance == 0 {
            self.active = *params;
            self.target_position = target;
            self.state = AxisState::Holding;
            self.hold_elapsed_us = 0;
            self.last_error = None;
            return Ok(());
        }

        // Plan before committing anything; only then set direction on the
        // driver and start the generator.
        self.plan_profile(params, distance)?;

        self.active = *params;
        self.target_position = target;
        self.direction = Direction::from_distance(distance);
        if let Some(driver) = self.driver.as_mut() {
            driver.set_direction(self.direction);
        }

        self.start_profile();
        self.target_velocity = self.planned_peak_velocity();
        self.stopping = false;
        self.state = AxisState::Accelerating;

        if let Some(stepper) = self.stepper.as_mut() {
            stepper.reset_step_count();
            self.last_step_count = 0;
            stepper.set_frequency(self.config.min_velocity);
            if !stepper.start() {
                self.state = AxisState::Idle;
                return self.fail(MotionError::HardwareMissing);
            }
        }

        self.last_error = None;
        Ok(())
    }

    // Validate and plan the move through the trajectory subsystem without
    // touching controller state.
    fn plan_profile(&mut self, params: &MotionParams, distance: i32) -> Result<(), MotionError> {
        let result = match params.profile {
            ProfileKind::Trapezoidal => self.trapezoid.plan(&TrajectoryParams {
                distance,
                max_velocity: params.max_velocity,
                acceleration: params.acceleration,
                deceleration: params.deceleration,
                start_velocity: 0,
                end_velocity: 0,
            }),
            ProfileKind::SCurve => self.scurve.plan(&SCurveParams {
                distance,
                max_velocity: params.max_velocity,
                max_acceleration: params.acceleration,
                max_jerk: params.jerk,
            }),
        };

        match result {
            Ok(()) => Ok(()),
            Err(_) => self.fail(MotionError::PlanRejected),
        }
    }

    // Arm the active profile's executor
    fn start_profile(&mut self) {
        match self.active.profile {
            ProfileKind::Trapezoidal => self.trapezoid.start(),
            ProfileKind::SCurve => self.scurve.start(),
        }
    }

    // Peak velocity the plan will actually reach; below the commanded
    // maximum for triangular and reduced profiles
    fn planned_peak_velocity(&self) -> u32 {
        match self.active.profile {
            ProfileKind::Trapezoidal => self.trapezoid.timing().peak_velocity,
            ProfileKind::SCurve => self.scurve.timing().v_achieved,
        }
    }

    // Whether the active profile has reached its terminal phase
    fn profile_complete(&self) -> bool {
        match self.active.profile {
            ProfileKind::Trapezoidal => self.trapezoid.is_complete(),
            ProfileKind::SCurve => self.scurve.is_complete(),
        }
    }

    /// Move to an absolute position with configured defaults
    pub fn move_to(&mut self, position: i32) -> Result<(), MotionError> {
        self.start_move(&MotionParams {
            target_position: position,
            max_velocity: self.config.default_velocity,
            acceleration: self.config.default_acceleration,
            deceleration: self.config.default_acceleration,
            jerk: 0,
            profile: ProfileKind::Trapezoidal,
            move_kind: MoveKind::Absolute,
        })
    }

    /// Move relative to the current position with configured defaults
    pub fn move_by(&mut self, distance: i32) -> Result<(), MotionError> {
        self.start_move(&MotionParams {
            target_position: distance,
            max_velocity: self.config.default_velocity,
            acceleration: self.config.default_acceleration,
            deceleration: self.config.default_acceleration,
            jerk: 0,
            profile: ProfileKind::Trapezoidal,
            move_kind: MoveKind::Relative,
        })
    }

    /// Start constant-velocity motion; sign selects direction, zero stops
    pub fn start_velocity(&mut self, velocity: i32) -> Result<(), MotionError> {
        if velocity == 0 {
            self.stop();
            self.last_error = None;
            return Ok(());
        }
        if self.state == AxisState::Fault {
            return self.fail(MotionError::FaultLatched);
        }
        if self.state.is_moving() {
            return self.fail(MotionError::Busy);
        }
        if !self.is_hardware_attached() {
            return self.fail(MotionError::HardwareMissing);
        }

        if self.config.enable_on_motion && !self.is_enabled() && !self.enable() {
            return self.fail(MotionError::EnableFailed);
        }

        if velocity > 0 {
            self.direction = Direction::Forward;
            self.target_velocity = velocity as u32;
        } else {
            self.direction = Direction::Reverse;
            self.target_velocity = velocity.unsigned_abs();
        }
        if let Some(driver) = self.driver.as_mut() {
            driver.set_direction(self.direction);
        }

        self.active.max_velocity = self.target_velocity;
        self.active.acceleration = self.config.default_acceleration;
        self.active.deceleration = self.config.default_acceleration;
        self.active.move_kind = MoveKind::Velocity;

        self.stopping = false;
        self.state = AxisState::Accelerating;

        if let Some(stepper) = self.stepper.as_mut() {
            stepper.reset_step_count();
            self.last_step_count = 0;
            stepper.set_frequency(self.config.min_velocity);
            if !stepper.start() {
                self.state = AxisState::Idle;
                return self.fail(MotionError::HardwareMissing);
            }
        }

        self.last_error = None;
        Ok(())
    }

    /// Stop immediately without deceleration
    ///
    /// The pulse generator is stopped and velocity snaps to zero within the
    /// same tick boundary. The motor may lose position.
    pub fn emergency_stop(&mut self) {
        if let Some(stepper) = self.stepper.as_mut() {
            stepper.stop();
        }
        self.current_velocity = 0;
        self.stopping = false;
        self.state = AxisState::Idle;
    }

    /// Stop cooperatively, honoring the active deceleration
    pub fn stop(&mut self) {
        if !self.state.is_moving() {
            return;
        }

        self.stopping = true;
        self.state = AxisState::Decelerating;
        self.target_velocity = 0;
    }

    /// Latch a fault: stop the generator, zero velocity, disable the driver
    pub fn latch_fault(&mut self) {
        if let Some(stepper) = self.stepper.as_mut() {
            stepper.stop();
        }
        self.current_velocity = 0;
        if let Some(driver) = self.driver.as_mut() {
            driver.disable();
        }
        self.stopping = false;
        self.enabled = false;
        self.state = AxisState::Fault;
    }

    /// Clear a latched fault, returning to Idle
    ///
    /// Returns false if the axis was not faulted or the driver still
    /// reports a hardware fault.
    pub fn clear_fault(&mut self) -> bool {
        if self.state != AxisState::Fault {
            return false;
        }
        if let Some(driver) = self.driver.as_mut() {
            if driver.is_fault() && !driver.clear_fault() {
                return false;
            }
        }
        self.state = AxisState::Idle;
        true
    }

    /// Current axis state
    pub fn state(&self) -> AxisState {
        self.state
    }

    /// Full status snapshot
    pub fn status(&self) -> MotionStatus {
        let distance_to_go = (self.target_position - self.current_position).unsigned_abs();

        MotionStatus {
            state: self.state,
            current_position: self.current_position,
            target_position: self.target_position,
            current_velocity: self.current_velocity,
            distance_to_go,
            in_motion: self.state.is_moving(),
            at_target: distance_to_go <= self.config.position_tolerance,
        }
    }

    /// Check if the axis is in a moving state
    pub fn is_moving(&self) -> bool {
        self.state.is_moving()
    }

    /// Check if within position tolerance of the target
    pub fn is_at_target(&self) -> bool {
        (self.target_position - self.current_position).unsigned_abs()
            <= self.config.position_tolerance
    }

    /// Current position in steps
    pub fn position(&self) -> i32 {
        self.current_position
    }

    /// Current velocity magnitude in steps/s
    pub fn velocity(&self) -> u32 {
        self.current_velocity
    }

    /// Current move direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Signed distance remaining to the target
    pub fn distance_to_go(&self) -> i32 {
        self.target_position - self.current_position
    }

    /// Error surfaced by the most recent failed command, if any
    pub fn last_error(&self) -> Option<MotionError> {
        self.last_error
    }

    /// Set the current position (homing / synchronization)
    pub fn set_position(&mut self, position: i32) {
        self.current_position = position;
        if let Some(driver) = self.driver.as_mut() {
            driver.set_position(position);
        }
    }

    /// Reset position to zero
    pub fn reset_position(&mut self) {
        self.set_position(0);
    }

    /// Replace the motion configuration
    pub fn set_config(&mut self, config: MotionConfig) {
        self.config = config;
    }

    /// Current motion configuration
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Set the default velocity for simple moves
    pub fn set_max_velocity(&mut self, velocity: u32) {
        self.config.default_velocity = velocity;
    }

    /// Set the default acceleration
    pub fn set_acceleration(&mut self, acceleration: u32) {
        self.config.default_acceleration = acceleration;
    }

    /// Main control loop tick
    ///
    /// Call from the motion task at a fixed period with the elapsed time in
    /// microseconds. Order is fixed: velocity, generator, position
    /// read-back, transitions.
    pub fn tick(&mut self, dt_us: u32) {
        if matches!(
            self.state,
            AxisState::Idle | AxisState::Fault | AxisState::Homing
        ) {
            return;
        }

        self.update_velocity(dt_us);
        self.apply_velocity();
        self.read_back_position();
        self.check_transitions(dt_us);
    }

    fn accel_rate(&self) -> u32 {
        if self.active.acceleration != 0 {
            self.active.acceleration
        } else {
            self.config.default_acceleration
        }
    }

    fn decel_rate(&self) -> u32 {
        if self.active.deceleration != 0 {
            self.active.deceleration
        } else {
            self.accel_rate()
        }
    }

    fn update_velocity(&mut self, dt_us: u32) {
        if dt_us == 0 {
            return;
        }

        // Velocity-mode moves have no planned distance, and a cooperative
        // stop abandons the plan; both ramp linearly against the target.
        if self.stopping || self.active.move_kind == MoveKind::Velocity {
            self.update_velocity_ramp(dt_us);
            return;
        }

        // Position moves follow the planned profile: advance the active
        // trajectory and take its velocity.
        if self.state.is_moving() {
            self.current_velocity = match self.active.profile {
                ProfileKind::Trapezoidal => self.trapezoid.update(dt_us).velocity,
                ProfileKind::SCurve => self.scurve.update(dt_us).velocity,
            };
        }
    }

    fn update_velocity_ramp(&mut self, dt_us: u32) {
        match self.state {
            AxisState::Accelerating => {
                let delta_v = (self.accel_rate() as u64 * dt_us as u64) / 1_000_000;
                if self.current_velocity < self.target_velocity {
                    self.current_velocity = self.current_velocity.saturating_add(delta_v as u32);
                    if self.current_velocity > self.target_velocity {
                        self.current_velocity = self.target_velocity;
                    }
                }
            }
            AxisState::Decelerating => {
                let delta_v = (self.decel_rate() as u64 * dt_us as u64) / 1_000_000;
                if self.current_velocity > self.config.min_velocity {
                    if (delta_v as u32) < self.current_velocity - self.config.min_velocity {
                        self.current_velocity -= delta_v as u32;
                    } else {
                        self.current_velocity = self.config.min_velocity;
                    }
                }
            }
            AxisState::Cruising => {
                self.current_velocity = self.target_velocity;
            }
            _ => {}
        }

        if self.current_velocity < self.config.min_velocity && self.state.is_moving() {
            self.current_velocity = self.config.min_velocity;
        }
    }

    fn apply_velocity(&mut self) {
        if !self.state.is_moving() {
            return;
        }

        let frequency = self.current_velocity.max(self.config.min_velocity);
        let ok = match self.stepper.as_mut() {
            Some(stepper) => stepper.set_frequency(frequency),
            None => return,
        };

        if !ok {
            // Resource failure while moving: go Idle (not Fault) and
            // surface the error on the next status query.
            if let Some(stepper) = self.stepper.as_mut() {
                stepper.stop();
            }
            self.current_velocity = 0;
            self.state = AxisState::Idle;
            self.last_error = Some(MotionError::FrequencyOutOfRange);
        }
    }

    // Fold generator pulse counts into the driver's position counter, then
    // read the authoritative position back.
    fn read_back_position(&mut self) {
        let delta = match self.stepper.as_ref() {
            Some(stepper) => {
                let count = stepper.step_count();
                let delta = count.wrapping_sub(self.last_step_count);
                self.last_step_count = count;
                delta
            }
            None => 0,
        };

        if let Some(driver) = self.driver.as_mut() {
            if delta != 0 {
                let signed = self.direction.sign().wrapping_mul(delta as i32);
                let position = driver.position().wrapping_add(signed);
                driver.set_position(position);
            }
            self.current_position = driver.position();
        }
    }

    fn check_transitions(&mut self, dt_us: u32) {
        let abs_distance = (self.target_position - self.current_position).unsigned_abs();

        match self.state {
            AxisState::Accelerating | AxisState::Cruising => {
                if self.state == AxisState::Accelerating
                    && self.current_velocity >= self.target_velocity
                {
                    self.state = AxisState::Cruising;
                }

                // Start decelerating once the remaining distance no longer
                // covers v²/(2d); ties decelerate. A profile that has run
                // through its planned time is past its own deceleration.
                if !self.stopping && self.active.move_kind != MoveKind::Velocity {
                    let v = self.current_velocity as u64;
                    let d = self.decel_rate() as u64;
                    let decel_distance = (v * v) / (2 * d);

                    if abs_distance as u64 <= decel_distance || self.profile_complete() {
                        self.state = AxisState::Decelerating;
                    }
                }
            }
            AxisState::Decelerating => {
                let at_target = !self.stopping
                    && self.active.move_kind != MoveKind::Velocity
                    && abs_distance <= self.config.position_tolerance;

                if at_target {
                    if let Some(stepper) = self.stepper.as_mut() {
                        stepper.stop();
                    }
                    self.current_velocity = 0;
                    self.hold_elapsed_us = 0;
                    self.stopping = false;
                    self.state = AxisState::Holding;
                } else if self.current_velocity <= self.config.min_velocity {
                    // Stopped before reaching the target: overshoot
                    // protection, or the end of a cooperative stop.
                    if let Some(stepper) = self.stepper.as_mut() {
                        stepper.stop();
                    }
                    self.current_velocity = 0;
                    self.stopping = false;
                    self.state = AxisState::Idle;
                }
            }
            AxisState::Holding => {
                if self.config.disable_on_idle {
                    self.hold_elapsed_us = self.hold_elapsed_us.saturating_add(dt_us);
                    if self.hold_elapsed_us >= self.config.idle_disable_ms.saturating_mul(1_000) {
                        if let Some(driver) = self.driver.as_mut() {
                            driver.disable();
                        }
                        self.enabled = false;
                        self.state = AxisState::Idle;
                    }
                }
            }
            _ => {}
        }
    }

    fn fail(&mut self, error: MotionError) -> Result<(), MotionError> {
        self.last_error = Some(error);
        Err(error)
    }

    /// The planned trapezoidal trajectory, for look-ahead queries
    pub fn planned_trajectory(&self) -> &TrapezoidalTrajectory {
        &self.trapezoid
    }

    /// The planned S-curve trajectory, for look-ahead queries
    pub fn planned_scurve(&self) -> &SCurveTrajectory {
        &self.scurve
    }

    /// Borrow the attached driver, if any
    pub fn driver(&self) -> Option<&D> {
        self.driver.as_ref()
    }

    /// Mutably borrow the attached driver, if any
    pub fn driver_mut(&mut self) -> Option<&mut D> {
        self.driver.as_mut()
    }

    /// Borrow the attached pulse generator, if any
    pub fn stepper(&self) -> Option<&G> {
        self.stepper.as_ref()
    }

    /// Mutably borrow the attached pulse generator, if any
    pub fn stepper_mut(&mut self) -> Option<&mut G> {
        self.stepper.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockDriver, MockStepGen};

    type Controller = MotionController<MockDriver, MockStepGen>;

    fn controller_with_hardware() -> Controller {
        let mut controller = Controller::new(DEFAULT_MOTION_CONFIG);
        controller.attach_driver(MockDriver::new());
        controller.attach_stepper(MockStepGen::new());
        controller
    }

    // Tick the controller while feeding the generator's step counter from
    // the commanded frequency, like the hardware would.
    fn run_until_stopped(controller: &mut Controller, dt_us: u32, max_ticks: u32) -> u32 {
        let mut acc: u64 = 0;
        for i in 0..max_ticks {
            let v = controller.velocity() as u64;
            acc += v * dt_us as u64;
            let steps = (acc / 1_000_000) as u32;
            acc %= 1_000_000;
            if let Some(stepper) = controller.stepper_mut() {
                stepper.simulate_steps(steps);
            }
            controller.tick(dt_us);
            if !controller.is_moving() {
                return i;
            }
        }
        max_ticks
    }

    #[test]
    fn test_starts_idle() {
        let controller = controller_with_hardware();
        assert_eq!(controller.state(), AxisState::Idle);
        assert!(!controller.is_moving());
        assert!(!controller.is_enabled());
        assert_eq!(controller.position(), 0);
    }

    #[test]
    fn test_hardware_attachment() {
        let mut controller = Controller::new(DEFAULT_MOTION_CONFIG);
        assert!(!controller.is_hardware_attached());
        controller.attach_driver(MockDriver::new());
        assert!(!controller.is_hardware_attached());
        controller.attach_stepper(MockStepGen::new());
        assert!(controller.is_hardware_attached());
    }

    #[test]
    fn test_enable_without_driver_fails() {
        let mut controller = Controller::new(DEFAULT_MOTION_CONFIG);
        assert!(!controller.enable());
        assert!(!controller.is_enabled());
    }

    #[test]
    fn test_enable_and_disable() {
        let mut controller = controller_with_hardware();
        assert!(controller.enable());
        assert!(controller.is_enabled());

        controller.disable();
        assert!(!controller.is_enabled());
    }

    #[test]
    fn test_move_without_hardware_fails() {
        let mut controller = Controller::new(DEFAULT_MOTION_CONFIG);
        assert_eq!(controller.move_to(1_000), Err(MotionError::HardwareMissing));
        assert_eq!(controller.last_error(), Some(MotionError::HardwareMissing));
    }

    #[test]
    fn test_move_to_starts_motion() {
        let mut controller = controller_with_hardware();
        controller.move_to(1_000).unwrap();

        assert_eq!(controller.state(), AxisState::Accelerating);
        assert!(controller.is_moving());
        assert_eq!(controller.status().target_position, 1_000);
        assert_eq!(controller.direction(), Direction::Forward);
        // Auto-enable kicked in
        assert!(controller.is_enabled());
        // Generator armed at the floor frequency
        let stepper = controller.stepper().unwrap();
        assert!(stepper.is_running());
        assert_eq!(stepper.frequency(), DEFAULT_MOTION_CONFIG.min_velocity);
    }

    #[test]
    fn test_move_by_is_relative() {
        let mut controller = controller_with_hardware();
        controller.set_position(500);
        controller.move_by(100).unwrap();
        assert_eq!(controller.status().target_position, 600);
    }

    #[test]
    fn test_move_to_current_position_holds() {
        let mut controller = controller_with_hardware();
        controller.set_position(1_000);
        controller.move_to(1_000).unwrap();

        let status = controller.status();
        assert_eq!(status.state, AxisState::Holding);
        assert!(!status.in_motion);
        assert_eq!(status.distance_to_go, 0);
        assert!(status.at_target);
    }

    #[test]
    fn test_reverse_move_direction() {
        let mut controller = controller_with_hardware();
        controller.set_position(1_000);
        controller.move_to(0).unwrap();
        assert_eq!(controller.direction(), Direction::Reverse);
        assert_eq!(controller.driver().unwrap().direction, Direction::Reverse);
    }

    #[test]
    fn test_distance_to_go() {
        let mut controller = controller_with_hardware();
        controller.move_to(1_000).unwrap();
        assert_eq!(controller.distance_to_go(), 1_000);
    }

    #[test]
    fn test_set_and_reset_position() {
        let mut controller = controller_with_hardware();
        controller.set_position(5_000);
        assert_eq!(controller.position(), 5_000);
        assert_eq!(controller.driver().unwrap().position, 5_000);

        controller.reset_position();
        assert_eq!(controller.position(), 0);
    }

    #[test]
    fn test_config_setters() {
        let mut controller = controller_with_hardware();
        controller.set_max_velocity(50_000);
        controller.set_acceleration(100_000);
        assert_eq!(controller.config().default_velocity, 50_000);
        assert_eq!(controller.config().default_acceleration, 100_000);
    }

    #[test]
    fn test_emergency_stop() {
        let mut controller = controller_with_hardware();
        controller.move_to(10_000).unwrap();
        for _ in 0..20 {
            controller.tick(1_000);
        }
        assert!(controller.velocity() > 0);

        controller.emergency_stop();
        assert_eq!(controller.state(), AxisState::Idle);
        assert_eq!(controller.velocity(), 0);
        assert!(!controller.stepper().unwrap().is_running());
    }

    #[test]
    fn test_cooperative_stop_decelerates() {
        let mut controller = controller_with_hardware();
        controller.move_to(10_000).unwrap();
        controller.stop();
        assert_eq!(controller.state(), AxisState::Decelerating);

        // Deceleration runs down to the floor, then the axis goes idle
        run_until_stopped(&mut controller, 1_000, 10_000);
        assert_eq!(controller.state(), AxisState::Idle);
        assert_eq!(controller.velocity(), 0);
    }

    #[test]
    fn test_busy_while_moving() {
        let mut controller = controller_with_hardware();
        controller.move_to(10_000).unwrap();
        assert_eq!(controller.move_to(20_000), Err(MotionError::Busy));
        assert_eq!(controller.status().target_position, 10_000);
    }

    #[test]
    fn test_plan_rejected_for_zero_velocity() {
        let mut controller = controller_with_hardware();
        let result = controller.start_move(&MotionParams {
            target_position: 1_000,
            max_velocity: 0,
            acceleration: 50_000,
            deceleration: 0,
            jerk: 0,
            profile: ProfileKind::Trapezoidal,
            move_kind: MoveKind::Absolute,
        });
        assert_eq!(result, Err(MotionError::PlanRejected));
        assert_eq!(controller.state(), AxisState::Idle);
    }

    #[test]
    fn test_rejected_plan_leaves_no_side_effects() {
        let mut controller = controller_with_hardware();
        controller.move_to(500).unwrap();
        run_until_stopped(&mut controller, 100, 500_000);
        let position = controller.position();
        let target = controller.status().target_position;

        // A reverse move with invalid parameters must be refused without
        // touching the driver direction or the stored target
        let result = controller.start_move(&MotionParams {
            target_position: -1_000,
            max_velocity: 0,
            acceleration: 50_000,
            deceleration: 0,
            jerk: 0,
            profile: ProfileKind::Trapezoidal,
            move_kind: MoveKind::Absolute,
        });
        assert_eq!(result, Err(MotionError::PlanRejected));
        assert_eq!(controller.direction(), Direction::Forward);
        assert_eq!(controller.driver().unwrap().direction, Direction::Forward);
        assert_eq!(controller.status().target_position, target);
        assert_eq!(controller.position(), position);
        assert!(!controller.stepper().unwrap().is_running());
    }

    #[test]
    fn test_scurve_profile_drives_tick_velocity() {
        // Same distance and limits, different profile kinds: the S-curve
        // move must ramp jerk-limited, not linearly.
        let mut trap = controller_with_hardware();
        trap.move_to(100_000).unwrap();
        assert_eq!(trap.planned_trajectory().timing().peak_velocity, 10_000);

        let mut scurve = controller_with_hardware();
        scurve
            .start_move(&MotionParams {
                target_position: 100_000,
                max_velocity: 10_000,
                acceleration: 50_000,
                deceleration: 0,
                jerk: 500_000,
                profile: ProfileKind::SCurve,
                move_kind: MoveKind::Absolute,
            })
            .unwrap();
        assert_eq!(scurve.planned_scurve().timing().v_achieved, 10_000);

        for _ in 0..10 {
            trap.tick(1_000);
            scurve.tick(1_000);
        }
        // After 10 ms the linear ramp is at a·t = 500 steps/s; the jerk
        // ramp has only reached ½·j·t² ≈ 25
        assert_eq!(trap.velocity(), 500);
        assert!(scurve.velocity() < 100);

        // The jerk-limited profile still reaches full speed and cruises
        for _ in 0..400 {
            scurve.tick(1_000);
        }
        assert_eq!(scurve.velocity(), 10_000);
        assert_eq!(scurve.state(), AxisState::Cruising);
    }

    #[test]
    fn test_trapezoid_profile_caps_at_planned_peak() {
        let mut controller = controller_with_hardware();
        // Short move: triangular plan, peak √(a·d) ≈ 7071 < the commanded
        // 10 000
        controller.move_to(1_000).unwrap();
        let peak = controller.planned_trajectory().timing().peak_velocity;
        assert!(controller.planned_trajectory().timing().is_triangle);
        assert_eq!(peak, 7_071);

        let mut max_seen = 0;
        for _ in 0..400 {
            controller.tick(1_000);
            max_seen = max_seen.max(controller.velocity());
        }
        assert!(max_seen <= peak);
    }

    #[test]
    fn test_scurve_move_requires_jerk() {
        let mut controller = controller_with_hardware();
        let mut params = MotionParams {
            target_position: 1_000,
            max_velocity: 10_000,
            acceleration: 50_000,
            deceleration: 0,
            jerk: 0,
            profile: ProfileKind::SCurve,
            move_kind: MoveKind::Absolute,
        };
        assert_eq!(
            controller.start_move(&params),
            Err(MotionError::PlanRejected)
        );

        params.jerk = 500_000;
        controller.start_move(&params).unwrap();
        assert_eq!(controller.state(), AxisState::Accelerating);
    }

    #[test]
    fn test_auto_enable_failure_aborts_move() {
        let mut controller = controller_with_hardware();
        controller.driver_mut().unwrap().fail_enable = true;
        assert_eq!(controller.move_to(1_000), Err(MotionError::EnableFailed));
        assert_eq!(controller.state(), AxisState::Idle);
    }

    #[test]
    fn test_tick_accelerates_toward_target_velocity() {
        let mut controller = controller_with_hardware();
        controller.move_to(100_000).unwrap();

        let mut last_v = 0;
        for _ in 0..50 {
            controller.tick(1_000);
            assert!(controller.velocity() >= last_v);
            last_v = controller.velocity();
        }
        assert!(last_v > 0);
        // Applied frequency tracks velocity
        assert_eq!(controller.stepper().unwrap().frequency(), last_v);
    }

    #[test]
    fn test_move_completes_at_target() {
        let mut controller = controller_with_hardware();
        controller.move_to(1_000).unwrap();

        run_until_stopped(&mut controller, 100, 500_000);

        assert_eq!(controller.state(), AxisState::Holding);
        assert!((controller.position() - 1_000).abs() <= 1);
        assert_eq!(controller.velocity(), 0);
        assert!(!controller.stepper().unwrap().is_running());
        assert!(controller.is_at_target());
    }

    #[test]
    fn test_position_follows_generator_counts() {
        let mut controller = controller_with_hardware();
        controller.move_to(100_000).unwrap();

        for _ in 0..100 {
            controller.tick(1_000);
        }
        let v = controller.velocity();
        assert!(v > 0);

        // 500 pulses from the generator move the driver by 500
        controller.stepper_mut().unwrap().simulate_steps(500);
        controller.tick(1_000);
        assert!(controller.position() >= 500);
        assert_eq!(
            controller.position(),
            controller.driver().unwrap().position
        );
    }

    #[test]
    fn test_velocity_mode() {
        let mut controller = controller_with_hardware();
        controller.start_velocity(5_000).unwrap();
        assert_eq!(controller.state(), AxisState::Accelerating);
        assert_eq!(controller.direction(), Direction::Forward);

        // Reaches and holds the commanded velocity
        for _ in 0..200 {
            controller.tick(1_000);
        }
        assert_eq!(controller.state(), AxisState::Cruising);
        assert_eq!(controller.velocity(), 5_000);

        // Cooperative stop winds down to idle
        controller.stop();
        run_until_stopped(&mut controller, 1_000, 10_000);
        assert_eq!(controller.state(), AxisState::Idle);
    }

    #[test]
    fn test_velocity_mode_reverse() {
        let mut controller = controller_with_hardware();
        controller.start_velocity(-3_000).unwrap();
        assert_eq!(controller.direction(), Direction::Reverse);

        for _ in 0..100 {
            controller.tick(1_000);
        }
        controller.stepper_mut().unwrap().simulate_steps(300);
        controller.tick(1_000);
        assert!(controller.position() <= -300);
    }

    #[test]
    fn test_zero_velocity_command_stops() {
        let mut controller = controller_with_hardware();
        controller.start_velocity(5_000).unwrap();
        controller.start_velocity(0).unwrap();
        assert_eq!(controller.state(), AxisState::Decelerating);
    }

    #[test]
    fn test_fault_latch_and_clear() {
        let mut controller = controller_with_hardware();
        controller.move_to(10_000).unwrap();
        for _ in 0..20 {
            controller.tick(1_000);
        }

        controller.latch_fault();
        assert_eq!(controller.state(), AxisState::Fault);
        assert_eq!(controller.velocity(), 0);
        assert!(!controller.stepper().unwrap().is_running());
        assert!(!controller.is_enabled());

        // Commands are refused while faulted
        assert_eq!(controller.move_to(100), Err(MotionError::FaultLatched));

        assert!(controller.clear_fault());
        assert_eq!(controller.state(), AxisState::Idle);
        controller.move_to(100).unwrap();
        assert_eq!(controller.state(), AxisState::Accelerating);
    }

    #[test]
    fn test_clear_fault_only_from_fault() {
        let mut controller = controller_with_hardware();
        assert!(!controller.clear_fault());
    }

    #[test]
    fn test_frequency_failure_goes_idle_not_fault() {
        let mut controller = Controller::new(DEFAULT_MOTION_CONFIG);
        controller.attach_driver(MockDriver::new());
        // Generator that cannot reach the default cruise velocity
        controller.attach_stepper(MockStepGen::with_max_frequency(1_000));
        controller.move_to(100_000).unwrap();

        for _ in 0..100 {
            controller.tick(1_000);
            if controller.state() == AxisState::Idle {
                break;
            }
        }

        assert_eq!(controller.state(), AxisState::Idle);
        assert_eq!(
            controller.last_error(),
            Some(MotionError::FrequencyOutOfRange)
        );
    }

    #[test]
    fn test_tick_noop_while_idle_and_faulted() {
        let mut controller = controller_with_hardware();
        controller.tick(1_000);
        assert_eq!(controller.velocity(), 0);

        controller.latch_fault();
        controller.tick(1_000);
        assert_eq!(controller.state(), AxisState::Fault);
    }

    #[test]
    fn test_auto_disable_after_hold() {
        let mut config = DEFAULT_MOTION_CONFIG;
        config.disable_on_idle = true;
        config.idle_disable_ms = 10;

        let mut controller = Controller::new(config);
        controller.attach_driver(MockDriver::new());
        controller.attach_stepper(MockStepGen::new());

        controller.set_position(1_000);
        controller.move_to(1_000).unwrap();
        assert_eq!(controller.state(), AxisState::Holding);
        assert!(controller.is_enabled());

        // 10 ms of holding elapses, then the driver drops out
        for _ in 0..11 {
            controller.tick(1_000);
        }
        assert_eq!(controller.state(), AxisState::Idle);
        assert!(!controller.is_enabled());
    }
}
