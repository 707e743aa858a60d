//! Trapezoidal trajectory planner and executor
//!
//! Generates velocity profiles with linear acceleration and deceleration.
//!
//! ```text
//!        ___________
//!       /           \
//!      /             \
//!     /               \
//! ___/                 \___
//!    accel  cruise  decel
//! ```
//!
//! Short moves that cannot reach the commanded velocity degrade to a
//! triangular profile with no cruise segment. All execution arithmetic is
//! integer; the single square root (triangular peak solve) runs at plan
//! time, off the motion tick.

use crate::traits::Direction;

use super::{PlanError, MICROS_PER_SEC};

/// Trajectory phase for the trapezoidal profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrajectoryPhase {
    /// No active trajectory
    #[default]
    Idle,
    /// Accelerating
    Accel,
    /// Constant velocity
    Cruise,
    /// Decelerating
    Decel,
    /// Trajectory finished
    Complete,
}

/// Parameters for a planned move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectoryParams {
    /// Total distance to travel in steps (sign selects direction)
    pub distance: i32,
    /// Maximum velocity in steps/s
    pub max_velocity: u32,
    /// Acceleration in steps/s²
    pub acceleration: u32,
    /// Deceleration in steps/s² (0 = use acceleration)
    pub deceleration: u32,
    /// Starting velocity (typically 0)
    pub start_velocity: u32,
    /// Ending velocity (typically 0)
    pub end_velocity: u32,
}

/// Computed phase timing and distances
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrajectoryTiming {
    /// Time spent accelerating (µs)
    pub accel_time_us: u32,
    /// Time at cruise velocity (µs)
    pub cruise_time_us: u32,
    /// Time spent decelerating (µs)
    pub decel_time_us: u32,
    /// Total move time (µs)
    pub total_time_us: u32,
    /// Distance covered during acceleration (steps)
    pub accel_distance: i32,
    /// Distance at cruise velocity (steps)
    pub cruise_distance: i32,
    /// Distance covered during deceleration (steps)
    pub decel_distance: i32,
    /// Peak velocity actually reached (may be below the commanded maximum)
    pub peak_velocity: u32,
    /// True when the profile has no cruise segment
    pub is_triangle: bool,
}

/// Trajectory state reported by `update`
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrajectoryState {
    /// Current phase
    pub phase: TrajectoryPhase,
    /// Time since trajectory start (µs)
    pub elapsed_us: u32,
    /// Current signed position within the move (steps)
    pub position: i32,
    /// Current velocity magnitude (steps/s)
    pub velocity: u32,
    /// Signed distance remaining (steps)
    pub remaining: i32,
}

/// Trapezoidal trajectory interpolator
///
/// `plan` must be called before `start`; `update` is a no-op until `start`.
#[derive(Debug, Clone, Default)]
pub struct TrapezoidalTrajectory {
    params: TrajectoryParams,
    timing: TrajectoryTiming,
    phase: TrajectoryPhase,

    elapsed_us: u32,
    /// Position magnitude along the move; sign applied on report
    position: i32,
    velocity: u32,

    planned: bool,
    started: bool,
    direction: Direction,
}

impl TrapezoidalTrajectory {
    /// Create an idle trajectory
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a trajectory, computing phase timing and distances
    pub fn plan(&mut self, params: &TrajectoryParams) -> Result<(), PlanError> {
        if params.max_velocity == 0 {
            return Err(PlanError::ZeroVelocity);
        }
        if params.acceleration == 0 {
            return Err(PlanError::ZeroAcceleration);
        }

        self.params = *params;

        if self.params.deceleration == 0 {
            self.params.deceleration = self.params.acceleration;
        }

        self.direction = Direction::from_distance(self.params.distance);
        if self.params.distance < 0 {
            self.params.distance = -self.params.distance;
        }

        // Can the commanded velocity be reached?
        // d_accel = v²/(2a), d_decel = v²/(2d)
        let v = self.params.max_velocity as u64;
        let a = self.params.acceleration as u64;
        let d = self.params.deceleration as u64;

        let accel_dist = (v * v) / (2 * a);
        let decel_dist = (v * v) / (2 * d);

        if accel_dist + decel_dist <= self.params.distance as u64 {
            self.compute_trapezoid();
        } else {
            self.compute_triangle();
        }

        self.planned = true;
        self.started = false;
        self.phase = TrajectoryPhase::Idle;

        Ok(())
    }

    fn compute_trapezoid(&mut self) {
        let v = self.params.max_velocity as u64;
        let a = self.params.acceleration as u64;
        let d = self.params.deceleration as u64;

        self.timing.accel_distance = ((v * v) / (2 * a)) as i32;
        self.timing.accel_time_us = ((v * MICROS_PER_SEC) / a) as u32;

        self.timing.decel_distance = ((v * v) / (2 * d)) as i32;
        self.timing.decel_time_us = ((v * MICROS_PER_SEC) / d) as u32;

        self.timing.cruise_distance =
            self.params.distance - self.timing.accel_distance - self.timing.decel_distance;
        self.timing.cruise_time_us =
            ((self.timing.cruise_distance as u64 * MICROS_PER_SEC) / v) as u32;

        self.timing.total_time_us =
            self.timing.accel_time_us + self.timing.cruise_time_us + self.timing.decel_time_us;
        self.timing.peak_velocity = self.params.max_velocity;
        self.timing.is_triangle = false;
    }

    fn compute_triangle(&mut self) {
        // The peak velocity that exactly spends the distance on accel+decel:
        // v_peak² = 2·d_total·a·d / (a + d)
        let dist = self.params.distance as u64;
        let a = self.params.acceleration as u64;
        let d = self.params.deceleration as u64;

        let v_peak_sq = (2 * dist * a * d) as f64 / (a + d) as f64;
        let mut v_peak = libm::sqrt(v_peak_sq) as u32;

        if v_peak > self.params.max_velocity {
            v_peak = self.params.max_velocity;
        }

        self.timing.peak_velocity = v_peak;

        let v = v_peak as u64;
        self.timing.accel_distance = ((v * v) / (2 * a)) as i32;
        self.timing.accel_time_us = ((v * MICROS_PER_SEC) / a) as u32;

        // Remaining distance belongs to deceleration; rounding goes there.
        self.timing.decel_distance = self.params.distance - self.timing.accel_distance;
        self.timing.decel_time_us = ((v * MICROS_PER_SEC) / d) as u32;

        self.timing.cruise_distance = 0;
        self.timing.cruise_time_us = 0;

        self.timing.total_time_us = self.timing.accel_time_us + self.timing.decel_time_us;
        self.timing.is_triangle = true;
    }

    /// Begin execution from the start of the planned trajectory
    pub fn start(&mut self) {
        if !self.planned {
            return;
        }

        self.elapsed_us = 0;
        self.position = 0;
        self.velocity = self.params.start_velocity;
        self.phase = TrajectoryPhase::Accel;
        self.started = true;
    }

    /// Advance the trajectory by `dt_us` microseconds
    pub fn update(&mut self, dt_us: u32) -> TrajectoryState {
        if !self.started
            || self.phase == TrajectoryPhase::Idle
            || self.phase == TrajectoryPhase::Complete
        {
            return TrajectoryState {
                phase: self.phase,
                elapsed_us: self.elapsed_us,
                position: self.position * self.direction.sign(),
                velocity: 0,
                remaining: (self.params.distance - self.position) * self.direction.sign(),
            };
        }

        self.elapsed_us = self.elapsed_us.saturating_add(dt_us);

        match self.phase {
            TrajectoryPhase::Accel => self.update_accel(dt_us),
            TrajectoryPhase::Cruise => self.update_cruise(dt_us),
            TrajectoryPhase::Decel => self.update_decel(dt_us),
            _ => {}
        }

        TrajectoryState {
            phase: self.phase,
            elapsed_us: self.elapsed_us,
            position: self.position * self.direction.sign(),
            velocity: self.velocity,
            remaining: (self.params.distance - self.position) * self.direction.sign(),
        }
    }

    fn update_accel(&mut self, dt_us: u32) {
        let delta_v = (self.params.acceleration as u64 * dt_us as u64) / MICROS_PER_SEC;
        self.velocity = self.velocity.saturating_add(delta_v as u32);

        if self.velocity >= self.timing.peak_velocity {
            self.velocity = self.timing.peak_velocity;
        }

        let delta_pos = (self.velocity as u64 * dt_us as u64) / MICROS_PER_SEC;
        self.position += delta_pos as i32;

        if self.elapsed_us >= self.timing.accel_time_us {
            self.phase = if self.timing.is_triangle {
                TrajectoryPhase::Decel
            } else {
                TrajectoryPhase::Cruise
            };
        }
    }

    fn update_cruise(&mut self, dt_us: u32) {
        self.velocity = self.timing.peak_velocity;

        let delta_pos = (self.velocity as u64 * dt_us as u64) / MICROS_PER_SEC;
        self.position += delta_pos as i32;

        if self.elapsed_us >= self.timing.accel_time_us + self.timing.cruise_time_us {
            self.phase = TrajectoryPhase::Decel;
        }
    }

    fn update_decel(&mut self, dt_us: u32) {
        let delta_v = (self.params.deceleration as u64 * dt_us as u64) / MICROS_PER_SEC;

        if (delta_v as u32) < self.velocity {
            self.velocity -= delta_v as u32;
        } else {
            self.velocity = self.params.end_velocity;
        }

        let delta_pos = (self.velocity as u64 * dt_us as u64) / MICROS_PER_SEC;
        self.position += delta_pos as i32;

        if self.position >= self.params.distance || self.elapsed_us >= self.timing.total_time_us {
            self.position = self.params.distance;
            self.velocity = self.params.end_velocity;
            self.phase = TrajectoryPhase::Complete;
        }
    }

    /// Reset to idle, discarding the plan
    pub fn reset(&mut self) {
        self.phase = TrajectoryPhase::Idle;
        self.elapsed_us = 0;
        self.position = 0;
        self.velocity = 0;
        self.planned = false;
        self.started = false;
    }

    /// Current phase
    pub fn phase(&self) -> TrajectoryPhase {
        self.phase
    }

    /// Computed timing information
    pub fn timing(&self) -> &TrajectoryTiming {
        &self.timing
    }

    /// Check if the trajectory has finished
    pub fn is_complete(&self) -> bool {
        self.phase == TrajectoryPhase::Complete
    }

    /// Current velocity magnitude
    pub fn current_velocity(&self) -> u32 {
        self.velocity
    }

    /// Current signed position within the move
    pub fn current_position(&self) -> i32 {
        self.position * self.direction.sign()
    }

    /// Closed-form velocity at a time point from trajectory start
    ///
    /// Used for look-ahead; does not advance execution state.
    pub fn velocity_at(&self, time_us: u32) -> u32 {
        if !self.planned || time_us == 0 {
            return self.params.start_velocity;
        }

        if time_us >= self.timing.total_time_us {
            return self.params.end_velocity;
        }

        if time_us < self.timing.accel_time_us {
            let gained = (self.params.acceleration as u64 * time_us as u64) / MICROS_PER_SEC;
            return self.params.start_velocity + gained as u32;
        }

        let cruise_end = self.timing.accel_time_us + self.timing.cruise_time_us;
        if time_us < cruise_end {
            return self.timing.peak_velocity;
        }

        let decel_elapsed = time_us - cruise_end;
        let lost = ((self.params.deceleration as u64 * decel_elapsed as u64) / MICROS_PER_SEC) as u32;
        if lost >= self.timing.peak_velocity {
            self.params.end_velocity
        } else {
            self.timing.peak_velocity - lost
        }
    }

    /// Closed-form signed position at a time point from trajectory start
    ///
    /// Symbolic integration of the phase equations: `½at²` during accel,
    /// `vt` during cruise, `vt − ½dt²` during decel.
    pub fn position_at(&self, time_us: u32) -> i32 {
        if !self.planned || time_us == 0 {
            return 0;
        }

        if time_us >= self.timing.total_time_us {
            return self.params.distance * self.direction.sign();
        }

        if time_us < self.timing.accel_time_us {
            let t = time_us as u64;
            let a = self.params.acceleration as u64;
            let v0 = self.params.start_velocity as u64;

            let pos = (v0 * t) / MICROS_PER_SEC + (a * t * t) / (2 * MICROS_PER_SEC * MICROS_PER_SEC);
            return pos as i32 * self.direction.sign();
        }

        let cruise_end = self.timing.accel_time_us + self.timing.cruise_time_us;
        if time_us < cruise_end {
            let cruise_time = (time_us - self.timing.accel_time_us) as u64;
            let cruise_pos = (self.timing.peak_velocity as u64 * cruise_time) / MICROS_PER_SEC;
            return (self.timing.accel_distance + cruise_pos as i32) * self.direction.sign();
        }

        let base_pos = self.timing.accel_distance + self.timing.cruise_distance;
        let t = (time_us - cruise_end) as u64;
        let v0 = self.timing.peak_velocity as u64;
        let d = self.params.deceleration as u64;

        let decel_pos = (v0 * t) / MICROS_PER_SEC;
        let decel_loss = (d * t * t) / (2 * MICROS_PER_SEC * MICROS_PER_SEC);

        (base_pos + (decel_pos - decel_loss) as i32) * self.direction.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(distance: i32, v: u32, a: u32, d: u32) -> TrajectoryParams {
        TrajectoryParams {
            distance,
            max_velocity: v,
            acceleration: a,
            deceleration: d,
            start_velocity: 0,
            end_velocity: 0,
        }
    }

    #[test]
    fn test_plan_valid() {
        let mut traj = TrapezoidalTrajectory::new();
        assert!(traj.plan(&params(10_000, 10_000, 50_000, 50_000)).is_ok());
    }

    #[test]
    fn test_plan_zero_velocity_fails() {
        let mut traj = TrapezoidalTrajectory::new();
        assert_eq!(
            traj.plan(&params(10_000, 0, 50_000, 0)),
            Err(PlanError::ZeroVelocity)
        );
    }

    #[test]
    fn test_plan_zero_acceleration_fails() {
        let mut traj = TrapezoidalTrajectory::new();
        assert_eq!(
            traj.plan(&params(10_000, 10_000, 0, 0)),
            Err(PlanError::ZeroAcceleration)
        );
    }

    #[test]
    fn test_starts_idle() {
        let traj = TrapezoidalTrajectory::new();
        assert_eq!(traj.phase(), TrajectoryPhase::Idle);
    }

    #[test]
    fn test_decel_inherits_accel() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100_000, 10_000, 50_000, 0)).unwrap();
        let timing = traj.timing();
        assert_eq!(timing.accel_time_us, timing.decel_time_us);
        assert_eq!(timing.accel_distance, timing.decel_distance);
    }

    #[test]
    fn test_timing_trapezoidal() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100_000, 10_000, 50_000, 50_000)).unwrap();
        let timing = traj.timing();

        assert!(!timing.is_triangle);
        assert_eq!(timing.peak_velocity, 10_000);
        // d = v²/(2a) = 10⁸ / 10⁵ = 1000 steps, t = v/a = 200 ms
        assert_eq!(timing.accel_distance, 1_000);
        assert_eq!(timing.accel_time_us, 200_000);
        assert_eq!(timing.cruise_distance, 98_000);
        assert_eq!(timing.cruise_time_us, 9_800_000);
    }

    #[test]
    fn test_timing_triangular() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100, 10_000, 50_000, 50_000)).unwrap();
        let timing = traj.timing();

        assert!(timing.is_triangle);
        assert!(timing.peak_velocity < 10_000);
        assert_eq!(timing.cruise_distance, 0);
        assert_eq!(timing.cruise_time_us, 0);
        // v_peak = √(2·100·a·d/(a+d)) = √(5·10⁶) ≈ 2236
        assert_eq!(timing.peak_velocity, 2_236);
    }

    #[test]
    fn test_distance_sums_correctly() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(50_000, 10_000, 25_000, 25_000)).unwrap();
        let timing = traj.timing();

        let total = timing.accel_distance + timing.cruise_distance + timing.decel_distance;
        assert!((total - 50_000).abs() <= 1);
    }

    #[test]
    fn test_triangle_distance_sums_exactly() {
        // Triangular rounding goes into the decel segment
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(333, 10_000, 47_000, 31_000)).unwrap();
        let timing = traj.timing();
        assert!(timing.is_triangle);
        assert_eq!(timing.accel_distance + timing.decel_distance, 333);
    }

    #[test]
    fn test_start_changes_phase() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(10_000, 10_000, 50_000, 0)).unwrap();
        traj.start();
        assert_eq!(traj.phase(), TrajectoryPhase::Accel);
    }

    #[test]
    fn test_update_before_start_is_noop() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(10_000, 10_000, 50_000, 0)).unwrap();
        let state = traj.update(1_000);
        assert_eq!(state.phase, TrajectoryPhase::Idle);
        assert_eq!(state.position, 0);
        assert_eq!(state.velocity, 0);
    }

    #[test]
    fn test_update_zero_dt_is_safe() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100_000, 10_000, 50_000, 0)).unwrap();
        traj.start();
        traj.update(1_000);
        let v = traj.current_velocity();
        let p = traj.current_position();
        let state = traj.update(0);
        assert_eq!(state.velocity, v);
        assert_eq!(state.position, p);
    }

    #[test]
    fn test_update_increases_velocity_and_position() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100_000, 10_000, 50_000, 50_000)).unwrap();
        traj.start();

        let v1 = traj.current_velocity();
        traj.update(1_000);
        let v2 = traj.current_velocity();
        assert!(v2 > v1);

        let p1 = traj.current_position();
        traj.update(10_000);
        let p2 = traj.current_position();
        assert!(p2 > p1);
    }

    #[test]
    fn test_velocity_monotone_per_phase() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(50_000, 10_000, 50_000, 50_000)).unwrap();
        traj.start();

        let mut last_v = 0u32;
        loop {
            let state = traj.update(1_000);
            match state.phase {
                TrajectoryPhase::Accel => assert!(state.velocity >= last_v),
                TrajectoryPhase::Cruise => assert_eq!(state.velocity, 10_000),
                TrajectoryPhase::Decel => assert!(state.velocity <= last_v),
                TrajectoryPhase::Complete => break,
                TrajectoryPhase::Idle => unreachable!(),
            }
            last_v = state.velocity;
        }
    }

    #[test]
    fn test_reaches_complete_and_snaps_position() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(1_000, 10_000, 100_000, 100_000)).unwrap();
        traj.start();

        let mut iterations = 0;
        while !traj.is_complete() && iterations < 10_000 {
            traj.update(100);
            iterations += 1;
        }

        assert!(traj.is_complete());
        assert_eq!(traj.current_position(), 1_000);
        assert_eq!(traj.current_velocity(), 0);

        // Further updates keep reporting the final position
        let state = traj.update(1_000);
        assert_eq!(state.position, 1_000);
        assert_eq!(state.remaining, 0);
    }

    #[test]
    fn test_negative_distance_reports_signed_position() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(-1_000, 10_000, 100_000, 100_000)).unwrap();
        traj.start();

        let state = traj.update(10_000);
        assert!(state.position <= 0);

        let mut iterations = 0;
        while !traj.is_complete() && iterations < 10_000 {
            traj.update(1_000);
            iterations += 1;
        }
        assert_eq!(traj.current_position(), -1_000);
    }

    #[test]
    fn test_velocity_at_piecewise() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100_000, 10_000, 50_000, 50_000)).unwrap();

        assert_eq!(traj.velocity_at(0), 0);
        // Mid-accel at 100 ms: v = a·t = 5000
        assert_eq!(traj.velocity_at(100_000), 5_000);
        // Cruise
        assert_eq!(traj.velocity_at(1_000_000), 10_000);
        // Mid-decel: 100 ms after cruise end
        let cruise_end = traj.timing().accel_time_us + traj.timing().cruise_time_us;
        assert_eq!(traj.velocity_at(cruise_end + 100_000), 5_000);
        // Past the end
        assert_eq!(traj.velocity_at(traj.timing().total_time_us), 0);
    }

    #[test]
    fn test_position_at_piecewise() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(100_000, 10_000, 50_000, 50_000)).unwrap();

        // End of accel: ½at² = ½·50000·0.04 = 1000
        assert_eq!(traj.position_at(200_000), 1_000);
        // Past the end: full signed distance
        assert_eq!(traj.position_at(traj.timing().total_time_us), 100_000);
        // One second into cruise: 1000 + 10000·0.8
        assert_eq!(traj.position_at(1_000_000), 9_000);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut traj = TrapezoidalTrajectory::new();
        traj.plan(&params(10_000, 10_000, 50_000, 0)).unwrap();
        traj.start();
        traj.update(1_000);

        traj.reset();
        assert_eq!(traj.phase(), TrajectoryPhase::Idle);
        assert_eq!(traj.current_velocity(), 0);

        // A reset trajectory needs a fresh plan before start works
        traj.start();
        let state = traj.update(1_000);
        assert_eq!(state.phase, TrajectoryPhase::Idle);
    }
}
