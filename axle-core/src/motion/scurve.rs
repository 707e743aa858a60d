//! Seven-segment S-curve (jerk-limited) trajectory
//!
//! Velocity profile with limited jerk for smoother motion:
//!
//! ```text
//!           ___________
//!          /           \
//!         /             \
//!        /               \
//!   ____/                 \____
//!   J+ A J-    C    J- D J+
//!    (accel)  (cruise) (decel)
//! ```
//!
//! Compared to the trapezoidal profile, acceleration changes are ramped at
//! a bounded rate instead of stepping instantaneously. The acceleration
//! halves are symmetric around the cruise segment; the cruise segment may
//! be empty, and for short moves the constant-acceleration segments
//! collapse as well (reduced profile).

use crate::traits::Direction;

use super::{PlanError, MICROS_PER_SEC};

/// Phase of the seven-segment profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SCurvePhase {
    /// No active trajectory
    #[default]
    Idle,
    /// J1: acceleration ramping up
    JerkAccelRise,
    /// A: constant maximum acceleration
    ConstAccel,
    /// J2: acceleration ramping down to zero
    JerkAccelFall,
    /// C: constant velocity
    Cruise,
    /// J3: deceleration ramping up
    JerkDecelRise,
    /// D: constant maximum deceleration
    ConstDecel,
    /// J4: deceleration ramping back to zero
    JerkDecelFall,
    /// Trajectory finished
    Complete,
}

/// S-curve trajectory parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SCurveParams {
    /// Total distance in steps (sign selects direction)
    pub distance: i32,
    /// Maximum velocity in steps/s
    pub max_velocity: u32,
    /// Maximum acceleration in steps/s²
    pub max_acceleration: u32,
    /// Maximum jerk in steps/s³
    pub max_jerk: u32,
}

/// Computed timing for the seven segments
///
/// The two jerk segments of each half share one duration; the profile is
/// symmetric around the midpoint.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SCurveTiming {
    /// Duration of each jerk segment in the acceleration half (µs)
    pub t_jerk_accel: u32,
    /// Duration of the constant-acceleration segment (µs)
    pub t_const_accel: u32,
    /// Duration of the cruise segment (µs)
    pub t_cruise: u32,
    /// Duration of each jerk segment in the deceleration half (µs)
    pub t_jerk_decel: u32,
    /// Duration of the constant-deceleration segment (µs)
    pub t_const_decel: u32,
    /// Total move time (µs)
    pub total_time_us: u32,
    /// Peak velocity actually achieved
    pub v_achieved: u32,
    /// Peak acceleration actually achieved
    pub a_achieved: u32,
    /// True when the profile was reduced for a short move
    pub is_reduced: bool,
}

/// S-curve state reported by `update`
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SCurveState {
    /// Current phase
    pub phase: SCurvePhase,
    /// Time since trajectory start (µs)
    pub elapsed_us: u32,
    /// Current signed position within the move (steps)
    pub position: i32,
    /// Current velocity magnitude (steps/s)
    pub velocity: u32,
    /// Current acceleration (steps/s², negative while decelerating)
    pub acceleration: i32,
}

/// Jerk-limited trajectory interpolator
#[derive(Debug, Clone, Default)]
pub struct SCurveTrajectory {
    params: SCurveParams,
    timing: SCurveTiming,
    phase: SCurvePhase,

    elapsed_us: u32,
    phase_elapsed_us: u32,
    /// Position magnitude along the move; sign applied on report
    position: i32,
    velocity: u32,
    acceleration: i32,

    planned: bool,
    started: bool,
    direction: Direction,

    // Cumulative phase boundary times; t_end_j4 == total_time_us
    t_end_j1: u32,
    t_end_a: u32,
    t_end_j2: u32,
    t_end_c: u32,
    t_end_j3: u32,
    t_end_d: u32,
}

/// Distance covered by one rising jerk segment, derived from the velocity
/// it gains: d = (1/6)·j·t³ = v_gained·t / 3.
///
/// Computed through the gained velocity to keep intermediates inside u64
/// for jerk times up to the full u32 microsecond range.
fn jerk_segment_distance(v_gained: u64, t_j_us: u64) -> u64 {
    (v_gained * t_j_us) / (3 * MICROS_PER_SEC)
}

/// Velocity gained by one jerk segment: ½·j·t².
fn jerk_segment_velocity(jerk: u64, t_j_us: u64) -> u64 {
    (jerk * t_j_us * t_j_us) / (2 * MICROS_PER_SEC * MICROS_PER_SEC)
}

impl SCurveTrajectory {
    /// Create an idle trajectory
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan an S-curve trajectory
    ///
    /// Computes the seven-segment timing; short moves reduce peak velocity
    /// (and, below the jerk threshold, peak acceleration).
    pub fn plan(&mut self, params: &SCurveParams) -> Result<(), PlanError> {
        if params.max_velocity == 0 {
            return Err(PlanError::ZeroVelocity);
        }
        if params.max_acceleration == 0 {
            return Err(PlanError::ZeroAcceleration);
        }
        if params.max_jerk == 0 {
            return Err(PlanError::ZeroJerk);
        }

        self.params = *params;

        self.direction = Direction::from_distance(self.params.distance);
        if self.params.distance < 0 {
            self.params.distance = -self.params.distance;
        }

        let j = self.params.max_jerk as u64;
        let a = self.params.max_acceleration as u64;
        let v = self.params.max_velocity as u64;

        // Velocity gained during one full jerk ramp: a_max²/(2·j_max).
        // If two ramps alone exceed v_max, max acceleration is unreachable.
        let v_jerk = (a * a) / (2 * j);

        if 2 * v_jerk >= v {
            self.compute_reduced_profile();
        } else {
            self.compute_full_profile();
        }

        self.t_end_j1 = self.timing.t_jerk_accel;
        self.t_end_a = self.t_end_j1 + self.timing.t_const_accel;
        self.t_end_j2 = self.t_end_a + self.timing.t_jerk_accel;
        self.t_end_c = self.t_end_j2 + self.timing.t_cruise;
        self.t_end_j3 = self.t_end_c + self.timing.t_jerk_decel;
        self.t_end_d = self.t_end_j3 + self.timing.t_const_decel;

        self.planned = true;
        self.started = false;
        self.phase = SCurvePhase::Idle;

        Ok(())
    }

    fn compute_full_profile(&mut self) {
        let j = self.params.max_jerk as u64;
        let a = self.params.max_acceleration as u64;
        let v = self.params.max_velocity as u64;

        self.timing.t_jerk_accel = ((a * MICROS_PER_SEC) / j) as u32;
        self.timing.t_jerk_decel = self.timing.t_jerk_accel;

        let v_jerk = (a * a) / (2 * j);
        let v_const_accel = v - 2 * v_jerk;

        self.timing.t_const_accel = ((v_const_accel * MICROS_PER_SEC) / a) as u32;
        self.timing.t_const_decel = self.timing.t_const_accel;

        // Symbolic integration of the acceleration half:
        //   J1: d = (1/6)·j·t³          A: d = v₁·t + ½·a·t²
        //   J2: d = v₂·t + ½·a·t² − (1/6)·j·t³
        let t_j = self.timing.t_jerk_accel as u64;
        let t_a = self.timing.t_const_accel as u64;

        let v_end_j1 = jerk_segment_velocity(j, t_j);
        let d_j1 = jerk_segment_distance(v_end_j1, t_j);

        let d_a = (v_end_j1 * t_a) / MICROS_PER_SEC
            + (a * t_a * t_a) / (2 * MICROS_PER_SEC * MICROS_PER_SEC);
        let v_end_a = v_end_j1 + (a * t_a) / MICROS_PER_SEC;

        let d_j2 = (v_end_a * t_j) / MICROS_PER_SEC
            + (a * t_j * t_j) / (2 * MICROS_PER_SEC * MICROS_PER_SEC)
            - d_j1;

        let total_accel_dist = d_j1 + d_a + d_j2;
        let total_decel_dist = total_accel_dist; // symmetric

        let cruise_dist =
            self.params.distance as i64 - (total_accel_dist + total_decel_dist) as i64;

        if cruise_dist < 0 {
            // Max velocity is unreachable within the distance
            self.compute_reduced_profile();
            return;
        }

        self.timing.t_cruise = ((cruise_dist as u64 * MICROS_PER_SEC) / v) as u32;

        self.timing.v_achieved = v as u32;
        self.timing.a_achieved = a as u32;
        self.timing.is_reduced = false;

        self.timing.total_time_us = 2 * self.timing.t_jerk_accel
            + self.timing.t_const_accel
            + self.timing.t_cruise
            + 2 * self.timing.t_jerk_decel
            + self.timing.t_const_decel;
    }

    fn compute_reduced_profile(&mut self) {
        let j = self.params.max_jerk as u64;
        let a = self.params.max_acceleration as u64;
        let dist = self.params.distance as u64;

        // Binary search the largest achievable peak velocity. The distance
        // function is monotone in v_peak, so 32 halvings pin it exactly.
        let mut v_low: u32 = 0;
        let mut v_high: u32 = self.params.max_velocity;
        let mut v_achieved: u32 = 0;

        for _ in 0..32 {
            let v_try = (v_low + v_high) / 2;
            if v_try == 0 {
                break;
            }

            let mut t_j = (a * MICROS_PER_SEC) / j;
            let v_jerk = (a * a) / (2 * j);

            if v_try as u64 <= 2 * v_jerk {
                // Shorter jerk ramps: v_peak = j·t², so t = √(v_peak/j)
                let t_j_s = libm::sqrt(v_try as f64 / j as f64);
                t_j = (t_j_s * 1_000_000.0) as u64;
            }

            let v_const = (v_try as u64).saturating_sub(2 * v_jerk);
            let t_a = if v_const > 0 {
                (v_const * MICROS_PER_SEC) / a
            } else {
                0
            };

            let v_end_j1 = jerk_segment_velocity(j, t_j);
            let d_j1 = jerk_segment_distance(v_end_j1, t_j);
            let d_a = (v_end_j1 * t_a) / MICROS_PER_SEC
                + (a * t_a * t_a) / (2 * MICROS_PER_SEC * MICROS_PER_SEC);
            let v_end_a = v_end_j1 + (a * t_a) / MICROS_PER_SEC;
            let d_j2 = (v_end_a * t_j) / MICROS_PER_SEC;

            let total_dist = 2 * (d_j1 + d_a + d_j2); // accel + decel halves

            if total_dist <= dist {
                v_achieved = v_try;
                v_low = v_try + 1;
            } else {
                v_high = v_try - 1;
            }
        }

        if v_achieved == 0 {
            v_achieved = 100; // floor for degenerate short moves
        }

        let v_jerk = (a * a) / (2 * j);
        let t_j;

        if v_achieved as u64 <= 2 * v_jerk {
            let t_j_s = libm::sqrt(v_achieved as f64 / j as f64);
            t_j = (t_j_s * 1_000_000.0) as u64;
            self.timing.t_const_accel = 0;
            self.timing.t_const_decel = 0;
            self.timing.a_achieved = ((j * t_j) / MICROS_PER_SEC) as u32;
        } else {
            t_j = (a * MICROS_PER_SEC) / j;
            let v_const = v_achieved as u64 - 2 * v_jerk;
            self.timing.t_const_accel = ((v_const * MICROS_PER_SEC) / a) as u32;
            self.timing.t_const_decel = self.timing.t_const_accel;
            self.timing.a_achieved = a as u32;
        }

        self.timing.t_jerk_accel = t_j as u32;
        self.timing.t_jerk_decel = self.timing.t_jerk_accel;
        self.timing.t_cruise = 0;
        self.timing.v_achieved = v_achieved;
        self.timing.is_reduced = true;

        self.timing.total_time_us = 2 * self.timing.t_jerk_accel
            + self.timing.t_const_accel
            + 2 * self.timing.t_jerk_decel
            + self.timing.t_const_decel;
    }

    /// Begin execution from the start of the planned trajectory
    pub fn start(&mut self) {
        if !self.planned {
            return;
        }

        self.elapsed_us = 0;
        self.phase_elapsed_us = 0;
        self.position = 0;
        self.velocity = 0;
        self.acceleration = 0;
        self.started = true;
        self.phase = SCurvePhase::JerkAccelRise;
    }

    /// Advance the trajectory by `dt_us` microseconds
    pub fn update(&mut self, dt_us: u32) -> SCurveState {
        if !self.started || self.phase == SCurvePhase::Idle || self.phase == SCurvePhase::Complete
        {
            return self.state();
        }

        self.elapsed_us = self.elapsed_us.saturating_add(dt_us);
        self.phase_elapsed_us = self.phase_elapsed_us.saturating_add(dt_us);

        self.check_phase_transition();

        let jerk = self.params.max_jerk as i64;
        match self.phase {
            SCurvePhase::JerkAccelRise => self.update_jerk_up(dt_us, jerk),
            SCurvePhase::ConstAccel => self.update_const_accel(dt_us),
            SCurvePhase::JerkAccelFall => self.update_jerk_down(dt_us, jerk),
            SCurvePhase::Cruise => self.update_cruise(dt_us),
            SCurvePhase::JerkDecelRise => self.update_jerk_down(dt_us, jerk),
            SCurvePhase::ConstDecel => self.update_const_decel(dt_us),
            // Jerk returns the deceleration to zero
            SCurvePhase::JerkDecelFall => self.update_jerk_up(dt_us, jerk),
            _ => {}
        }

        self.state()
    }

    fn state(&self) -> SCurveState {
        SCurveState {
            phase: self.phase,
            elapsed_us: self.elapsed_us,
            position: self.position * self.direction.sign(),
            velocity: self.velocity,
            acceleration: self.acceleration,
        }
    }

    fn check_phase_transition(&mut self) {
        match self.phase {
            SCurvePhase::JerkAccelRise => {
                if self.elapsed_us >= self.t_end_j1 {
                    self.phase = if self.timing.t_const_accel > 0 {
                        SCurvePhase::ConstAccel
                    } else {
                        SCurvePhase::JerkAccelFall
                    };
                    self.phase_elapsed_us = 0;
                    self.acceleration = self.timing.a_achieved as i32;
                }
            }
            SCurvePhase::ConstAccel => {
                if self.elapsed_us >= self.t_end_a {
                    self.phase = SCurvePhase::JerkAccelFall;
                    self.phase_elapsed_us = 0;
                }
            }
            SCurvePhase::JerkAccelFall => {
                if self.elapsed_us >= self.t_end_j2 {
                    self.phase = if self.timing.t_cruise > 0 {
                        SCurvePhase::Cruise
                    } else {
                        SCurvePhase::JerkDecelRise
                    };
                    self.phase_elapsed_us = 0;
                    self.acceleration = 0;
                    self.velocity = self.timing.v_achieved;
                }
            }
            SCurvePhase::Cruise => {
                if self.elapsed_us >= self.t_end_c {
                    self.phase = SCurvePhase::JerkDecelRise;
                    self.phase_elapsed_us = 0;
                }
            }
            SCurvePhase::JerkDecelRise => {
                if self.elapsed_us >= self.t_end_j3 {
                    self.phase = if self.timing.t_const_decel > 0 {
                        SCurvePhase::ConstDecel
                    } else {
                        SCurvePhase::JerkDecelFall
                    };
                    self.phase_elapsed_us = 0;
                    self.acceleration = -(self.timing.a_achieved as i32);
                }
            }
            SCurvePhase::ConstDecel => {
                if self.elapsed_us >= self.t_end_d {
                    self.phase = SCurvePhase::JerkDecelFall;
                    self.phase_elapsed_us = 0;
                }
            }
            SCurvePhase::JerkDecelFall => {
                if self.elapsed_us >= self.timing.total_time_us {
                    self.phase = SCurvePhase::Complete;
                    self.velocity = 0;
                    self.acceleration = 0;
                    self.position = self.params.distance;
                }
            }
            _ => {}
        }
    }

    fn update_jerk_up(&mut self, dt_us: u32, jerk: i64) {
        let da = (jerk * dt_us as i64) / MICROS_PER_SEC as i64;
        self.acceleration += da as i32;

        self.integrate_velocity(dt_us);
        self.integrate_position(dt_us);
    }

    fn update_jerk_down(&mut self, dt_us: u32, jerk: i64) {
        let da = (jerk * dt_us as i64) / MICROS_PER_SEC as i64;
        self.acceleration -= da as i32;

        self.integrate_velocity(dt_us);
        self.integrate_position(dt_us);
    }

    fn update_const_accel(&mut self, dt_us: u32) {
        self.integrate_velocity(dt_us);
        self.integrate_position(dt_us);
    }

    fn update_cruise(&mut self, dt_us: u32) {
        self.integrate_position(dt_us);
    }

    fn update_const_decel(&mut self, dt_us: u32) {
        self.integrate_velocity(dt_us);
        self.integrate_position(dt_us);
    }

    // v' = v + a·dt, clamped at zero from below
    fn integrate_velocity(&mut self, dt_us: u32) {
        let dv = (self.acceleration as i64 * dt_us as i64) / MICROS_PER_SEC as i64;
        if dv < 0 && (-dv) as u64 > self.velocity as u64 {
            self.velocity = 0;
        } else {
            self.velocity = (self.velocity as i64 + dv) as u32;
        }
    }

    // s' = s + v'·dt, using the already-updated velocity
    fn integrate_position(&mut self, dt_us: u32) {
        let dp = (self.velocity as i64 * dt_us as i64) / MICROS_PER_SEC as i64;
        self.position += dp as i32;
    }

    /// Reset to idle, discarding the plan
    pub fn reset(&mut self) {
        self.phase = SCurvePhase::Idle;
        self.elapsed_us = 0;
        self.phase_elapsed_us = 0;
        self.position = 0;
        self.velocity = 0;
        self.acceleration = 0;
        self.started = false;
        self.planned = false;
    }

    /// Current phase
    pub fn phase(&self) -> SCurvePhase {
        self.phase
    }

    /// Computed timing information
    pub fn timing(&self) -> &SCurveTiming {
        &self.timing
    }

    /// Check if the trajectory has finished
    pub fn is_complete(&self) -> bool {
        self.phase == SCurvePhase::Complete
    }

    /// Current velocity magnitude
    pub fn current_velocity(&self) -> u32 {
        self.velocity
    }

    /// Current signed position within the move
    pub fn current_position(&self) -> i32 {
        self.position * self.direction.sign()
    }

    /// Current acceleration (negative while decelerating)
    pub fn current_acceleration(&self) -> i32 {
        self.acceleration
    }
}
