//! Trajectory planning and execution
//!
//! Two profile families share one shape: `plan` validates parameters and
//! precomputes phase timing, `start` arms execution, and `update(dt_us)`
//! advances velocity and position in fixed-point integer arithmetic.
//!
//! Distances are planned as unsigned magnitudes; the sign lives in a
//! direction member and is re-applied only on reported positions. Times are
//! microseconds, velocities steps/s, accelerations steps/s².

pub mod scurve;
pub mod trapezoid;

pub use scurve::{SCurveParams, SCurvePhase, SCurveState, SCurveTiming, SCurveTrajectory};
pub use trapezoid::{
    TrajectoryParams, TrajectoryPhase, TrajectoryState, TrajectoryTiming, TrapezoidalTrajectory,
};

/// Errors rejected at plan time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// Maximum velocity is zero
    ZeroVelocity,
    /// Acceleration is zero
    ZeroAcceleration,
    /// Jerk is zero (S-curve only)
    ZeroJerk,
}

/// Profile family selected for a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProfileKind {
    /// Linear acceleration (trapezoidal velocity profile)
    #[default]
    Trapezoidal,
    /// Jerk-limited seven-segment S-curve
    SCurve,
}

pub(crate) const MICROS_PER_SEC: u64 = 1_000_000;
