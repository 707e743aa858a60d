//! Safety monitoring and fault latching
//!
//! The safety task feeds inputs into the monitor (temperature, current,
//! limit switch, e-stop, host link activity) and calls `check` every
//! iteration. The first violated condition latches; latched flags are
//! sticky until explicitly cleared and are reported through the error-flag
//! word on the link.

use axle_protocol::ErrorFlags;

/// Host-link inactivity timeout before CommTimeout latches (ms)
pub const COMM_TIMEOUT_MS: u32 = 3_000;

/// Over-temperature threshold in 0.1 °C units (85.0 °C)
pub const MAX_TEMPERATURE_DECIC: i16 = 850;

/// Latching fault kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    OverTemp,
    OverCurrent,
    LimitHit,
    EStop,
    EncoderFault,
    CommTimeout,
}

impl FaultKind {
    /// The error-flag bit latched by this fault
    pub fn flag(self) -> ErrorFlags {
        match self {
            FaultKind::OverTemp => ErrorFlags::OVERTEMP,
            FaultKind::OverCurrent => ErrorFlags::OVERCURRENT,
            FaultKind::LimitHit => ErrorFlags::LIMIT_HIT,
            FaultKind::EStop => ErrorFlags::ESTOP,
            FaultKind::EncoderFault => ErrorFlags::ENCODER_FAULT,
            FaultKind::CommTimeout => ErrorFlags::COMM_TIMEOUT,
        }
    }
}

/// Safety monitor for the axis
///
/// Tracks raw inputs and decides when a fault condition latches. Link and
/// parameter errors (CRC failures, bad commands) are also accumulated here
/// so the `get error` response reflects everything in one word.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    /// Last temperature reading (0.1 °C), None if the sensor faulted
    temp_decic: Option<i16>,
    over_current: bool,
    limit_hit: bool,
    estop: bool,
    encoder_fault: bool,
    /// Time since the last valid host frame (ms)
    time_since_host_ms: u32,
    comm_timeout_ms: u32,
    /// Sticky error word; default is non-clearing on read
    flags: ErrorFlags,
    /// Currently latched fault, if any
    latched: Option<FaultKind>,
}

impl Default for SafetyMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyMonitor {
    /// Create a monitor with the default communication timeout
    pub fn new() -> Self {
        Self::with_comm_timeout(COMM_TIMEOUT_MS)
    }

    /// Create a monitor with a custom communication timeout
    pub fn with_comm_timeout(comm_timeout_ms: u32) -> Self {
        Self {
            temp_decic: None,
            over_current: false,
            limit_hit: false,
            estop: false,
            encoder_fault: false,
            time_since_host_ms: 0,
            comm_timeout_ms,
            flags: ErrorFlags::empty(),
            latched: None,
        }
    }

    /// Update the temperature reading (0.1 °C units)
    pub fn update_temperature(&mut self, temp_decic: Option<i16>) {
        self.temp_decic = temp_decic;
    }

    /// Update the over-current input
    pub fn update_over_current(&mut self, over_current: bool) {
        self.over_current = over_current;
    }

    /// Update the limit switch input
    pub fn update_limit(&mut self, hit: bool) {
        self.limit_hit = hit;
    }

    /// Update the emergency-stop input
    pub fn update_estop(&mut self, active: bool) {
        self.estop = active;
    }

    /// Update the encoder health input
    pub fn update_encoder_fault(&mut self, fault: bool) {
        self.encoder_fault = fault;
    }

    /// Record a valid frame received from the host
    pub fn host_activity(&mut self) {
        self.time_since_host_ms = 0;
    }

    /// Advance the inactivity clock
    pub fn update_time(&mut self, delta_ms: u32) {
        self.time_since_host_ms = self.time_since_host_ms.saturating_add(delta_ms);
    }

    /// Record a link-level error (CRC failure, unknown command, bad
    /// parameter) in the sticky error word
    pub fn record_link_error(&mut self, flag: ErrorFlags) {
        self.flags |= flag;
    }

    /// Check all conditions, latching and returning the first new fault
    ///
    /// Returns None while no fault condition is present or when a fault is
    /// already latched.
    pub fn check(&mut self) -> Option<FaultKind> {
        if self.latched.is_some() {
            return None;
        }

        let fault = if self.estop {
            Some(FaultKind::EStop)
        } else if self.over_current {
            Some(FaultKind::OverCurrent)
        } else if self.temp_decic.is_some_and(|t| t > MAX_TEMPERATURE_DECIC) {
            Some(FaultKind::OverTemp)
        } else if self.limit_hit {
            Some(FaultKind::LimitHit)
        } else if self.encoder_fault {
            Some(FaultKind::EncoderFault)
        } else if self.time_since_host_ms >= self.comm_timeout_ms {
            Some(FaultKind::CommTimeout)
        } else {
            None
        };

        if let Some(kind) = fault {
            self.flags |= kind.flag();
            self.latched = Some(kind);
        }
        fault
    }

    /// Currently latched fault, if any
    pub fn latched(&self) -> Option<FaultKind> {
        self.latched
    }

    /// The sticky error word
    pub fn flags(&self) -> ErrorFlags {
        self.flags
    }

    /// Clear the latched fault and its flag bit
    ///
    /// Input conditions are not reset; a still-present condition latches
    /// again on the next check.
    pub fn clear_fault(&mut self) {
        if let Some(kind) = self.latched.take() {
            self.flags &= !kind.flag();
        }
        self.time_since_host_ms = 0;
    }

    /// Clear the whole error word (link error bits included)
    pub fn clear_flags(&mut self) {
        self.flags = ErrorFlags::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_operation() {
        let mut monitor = SafetyMonitor::new();
        monitor.update_temperature(Some(450));
        assert_eq!(monitor.check(), None);
        assert_eq!(monitor.flags(), ErrorFlags::empty());
    }

    #[test]
    fn test_over_temperature_latches() {
        let mut monitor = SafetyMonitor::new();
        monitor.update_temperature(Some(MAX_TEMPERATURE_DECIC + 10));
        assert_eq!(monitor.check(), Some(FaultKind::OverTemp));
        assert!(monitor.flags().contains(ErrorFlags::OVERTEMP));

        // Already latched: no repeated report
        assert_eq!(monitor.check(), None);
        assert_eq!(monitor.latched(), Some(FaultKind::OverTemp));
    }

    #[test]
    fn test_estop_takes_priority() {
        let mut monitor = SafetyMonitor::new();
        monitor.update_temperature(Some(900));
        monitor.update_estop(true);
        assert_eq!(monitor.check(), Some(FaultKind::EStop));
    }

    #[test]
    fn test_comm_timeout() {
        let mut monitor = SafetyMonitor::with_comm_timeout(1_000);
        monitor.update_temperature(Some(400));

        monitor.update_time(600);
        assert_eq!(monitor.check(), None);

        monitor.update_time(600);
        assert_eq!(monitor.check(), Some(FaultKind::CommTimeout));
        assert!(monitor.flags().contains(ErrorFlags::COMM_TIMEOUT));
    }

    #[test]
    fn test_host_activity_resets_timeout() {
        let mut monitor = SafetyMonitor::with_comm_timeout(1_000);
        monitor.update_temperature(Some(400));

        monitor.update_time(900);
        monitor.host_activity();
        monitor.update_time(900);
        assert_eq!(monitor.check(), None);
    }

    #[test]
    fn test_clear_fault_relatches_if_condition_persists() {
        let mut monitor = SafetyMonitor::new();
        monitor.update_limit(true);
        assert_eq!(monitor.check(), Some(FaultKind::LimitHit));

        monitor.clear_fault();
        assert_eq!(monitor.latched(), None);
        assert!(!monitor.flags().contains(ErrorFlags::LIMIT_HIT));

        // Condition still present: latches again
        assert_eq!(monitor.check(), Some(FaultKind::LimitHit));
    }

    #[test]
    fn test_link_errors_are_sticky() {
        let mut monitor = SafetyMonitor::new();
        monitor.update_temperature(Some(400));
        monitor.record_link_error(ErrorFlags::CRC_FAIL);
        monitor.record_link_error(ErrorFlags::INVALID_CMD);

        assert_eq!(
            monitor.flags(),
            ErrorFlags::CRC_FAIL | ErrorFlags::INVALID_CMD
        );
        // Link errors never latch a fault
        assert_eq!(monitor.check(), None);
    }
}
