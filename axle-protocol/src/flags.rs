//! Error flag bitmask
//!
//! Sticky error word returned by `get error` and attached to `status`
//! responses. Flags are latched by the firmware and are not cleared by
//! reading.

use bitflags::bitflags;

bitflags! {
    /// Controller error flags (bitfield, little-endian u16 on the wire)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ErrorFlags: u16 {
        /// CRC check failed on a received frame
        const CRC_FAIL      = 0x0001;
        /// Unknown command id
        const INVALID_CMD   = 0x0002;
        /// Invalid parameter id or value
        const INVALID_PARAM = 0x0004;
        /// Driver over temperature
        const OVERTEMP      = 0x0008;
        /// Motor over current
        const OVERCURRENT   = 0x0010;
        /// Limit switch triggered
        const LIMIT_HIT     = 0x0020;
        /// Emergency stop active
        const ESTOP         = 0x0040;
        /// Host communication timeout
        const COMM_TIMEOUT  = 0x0080;
        /// Encoder read error
        const ENCODER_FAULT = 0x0100;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ErrorFlags({=u16:#x})", self.bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(ErrorFlags::CRC_FAIL.bits(), 0x0001);
        assert_eq!(ErrorFlags::ESTOP.bits(), 0x0040);
        assert_eq!(ErrorFlags::ENCODER_FAULT.bits(), 0x0100);
    }

    #[test]
    fn test_flags_accumulate() {
        let mut flags = ErrorFlags::empty();
        flags |= ErrorFlags::CRC_FAIL;
        flags |= ErrorFlags::COMM_TIMEOUT;
        assert_eq!(flags.bits(), 0x0081);
        assert!(flags.contains(ErrorFlags::CRC_FAIL));
        assert!(!flags.contains(ErrorFlags::ESTOP));
    }
}
