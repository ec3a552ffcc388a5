//! # Timestamp
//!
//! Seconds since the Unix epoch plus a nanosecond adjustment, stored in a
//! 12-byte slot (`i64` seconds then `u32` nanoseconds). Nanoseconds are always
//! normalized into `[0, 999_999_999]`; instants before the epoch carry a
//! negative `seconds` and a positive `nanos`, the same convention as
//! `java.time.Instant` and `std::time`.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use eyre::{ensure, Result};

pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Result<Self> {
        ensure!(
            nanos < NANOS_PER_SECOND,
            "timestamp nanoseconds {} out of range [0, 999999999]",
            nanos
        );
        Ok(Self { seconds, nanos })
    }

    pub fn from_epoch_second(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    pub fn from_epoch_milli(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanos: (millis.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    pub fn epoch_second(&self) -> i64 {
        self.seconds
    }

    pub fn nano(&self) -> u32 {
        self.nanos
    }

    /// Milliseconds since the epoch, truncating sub-millisecond precision.
    /// Fails for instants outside the `i64` millisecond range.
    pub fn to_epoch_milli(&self) -> Result<i64> {
        let millis = i128::from(self.seconds) * 1000 + i128::from(self.nanos / 1_000_000);
        i64::try_from(millis)
            .map_err(|_| eyre::eyre!("timestamp {} overflows epoch milliseconds", self))
    }

    /// Fails for instants the platform `SystemTime` cannot represent.
    pub fn to_system_time(&self) -> Result<SystemTime> {
        let nanos = Duration::from_nanos(u64::from(self.nanos));
        let secs = Duration::from_secs(self.seconds.unsigned_abs());
        let time = if self.seconds >= 0 {
            UNIX_EPOCH.checked_add(secs)
        } else {
            UNIX_EPOCH.checked_sub(secs)
        };
        time.and_then(|t| t.checked_add(nanos))
            .ok_or_else(|| eyre::eyre!("timestamp {} is out of range for SystemTime", self))
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self {
                seconds: after.as_secs() as i64,
                nanos: after.subsec_nanos(),
            },
            Err(err) => {
                let before = err.duration();
                let mut seconds = 0i64.saturating_sub_unsigned(before.as_secs());
                let mut nanos = 0;
                if before.subsec_nanos() > 0 {
                    seconds = seconds.saturating_sub(1);
                    nanos = NANOS_PER_SECOND - before.subsec_nanos();
                }
                Self { seconds, nanos }
            }
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..8].copy_from_slice(&self.seconds.to_le_bytes());
        out[8..].copy_from_slice(&self.nanos.to_le_bytes());
        out
    }

    pub(crate) fn from_bytes(bytes: [u8; 12]) -> Result<Self> {
        let mut seconds = [0u8; 8];
        let mut nanos = [0u8; 4];
        seconds.copy_from_slice(&bytes[..8]);
        nanos.copy_from_slice(&bytes[8..]);
        Self::new(i64::from_le_bytes(seconds), u32::from_le_bytes(nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_nanos() {
        assert!(Timestamp::new(0, 999_999_999).is_ok());
        let err = Timestamp::new(0, 1_000_000_000).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn epoch_milli_before_epoch_normalizes_nanos() {
        let ts = Timestamp::from_epoch_milli(-1);
        assert_eq!(ts.epoch_second(), -1);
        assert_eq!(ts.nano(), 999_000_000);
        assert_eq!(ts.to_epoch_milli().unwrap(), -1);
    }

    #[test]
    fn epoch_milli_overflow_is_an_error() {
        let max_millis = Timestamp::from_epoch_milli(i64::MAX);
        assert_eq!(max_millis.to_epoch_milli().unwrap(), i64::MAX);
        let min_millis = Timestamp::from_epoch_milli(i64::MIN);
        assert_eq!(min_millis.to_epoch_milli().unwrap(), i64::MIN);

        let err = Timestamp::new(i64::MAX, 0).unwrap().to_epoch_milli().unwrap_err();
        assert!(err.to_string().contains("overflows"));
        assert!(Timestamp::new(i64::MIN, 0).unwrap().to_epoch_milli().is_err());
        assert!(Timestamp::new(i64::MAX / 1000 + 1, 0).unwrap().to_epoch_milli().is_err());
    }

    #[test]
    fn system_time_conversion_at_extremes_does_not_panic() {
        for ts in [
            Timestamp::new(i64::MAX, 999_999_999).unwrap(),
            Timestamp::new(i64::MIN, 0).unwrap(),
        ] {
            if let Ok(time) = ts.to_system_time() {
                assert_eq!(Timestamp::from_system_time(time), ts);
            }
        }
    }

    #[test]
    fn bytes_preserve_seconds_and_nanos() {
        let ts = Timestamp::new(1_600_000_000, 123_456_789).unwrap();
        assert_eq!(Timestamp::from_bytes(ts.to_bytes()).unwrap(), ts);
    }

    #[test]
    fn system_time_conversion_handles_negative_instants() {
        let ts = Timestamp::new(-5, 250_000_000).unwrap();
        assert_eq!(Timestamp::from_system_time(ts.to_system_time().unwrap()), ts);

        let ts = Timestamp::new(1_600_000_000, 1).unwrap();
        assert_eq!(Timestamp::from_system_time(ts.to_system_time().unwrap()), ts);
    }

    #[test]
    fn display_pads_nanos() {
        let ts = Timestamp::new(12, 5).unwrap();
        assert_eq!(ts.to_string(), "12.000000005");
    }
}
