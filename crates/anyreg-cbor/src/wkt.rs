//! Well-known message types carried by the global catalog.
//!
//! These mirror the widely used `google.protobuf.*` value types so that envelopes produced by
//! other systems resolve without explicit registration.

use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MessageCatalogBuilder;

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// A time value that has no counterpart on the other side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeRangeError {
    #[error("nanos {0} outside 0..1_000_000_000")]
    InvalidNanos(i32),
    #[error("{0} seconds from the epoch is not representable as a system time")]
    SecondsOutOfRange(i64),
    #[error("duration of {0:?} does not fit in i64 seconds")]
    DurationOverflow(StdDuration),
}

/// Point in time as seconds and non-negative nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn now() -> Self {
        SystemTime::now().into()
    }

    /// Converts to a `SystemTime`, clamping `nanos` into `0..1_000_000_000`.
    ///
    /// Use [`Timestamp::try_to_system_time`] to reject malformed timestamps instead.
    pub fn to_system_time(&self) -> SystemTime {
        let nanos = self.nanos.clamp(0, NANOS_PER_SECOND - 1) as u32;
        if self.seconds >= 0 {
            UNIX_EPOCH + StdDuration::new(self.seconds as u64, nanos)
        } else {
            UNIX_EPOCH - StdDuration::from_secs(self.seconds.unsigned_abs())
                + StdDuration::from_nanos(u64::from(nanos))
        }
    }

    /// Converts to a `SystemTime`, failing on out-of-range nanos or seconds.
    pub fn try_to_system_time(&self) -> Result<SystemTime, TimeRangeError> {
        if !(0..NANOS_PER_SECOND).contains(&self.nanos) {
            return Err(TimeRangeError::InvalidNanos(self.nanos));
        }
        let whole = if self.seconds >= 0 {
            UNIX_EPOCH.checked_add(StdDuration::from_secs(self.seconds as u64))
        } else {
            UNIX_EPOCH.checked_sub(StdDuration::from_secs(self.seconds.unsigned_abs()))
        };
        whole
            .and_then(|time| time.checked_add(StdDuration::from_nanos(self.nanos as u64)))
            .ok_or(TimeRangeError::SecondsOutOfRange(self.seconds))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self {
                seconds: since.as_secs() as i64,
                nanos: since.subsec_nanos() as i32,
            },
            Err(err) => {
                let before = err.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut nanos = before.subsec_nanos() as i32;
                if nanos > 0 {
                    seconds -= 1;
                    nanos = NANOS_PER_SECOND - nanos;
                }
                Self { seconds, nanos }
            }
        }
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> Self {
        ts.to_system_time()
    }
}

/// Signed span of time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

impl TryFrom<StdDuration> for Duration {
    type Error = TimeRangeError;

    fn try_from(value: StdDuration) -> Result<Self, Self::Error> {
        let seconds =
            i64::try_from(value.as_secs()).map_err(|_| TimeRangeError::DurationOverflow(value))?;
        Ok(Self {
            seconds,
            nanos: value.subsec_nanos() as i32,
        })
    }
}

impl TryFrom<Duration> for StdDuration {
    type Error = Duration;

    /// Fails (returning the input) for negative spans.
    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value.seconds < 0 || value.nanos < 0 || value.nanos >= NANOS_PER_SECOND {
            return Err(value);
        }
        Ok(StdDuration::new(value.seconds as u64, value.nanos as u32))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringValue {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BytesValue {
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoolValue {
    pub value: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Int64Value {
    pub value: i64,
}

/// Adds every well-known type to `builder` under its `google.protobuf.*` name.
pub fn register_well_known(builder: MessageCatalogBuilder) -> MessageCatalogBuilder {
    builder
        .message::<Timestamp>("google.protobuf.Timestamp")
        .message::<Duration>("google.protobuf.Duration")
        .message::<Empty>("google.protobuf.Empty")
        .message::<StringValue>("google.protobuf.StringValue")
        .message::<BytesValue>("google.protobuf.BytesValue")
        .message::<BoolValue>("google.protobuf.BoolValue")
        .message::<Int64Value>("google.protobuf.Int64Value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_cbor, to_canonical_cbor};

    #[test]
    fn timestamp_preserves_system_time() {
        let now = SystemTime::now();
        let ts = Timestamp::from(now);
        assert_eq!(ts.to_system_time(), now);
    }

    #[test]
    fn timestamp_before_epoch_normalizes_nanos() {
        let before = UNIX_EPOCH - StdDuration::new(1, 250_000_000);
        let ts = Timestamp::from(before);
        assert_eq!(
            ts,
            Timestamp {
                seconds: -2,
                nanos: 750_000_000
            }
        );
        assert_eq!(ts.to_system_time(), before);
        assert_eq!(ts.try_to_system_time(), Ok(before));
    }

    #[test]
    fn malformed_nanos_clamp_or_fail() {
        let ts = Timestamp {
            seconds: 10,
            nanos: -5,
        };
        assert_eq!(ts.to_system_time(), UNIX_EPOCH + StdDuration::from_secs(10));
        assert_eq!(
            ts.try_to_system_time(),
            Err(TimeRangeError::InvalidNanos(-5))
        );

        let ts = Timestamp {
            seconds: 10,
            nanos: NANOS_PER_SECOND,
        };
        assert_eq!(
            ts.to_system_time(),
            UNIX_EPOCH + StdDuration::new(10, 999_999_999)
        );
        assert_eq!(
            ts.try_to_system_time(),
            Err(TimeRangeError::InvalidNanos(NANOS_PER_SECOND))
        );
    }

    #[test]
    fn negative_duration_does_not_convert() {
        let negative = Duration {
            seconds: -3,
            nanos: 0,
        };
        assert_eq!(StdDuration::try_from(negative), Err(negative));
        let positive = Duration::try_from(StdDuration::from_millis(1500)).expect("in range");
        assert_eq!(
            positive,
            Duration {
                seconds: 1,
                nanos: 500_000_000
            }
        );
        assert_eq!(StdDuration::try_from(positive), Ok(StdDuration::from_millis(1500)));
    }

    #[test]
    fn oversized_std_duration_does_not_wrap() {
        let huge = StdDuration::from_secs(u64::MAX);
        assert_eq!(
            Duration::try_from(huge),
            Err(TimeRangeError::DurationOverflow(huge))
        );
        let edge = StdDuration::from_secs(i64::MAX as u64);
        assert_eq!(Duration::try_from(edge).expect("fits").seconds, i64::MAX);
    }

    #[test]
    fn empty_round_trips() {
        let bytes = to_canonical_cbor(&Empty {}).expect("encode");
        let decoded: Empty = from_cbor(&bytes).expect("decode");
        assert_eq!(decoded, Empty {});
    }
}
