use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A point in log time, as carried by telemetry headers.
///
/// Always normalized to `0 <= nsec < 1_000_000_000`, which makes the derived
/// ordering (seconds first, then nanoseconds) the chronological one.
///
/// # Examples
/// - The time `-1.7` seconds is represented as `{ sec: -2, nsec: 300_000_000 }`
/// - The time `1.7` seconds is represented as `{ sec: 1,  nsec: 700_000_000 }`
///
/// Defaults to [`Self::ZERO`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "RawTimestamp")]
pub struct Timestamp {
    sec: i64,
    nsec: u32,
}

/// Accepts `sec`/`nsec`, the ROS 1 `secs`/`nsecs` and the ROS 2 `sec`/`nanosec` spellings.
#[derive(Deserialize)]
struct RawTimestamp {
    #[serde(alias = "secs")]
    sec: i64,

    #[serde(alias = "nsecs", alias = "nanosec")]
    nsec: i64,
}

impl From<RawTimestamp> for Timestamp {
    #[inline]
    fn from(raw: RawTimestamp) -> Self {
        Self::new(raw.sec, raw.nsec)
    }
}

impl Timestamp {
    /// Sorts before every real timestamp. Used for frames that were never updated.
    pub const NEVER: Self = Self {
        sec: i64::MIN,
        nsec: 0,
    };

    pub const ZERO: Self = Self { sec: 0, nsec: 0 };

    /// Carries any overflowing or negative nanoseconds into the seconds.
    #[inline]
    pub fn new(sec: i64, nsec: i64) -> Self {
        Self {
            sec: sec.saturating_add(nsec.div_euclid(NANOS_PER_SEC)),
            nsec: nsec.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }

    #[inline]
    pub fn from_secs(sec: i64) -> Self {
        Self { sec, nsec: 0 }
    }

    #[inline]
    pub fn from_nanos(nanos: i64) -> Self {
        Self::new(0, nanos)
    }

    /// Returns [`Self::NEVER`] for non-finite input.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() {
            return Self::NEVER;
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round() as i64;
        Self::new(whole as i64, nanos)
    }

    #[inline]
    pub fn sec(&self) -> i64 {
        self.sec
    }

    #[inline]
    pub fn nsec(&self) -> u32 {
        self.nsec
    }

    #[inline]
    pub fn is_never(&self) -> bool {
        *self == Self::NEVER
    }

    /// Total nanoseconds. Wide enough for every representable timestamp.
    #[inline]
    pub fn as_nanos(&self) -> i128 {
        self.sec as i128 * NANOS_PER_SEC as i128 + self.nsec as i128
    }

    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 / 1e9
    }

    /// Signed distance from `earlier` to `self`, in nanoseconds.
    #[inline]
    pub fn nanos_since(&self, earlier: Self) -> i128 {
        self.as_nanos() - earlier.as_nanos()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_never() {
            f.write_str("<never>")
        } else {
            let nanos = self.as_nanos();
            let sign = if nanos < 0 { "-" } else { "" };
            let abs = nanos.unsigned_abs();
            let nanos_per_sec = NANOS_PER_SEC as u128;
            write!(f, "{sign}{}.{:09}s", abs / nanos_per_sec, abs % nanos_per_sec)
        }
    }
}
