//! Timestamp and time base handling.
//!
//! Provides precise time representation for media synchronization, plus the
//! integer ticker used to derive presentation timestamps from sample and
//! frame rates without floating point.

use crate::rational::Rational;
use std::cmp::Ordering;
use std::fmt;

/// A time base for converting between timestamp units.
///
/// Common time bases:
/// - 1/90000 for MPEG containers
/// - 1/1000 for milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBase(pub Rational);

impl TimeBase {
    /// Create a new time base from numerator and denominator.
    pub fn new(num: i64, den: i64) -> Self {
        Self(Rational::new(num, den))
    }

    /// Standard MPEG time base (1/90000).
    pub const MPEG: Self = Self(Rational { num: 1, den: 90000 });

    /// Millisecond time base (1/1000).
    pub const MILLISECONDS: Self = Self(Rational { num: 1, den: 1000 });

    /// Second time base (1/1).
    pub const SECONDS: Self = Self(Rational { num: 1, den: 1 });

    /// Convert a timestamp from this time base to another.
    pub fn convert(&self, value: i64, target: TimeBase) -> i64 {
        self.0.rescale(value, target.0)
    }

    /// Convert to seconds as f64.
    pub fn to_seconds(&self, value: i64) -> f64 {
        value as f64 * self.0.to_f64()
    }

    /// Get the time base as a rational.
    pub fn as_rational(&self) -> Rational {
        self.0
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::MPEG
    }
}

impl From<Rational> for TimeBase {
    fn from(r: Rational) -> Self {
        Self(r)
    }
}

/// A timestamp with an associated time base.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    /// The raw timestamp value.
    pub value: i64,
    /// The time base for interpreting the value.
    pub time_base: TimeBase,
}

impl Timestamp {
    /// Value representing an undefined timestamp.
    pub const NONE: i64 = i64::MIN;

    /// Create a new timestamp.
    pub fn new(value: i64, time_base: TimeBase) -> Self {
        Self { value, time_base }
    }

    /// Create an undefined timestamp.
    pub fn none() -> Self {
        Self {
            value: Self::NONE,
            time_base: TimeBase::default(),
        }
    }

    /// Check if this timestamp is defined.
    pub fn is_valid(&self) -> bool {
        self.value != Self::NONE
    }

    /// Convert to a different time base.
    pub fn rescale(&self, target: TimeBase) -> Self {
        if !self.is_valid() {
            return Self::none();
        }
        Self {
            value: self.time_base.convert(self.value, target),
            time_base: target,
        }
    }

    /// Convert to seconds.
    pub fn to_seconds(&self) -> Option<f64> {
        if self.is_valid() {
            Some(self.time_base.to_seconds(self.value))
        } else {
            None
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return !self.is_valid() && !other.is_valid();
        }
        // Compare in higher precision time base
        let tb = if self.time_base.0.den > other.time_base.0.den {
            self.time_base
        } else {
            other.time_base
        };
        self.rescale(tb).value == other.rescale(tb).value
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        if !self.is_valid() {
            return if !other.is_valid() {
                Ordering::Equal
            } else {
                Ordering::Less
            };
        }
        if !other.is_valid() {
            return Ordering::Greater;
        }

        let tb = if self.time_base.0.den > other.time_base.0.den {
            self.time_base
        } else {
            other.time_base
        };
        self.rescale(tb).value.cmp(&other.rescale(tb).value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(secs) = self.to_seconds() {
            let hours = (secs / 3600.0) as u32;
            let mins = ((secs % 3600.0) / 60.0) as u32;
            let secs = secs % 60.0;
            write!(f, "{:02}:{:02}:{:06.3}", hours, mins, secs)
        } else {
            write!(f, "NONE")
        }
    }
}

/// An integer rational ticker producing per-call timestamp increments.
///
/// `in_rate` calls advance the output by exactly `out_rate` units: each call
/// returns `floor((n+1)·out/in) − floor(n·out/in)`, computed with a quotient,
/// a remainder, and a residual accumulator. No floating point is involved and
/// there is no long-run drift.
///
/// For 90 kHz presentation timestamps, an audio stream uses
/// `Ticker::new(sample_rate, 90000 · frame_size)` (one call per frame) and a
/// video stream with frame rate `num/den` uses
/// `Ticker::new(num, 90000 · den)`.
#[derive(Debug, Clone)]
pub struct Ticker {
    in_rate: i64,
    div: i64,
    rem: i64,
    acc: i64,
}

impl Ticker {
    /// Create a ticker advancing `out_rate` units every `in_rate` calls.
    ///
    /// # Panics
    ///
    /// Panics if either rate is not positive.
    pub fn new(in_rate: i64, out_rate: i64) -> Self {
        assert!(in_rate > 0, "ticker input rate must be positive");
        assert!(out_rate > 0, "ticker output rate must be positive");
        Self {
            in_rate,
            div: out_rate / in_rate,
            rem: out_rate % in_rate,
            acc: 0,
        }
    }

    /// Create a ticker from an output-units-per-call rational.
    pub fn from_rational(step: Rational) -> Self {
        Self::new(step.den, step.num)
    }

    /// Advance one step and return the increment.
    pub fn tick(&mut self) -> i64 {
        let mut n = self.div;
        self.acc += self.rem;
        if self.acc >= self.in_rate {
            self.acc -= self.in_rate;
            n += 1;
        }
        n
    }
}
