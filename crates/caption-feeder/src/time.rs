//! Media timeline timestamps.

/// Position on the media timeline in integer microseconds.
///
/// Integer keys keep the interval indices totally ordered; floating
/// point seconds only appear at the API edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const MIN: Timestamp = Timestamp(i64::MIN);
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_micros(micros: i64) -> Timestamp {
        Timestamp(micros)
    }

    pub fn from_seconds(seconds: f64) -> Timestamp {
        Timestamp((seconds * 1_000_000.0) as i64)
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// This timestamp shifted by `seconds` (negative shifts backward).
    pub fn offset_seconds(self, seconds: f64) -> Timestamp {
        Timestamp(self.0.saturating_add((seconds * 1_000_000.0) as i64))
    }

    pub(crate) fn next(self) -> Timestamp {
        Timestamp(self.0.saturating_add(1))
    }
}

/// How long a cue stays on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CueDuration {
    Seconds(f64),
    /// Displayed until superseded by a later cue or a screen clear.
    Unbounded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_roundtrip() {
        let t = Timestamp::from_seconds(12.5);
        assert_eq!(t.as_micros(), 12_500_000);
        assert_eq!(t.as_seconds(), 12.5);
    }

    #[test]
    fn test_offset_and_ordering() {
        let t = Timestamp::from_seconds(10.0);
        assert_eq!(t.offset_seconds(5.0), Timestamp::from_seconds(15.0));
        assert_eq!(t.offset_seconds(-5.0), Timestamp::from_seconds(5.0));
        assert!(Timestamp::MIN < Timestamp::ZERO);
        assert!(t < t.next());
    }
}
