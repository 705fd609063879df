//! Decoded caption cues and the raw segments they come from.

use b24::{ParsedToken, ParserState};

use crate::time::{CueDuration, Timestamp};

/// One undecoded caption data group as it arrived from the demuxer.
///
/// Decode and presentation time may differ because the underlying
/// stream can reorder frames; the feeder indexes by each independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub decode_time: Timestamp,
    pub presentation_time: Timestamp,
    pub data: Vec<u8>,
}

/// One language announced by a caption management record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLanguage {
    /// Language tag; statements with `language_id == tag + 1` belong
    /// to this entry.
    pub tag: u8,
    /// ISO 639-2 code, e.g. "jpn".
    pub iso_code: String,
    pub display_mode: u8,
}

/// One decoded, positioned caption screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub presentation_time: Timestamp,
    pub duration: CueDuration,
    /// Layout state the statement started from; renderers replay
    /// `tokens` against it.
    pub initial_state: ParserState,
    /// Positioned and styled tokens for rendering.
    pub tokens: Vec<ParsedToken>,
    /// Plain-text rendition of the spacing characters, for consumers
    /// that do not draw.
    pub text: String,
    /// Management-table entry for the statement's language id, when a
    /// management record announced one.
    pub language: Option<CaptionLanguage>,
}

impl Cue {
    /// True while this cue is on screen at `time`. Unbounded cues are
    /// active indefinitely; supersession by a later cue is the
    /// querying index's concern.
    pub fn contains(&self, time: Timestamp) -> bool {
        if time < self.presentation_time {
            return false;
        }
        match self.duration {
            CueDuration::Unbounded => true,
            CueDuration::Seconds(seconds) => time < self.presentation_time.offset_seconds(seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, duration: CueDuration) -> Cue {
        Cue {
            presentation_time: Timestamp::from_seconds(start),
            duration,
            initial_state: ParserState::default(),
            tokens: Vec::new(),
            text: String::new(),
            language: None,
        }
    }

    #[test]
    fn test_bounded_cue_window() {
        let c = cue(10.0, CueDuration::Seconds(5.0));
        assert!(!c.contains(Timestamp::from_seconds(9.9)));
        assert!(c.contains(Timestamp::from_seconds(10.0)));
        assert!(c.contains(Timestamp::from_seconds(14.9)));
        assert!(!c.contains(Timestamp::from_seconds(15.0)));
    }

    #[test]
    fn test_unbounded_cue_has_no_end() {
        let c = cue(10.0, CueDuration::Unbounded);
        assert!(c.contains(Timestamp::from_seconds(10_000.0)));
        assert!(!c.contains(Timestamp::from_seconds(9.0)));
    }

    #[test]
    fn test_zero_duration_cue_is_never_active() {
        let c = cue(10.0, CueDuration::Seconds(0.0));
        assert!(!c.contains(Timestamp::from_seconds(10.0)));
    }
}
