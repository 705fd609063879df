//! Timed caption decoding pipeline over the b24 decoder.
//!
//! [`CaptionFeeder`] owns two timestamp-keyed indices: raw segments by
//! decode time and decoded cues by presentation time. A worker task
//! moves segments from one to the other as the playback clock reaches
//! them; playback code polls [`CaptionFeeder::content`] with the media
//! clock.

pub mod cue;
pub mod feeder;
pub mod time;

pub use cue::{CaptionLanguage, Cue, RawSegment};
pub use feeder::{CaptionFeeder, FeederConfig, FeederError};
pub use time::{CueDuration, Timestamp};
