//! Musical time — time signatures and bar|beat positions.
//!
//! All positions inside the engine are absolute beats measured in quarter
//! notes from the start of the clip. Bar|beat notation is 1-based: `1|1` is
//! beat 0, and one notated beat is one denominator note (an eighth in 6/8).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default time signature: 4/4.
pub const DEFAULT_NUMERATOR: u32 = 4;
pub const DEFAULT_DENOMINATOR: u32 = 4;

/// A time signature such as 4/4 or 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    /// Create a time signature. Returns `None` when either part is zero.
    pub fn new(numerator: u32, denominator: u32) -> Option<Self> {
        if numerator == 0 || denominator == 0 {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// Length of one bar in quarter-note beats.
    pub fn beats_per_bar(self) -> f64 {
        self.numerator as f64 * self.beat_length()
    }

    /// Length of one notated beat (a denominator note) in quarter-note beats.
    pub fn beat_length(self) -> f64 {
        4.0 / self.denominator as f64
    }

    /// Parse `"3/4"`-style text.
    pub fn parse(text: &str) -> Option<Self> {
        let (num, den) = text.trim().split_once('/')?;
        Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: DEFAULT_NUMERATOR,
            denominator: DEFAULT_DENOMINATOR,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A 1-based bar|beat position, e.g. `2|3` or `1|2.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarBeat {
    pub bar: u32,
    pub beat: f64,
}

impl BarBeat {
    pub fn new(bar: u32, beat: f64) -> Self {
        Self { bar, beat }
    }

    /// Convert to absolute quarter-note beats under the given time signature.
    pub fn to_beats(self, time_sig: TimeSignature) -> f64 {
        let bars = self.bar.saturating_sub(1) as f64;
        bars * time_sig.beats_per_bar() + (self.beat - 1.0) * time_sig.beat_length()
    }

    /// Convert absolute quarter-note beats back to a bar|beat position.
    ///
    /// Negative positions clamp to `1|1`.
    pub fn from_beats(beats: f64, time_sig: TimeSignature) -> Self {
        let beats = beats.max(0.0);
        let per_bar = time_sig.beats_per_bar();
        let bar_index = (beats / per_bar).floor();
        let within = beats - bar_index * per_bar;
        Self {
            bar: bar_index as u32 + 1,
            beat: within / time_sig.beat_length() + 1.0,
        }
    }
}

impl fmt::Display for BarBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.bar, self.beat)
    }
}

/// An inclusive window of absolute beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }

    pub fn length(self) -> f64 {
        self.end - self.start
    }
}

/// Convert bar|beat text (`"2|3"`) to absolute beats.
///
/// Returns `None` when the text is not a valid 1-based position or the time
/// signature has a zero part.
pub fn bar_beat_to_beats(text: &str, numerator: u32, denominator: u32) -> Option<f64> {
    let time_sig = TimeSignature::new(numerator, denominator)?;
    let (bar, beat) = text.trim().split_once('|')?;
    let bar: u32 = bar.trim().parse().ok()?;
    let beat: f64 = beat.trim().parse().ok()?;
    if bar == 0 || !beat.is_finite() || beat < 1.0 {
        return None;
    }
    Some(BarBeat::new(bar, beat).to_beats(time_sig))
}

/// Convert absolute beats to bar|beat text.
pub fn beats_to_bar_beat(beats: f64, numerator: u32, denominator: u32) -> Option<String> {
    let time_sig = TimeSignature::new(numerator, denominator)?;
    Some(BarBeat::from_beats(beats, time_sig).to_string())
}
