//! Note data model — the host-owned note event and note-name parsing.
//!
//! A [`NoteEvent`] is a single MIDI note in a clip. The host creates and
//! stores them; the batch applier only mutates their fields in place.

use serde::{Deserialize, Serialize};

/// A note in a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch (0–127).
    pub pitch: u8,
    /// Start position in beats from the clip start.
    pub start: f64,
    /// Length in beats.
    pub duration: f64,
    /// Velocity, nominally 0–127.
    pub velocity: f64,
    /// Random velocity range (−127..127).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_deviation: Option<f64>,
    /// Trigger probability (0.0–1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl NoteEvent {
    pub fn new(pitch: u8, start: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch,
            start,
            duration,
            velocity,
            velocity_deviation: None,
            probability: None,
        }
    }

    /// End position in beats.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Parse a note name into a MIDI note number.
///
/// Format: `<letter><optional accidental><octave>`
/// - Letter: C, D, E, F, G, A, B
/// - Accidental: # (sharp) or b (flat)
/// - Octave: -2 to 8 (C3 = middle C = MIDI 60)
pub fn parse_note_name(name: &str) -> Option<u8> {
    let chars: Vec<char> = name.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let base = match chars[0] {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut i = 1;
    let accidental: i32 = if i < chars.len() && chars[i] == '#' {
        i += 1;
        1
    } else if i < chars.len() && chars[i] == 'b' {
        i += 1;
        -1
    } else {
        0
    };

    let octave_str: String = chars[i..].iter().collect();
    let octave: i32 = octave_str.parse().ok()?;

    // C-2 = 0, C3 = 60, G8 = 127
    let midi = octave
        .checked_add(2)?
        .checked_mul(12)?
        .checked_add(base + accidental)?;

    if !(0..=127).contains(&midi) {
        None
    } else {
        Some(midi as u8)
    }
}

/// Whether `s` is shaped like a note name (`C3`, `Eb-1`, `F#4`).
///
/// Shape only; the octave may still be out of MIDI range.
pub fn is_note_name(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() || !matches!(chars[0], 'A'..='G') {
        return false;
    }
    let mut i = 1;
    if i < chars.len() && (chars[i] == '#' || chars[i] == 'b') {
        i += 1;
    }
    if i < chars.len() && chars[i] == '-' {
        i += 1;
    }
    i < chars.len() && chars[i..].iter().all(|c| c.is_ascii_digit())
}
