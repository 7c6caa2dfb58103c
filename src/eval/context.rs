//! Evaluation context — everything an expression may read besides its own tree.

use std::collections::BTreeMap;

use super::error::EvalError;
use crate::dsl::{Dialect, Namespace};
use crate::note::NoteEvent;
use crate::time::{BarBeat, TimeRange, TimeSignature};

/// Named values readable as `note.<name>` or `audio.<name>`.
pub type VariableBag = BTreeMap<String, f64>;

/// What kind of clip is being evaluated. Decides which namespace is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    #[default]
    Midi,
    Audio,
}

impl Domain {
    fn describe(self) -> &'static str {
        match self {
            Domain::Midi => "MIDI note",
            Domain::Audio => "audio clip",
        }
    }
}

/// Per-position input to the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalContext {
    /// Musical position in beats.
    pub position: f64,
    pub time_sig: TimeSignature,
    /// Window that `ramp`/`curve` normalize their phase against.
    pub active_range: Option<TimeRange>,
    pub pitch: Option<u8>,
    pub bar: Option<u32>,
    pub beat: Option<f64>,
    /// 12-bit pitch-class mask; bit 0 is C.
    pub scale_mask: Option<u16>,
    pub note: Option<VariableBag>,
    pub audio: Option<VariableBag>,
    pub domain: Domain,
}

impl EvalContext {
    pub fn new(position: f64, time_sig: TimeSignature) -> Self {
        Self {
            position,
            time_sig,
            active_range: None,
            pitch: None,
            bar: None,
            beat: None,
            scale_mask: None,
            note: None,
            audio: None,
            domain: Domain::Midi,
        }
    }

    /// Context for one note: its start is the position and its own fields
    /// are readable as `note.*`.
    pub fn for_note(note: &NoteEvent, time_sig: TimeSignature, dialect: Dialect) -> Self {
        Self::new(note.start, time_sig)
            .with_pitch(note.pitch)
            .with_note_properties(note_properties(note, dialect))
    }

    pub fn with_pitch(mut self, pitch: u8) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_active_range(mut self, range: TimeRange) -> Self {
        self.active_range = Some(range);
        self
    }

    pub fn with_scale_mask(mut self, mask: u16) -> Self {
        self.scale_mask = Some(mask);
        self
    }

    pub fn with_note_properties(mut self, bag: VariableBag) -> Self {
        self.note = Some(bag);
        self
    }

    /// Switch to an audio-clip context reading `audio.*` from `bag`.
    pub fn with_audio_properties(mut self, bag: VariableBag) -> Self {
        self.audio = Some(bag);
        self.domain = Domain::Audio;
        self
    }

    /// Fill `bar`/`beat` from `position`.
    pub fn with_bar_beat(mut self) -> Self {
        let bb = BarBeat::from_beats(self.position, self.time_sig);
        self.bar = Some(bb.bar);
        self.beat = Some(bb.beat);
        self
    }

    /// Read a namespaced variable.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Result<f64, EvalError> {
        let allowed = match self.domain {
            Domain::Midi => Namespace::Note,
            Domain::Audio => Namespace::Audio,
        };
        if namespace != allowed {
            return Err(EvalError::namespace_mismatch(
                namespace.as_str(),
                name,
                self.domain.describe(),
            ));
        }

        let bag = match namespace {
            Namespace::Note => self.note.as_ref(),
            Namespace::Audio => self.audio.as_ref(),
        };
        bag.and_then(|b| b.get(name))
            .copied()
            .ok_or_else(|| EvalError::unknown_variable(namespace.as_str(), name))
    }
}

/// Build the `note.*` bag for a note. Absent optional fields read as their
/// defaults (probability 1, deviation 0).
pub fn note_properties(note: &NoteEvent, dialect: Dialect) -> VariableBag {
    let mut bag = VariableBag::new();
    bag.insert("pitch".to_string(), note.pitch as f64);
    bag.insert("start".to_string(), note.start);
    bag.insert("duration".to_string(), note.duration);
    bag.insert("velocity".to_string(), note.velocity);
    bag.insert("probability".to_string(), note.probability.unwrap_or(1.0));
    if dialect.exposes_note_deviation() {
        bag.insert(
            "deviation".to_string(),
            note.velocity_deviation.unwrap_or(0.0),
        );
    }
    bag
}
