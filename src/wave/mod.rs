//! Waveform library — pure shape functions used by transform expressions.
//!
//! Periodic shapes take a phase and return a value in `[-1.0, 1.0]`; one-shot
//! shapes map a clamped phase onto a range; random shapes draw from an
//! injected [`RandomSource`].

pub mod envelope;
pub mod periodic;
pub mod random;

pub use envelope::{curve, ramp, MIN_CURVE_EXPONENT};
pub use periodic::{waveform, wrap_phase, Waveform, DEFAULT_DUTY};
pub use random::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
