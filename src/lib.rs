//! notewarp — time- and pitch-conditional transforms for MIDI notes.
//!
//! Short formulas such as `C3 1|1-2|1 velocity += 20 * cos(1t)` are parsed
//! once and evaluated per note against musical time.

pub mod config;
pub mod diagnostics;
pub mod dsl;
pub mod eval;
pub mod note;
pub mod time;
pub mod transform;
pub mod wave;
