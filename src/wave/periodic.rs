//! Periodic waveforms — phase in, value in [-1.0, 1.0] out.

use std::f64::consts::PI;

/// Periodic waveform shapes callable from transform expressions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Cos,
    Sin,
    Tri,
    Saw,
    Square,
}

/// Default duty cycle for [`Waveform::Square`].
pub const DEFAULT_DUTY: f64 = 0.5;

/// Wrap any phase into [0.0, 1.0).
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Evaluate a waveform at `phase`. Phases outside [0, 1) wrap.
///
/// `duty` only affects [`Waveform::Square`].
pub fn waveform(shape: Waveform, phase: f64, duty: f64) -> f64 {
    let phase = wrap_phase(phase);
    match shape {
        Waveform::Cos => cos(phase),
        Waveform::Sin => sin(phase),
        Waveform::Tri => tri(phase),
        Waveform::Saw => saw(phase),
        Waveform::Square => square(phase, duty),
    }
}

pub fn cos(phase: f64) -> f64 {
    (wrap_phase(phase) * 2.0 * PI).cos()
}

pub fn sin(phase: f64) -> f64 {
    (wrap_phase(phase) * 2.0 * PI).sin()
}

/// Triangle: 0 → 1 at a quarter cycle → −1 at three quarters → 0.
pub fn tri(phase: f64) -> f64 {
    let phase = wrap_phase(phase);
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}

/// Rising sawtooth: −1 at the cycle start, approaching 1 at the end.
pub fn saw(phase: f64) -> f64 {
    2.0 * wrap_phase(phase) - 1.0
}

/// Square: 1.0 while `phase < duty`, −1.0 otherwise.
pub fn square(phase: f64, duty: f64) -> f64 {
    if wrap_phase(phase) < duty {
        1.0
    } else {
        -1.0
    }
}
