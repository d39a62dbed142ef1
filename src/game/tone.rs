use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::audio::AudioRing;

/// Shape of the test tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
}

impl Waveform {
    /// Amplitude in [-1, 1] at `phase` radians
    #[inline]
    pub fn amplitude(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            },
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Square,
            Waveform::Square => Waveform::Sine,
        }
    }
}

/// Phase accumulator, kept in [0, 2π)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Oscillator {
    phase: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Fill one period. The phase advances before each frame is sampled and
    /// both channels get the same value. No attempt is made to keep the
    /// waveform continuous when `tone_hz` changes between calls.
    pub fn fill(&mut self, ring: &mut AudioRing, tone_hz: f32, waveform: Waveform) {
        let step = TAU * tone_hz / ring.sample_rate() as f32;
        let volume = f32::from(ring.volume());

        for frame in ring.frames_mut() {
            self.phase = (self.phase + step) % TAU;
            let sample = (waveform.amplitude(self.phase) * volume) as i16;
            frame[0] = sample;
            frame[1] = sample;
        }
    }
}
