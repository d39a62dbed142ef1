//! Platform-independent update-and-render core
//!
//! The platform calls [`update_and_render`] once per iteration with borrowed
//! views of its buffers. Nothing here performs I/O, allocates, logs or keeps
//! a reference past the call; all persistent state lives in [`GameState`].

mod gradient;
mod tone;

pub use tone::Waveform;

use gradient::render_gradient;
use tone::Oscillator;

use serde::{Deserialize, Serialize};

use crate::audio::AudioRing;
use crate::display::FrameViewMut;
use crate::input::{Button, Input};

pub const MIN_TONE_HZ: f32 = 20.0;
pub const MAX_TONE_HZ: f32 = 8000.0;

/// Tuning for the core, loaded from the `game` section of the config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tone_hz: f32,
    pub tone_step_hz: f32,
    pub waveform: Waveform,
    /// Pixels per call at full axis deflection
    pub scroll_speed: f32,
    /// Constant per-call offset change, applied regardless of input
    pub drift_x: i32,
    pub drift_y: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tone_hz: 440.0,
            tone_step_hz: 20.0,
            waveform: Waveform::Sine,
            scroll_speed: 4.0,
            drift_x: 1,
            drift_y: 0,
        }
    }
}

/// Everything the core remembers between calls.
///
/// Initial value: offsets (0, 0), oscillator phase 0, tone and waveform taken
/// from the config. Only [`GameState::reset`] returns to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub offset_x: i32,
    pub offset_y: i32,
    pub tone_hz: f32,
    pub waveform: Waveform,
    oscillator: Oscillator,
    tuning: GameConfig,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            tone_hz: config.tone_hz.clamp(MIN_TONE_HZ, MAX_TONE_HZ),
            waveform: config.waveform,
            oscillator: Oscillator::new(),
            tuning: config.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(&self.tuning);
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.oscillator.phase()
    }

    fn apply_input(&mut self, input: &Input) {
        let step = self.tuning.tone_step_hz;
        if input.pressed(Button::ToneUp) {
            self.tone_hz = (self.tone_hz + step).clamp(MIN_TONE_HZ, MAX_TONE_HZ);
        }
        if input.pressed(Button::ToneDown) {
            self.tone_hz = (self.tone_hz - step).clamp(MIN_TONE_HZ, MAX_TONE_HZ);
        }
        if input.pressed(Button::ToggleWaveform) {
            self.waveform = self.waveform.toggled();
        }

        let speed = self.tuning.scroll_speed;
        self.offset_x = self
            .offset_x
            .wrapping_sub((input.x * speed).round() as i32)
            .wrapping_add(self.tuning.drift_x);
        self.offset_y = self
            .offset_y
            .wrapping_sub((input.y * speed).round() as i32)
            .wrapping_add(self.tuning.drift_y);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}

/// Produce one frame of pixels and one period of audio.
///
/// Applies the input, renders the gradient over the whole frame and fills
/// every stereo frame of the ring. Cannot fail: a zero-area view renders
/// nothing and a zero-length ring synthesizes nothing.
pub fn update_and_render(
    state: &mut GameState,
    mut frame: FrameViewMut<'_>,
    audio: &mut AudioRing,
    input: &Input,
) {
    state.apply_input(input);
    render_gradient(&mut frame, state.offset_x, state.offset_y);
    state.oscillator.fill(audio, state.tone_hz, state.waveform);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::FrameBuffer;
    use crate::input::InputRecorder;

    fn still_config() -> GameConfig {
        GameConfig {
            drift_x: 0,
            drift_y: 0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_every_pixel_written_after_resize() {
        for &(w, h) in &[(1, 1), (3, 7), (64, 1), (1, 64), (33, 17)] {
            let mut fb = FrameBuffer::with_size(5, 5).unwrap();
            fb.view_mut().rows_mut().for_each(|row| row.fill(0xAA));
            fb.resize(w, h).unwrap();
            fb.view_mut().rows_mut().for_each(|row| row.fill(0xAA));

            let mut state = GameState::new(&still_config());
            let mut ring = AudioRing::with_sample_count(48000, 0, 0).unwrap();
            update_and_render(&mut state, fb.view_mut(), &mut ring, &Input::default());

            let view = fb.view();
            for y in 0..h {
                for x in 0..w {
                    assert_eq!(view.pixel(x, y), Some([x as u8, y as u8, 0, 0]));
                }
            }
        }
    }

    #[test]
    fn test_audio_bounded_and_stereo() {
        let mut state = GameState::default();
        let mut fb = FrameBuffer::with_size(2, 2).unwrap();
        let mut ring = AudioRing::new(48000, 60, 5000).unwrap();

        update_and_render(&mut state, fb.view_mut(), &mut ring, &Input::default());

        for frame in ring.samples().chunks_exact(2) {
            assert!(frame[0].unsigned_abs() <= 5000);
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_fresh_state_is_reproducible() {
        let mut fb_a = FrameBuffer::with_size(16, 8).unwrap();
        let mut fb_b = FrameBuffer::with_size(16, 8).unwrap();
        let mut ring_a = AudioRing::new(48000, 60, 1000).unwrap();
        let mut ring_b = AudioRing::new(48000, 60, 1000).unwrap();

        let mut state = GameState::default();
        update_and_render(&mut state, fb_a.view_mut(), &mut ring_a, &Input::default());
        state.reset();
        update_and_render(&mut state, fb_b.view_mut(), &mut ring_b, &Input::default());

        assert_eq!(fb_a.as_bytes(), fb_b.as_bytes());
        assert_eq!(ring_a, ring_b);
    }

    #[test]
    fn test_consecutive_calls_advance_one_step() {
        let mut fb = FrameBuffer::with_size(16, 8).unwrap();
        let mut ring = AudioRing::new(48000, 60, 1000).unwrap();
        let mut state = GameState::default();

        update_and_render(&mut state, fb.view_mut(), &mut ring, &Input::default());
        let first = fb.as_bytes().to_vec();
        let (x1, phase1) = (state.offset_x, state.phase());

        update_and_render(&mut state, fb.view_mut(), &mut ring, &Input::default());

        assert_ne!(fb.as_bytes(), first.as_slice());
        assert_eq!(state.offset_x, x1 + 1);
        // Second frame equals the first shifted by the drift
        assert_eq!(fb.view().pixel(0, 0), Some([(x1 + 1) as u8, 0, 0, 0]));

        let step = std::f32::consts::TAU * 440.0 / 48000.0;
        let expected = (phase1 + 800.0 * step) % std::f32::consts::TAU;
        assert!((state.phase() - expected).abs() < 1e-2);
    }

    #[test]
    fn test_axes_scroll_offsets() {
        let mut state = GameState::new(&still_config());
        let mut recorder = InputRecorder::new();
        recorder.set(Button::MoveLeft, true);
        recorder.set(Button::MoveDown, true);
        let input = recorder.snapshot();

        let mut fb = FrameBuffer::with_size(1, 1).unwrap();
        let mut ring = AudioRing::with_sample_count(48000, 0, 0).unwrap();
        update_and_render(&mut state, fb.view_mut(), &mut ring, &input);

        // Left raises the x offset, down lowers the y offset
        assert_eq!(state.offset_x, 4);
        assert_eq!(state.offset_y, -4);
    }

    #[test]
    fn test_tone_steps_only_on_press_edge() {
        let mut state = GameState::new(&still_config());
        let mut recorder = InputRecorder::new();
        let mut fb = FrameBuffer::with_size(1, 1).unwrap();
        let mut ring = AudioRing::with_sample_count(48000, 0, 0).unwrap();

        recorder.set(Button::ToneUp, true);
        let input = recorder.snapshot();
        update_and_render(&mut state, fb.view_mut(), &mut ring, &input);
        assert_eq!(state.tone_hz, 460.0);

        // Still held: no edge, no change
        let input = recorder.snapshot();
        update_and_render(&mut state, fb.view_mut(), &mut ring, &input);
        assert_eq!(state.tone_hz, 460.0);

        // Release is an edge but not a press
        recorder.set(Button::ToneUp, false);
        let input = recorder.snapshot();
        update_and_render(&mut state, fb.view_mut(), &mut ring, &input);
        assert_eq!(state.tone_hz, 460.0);
    }

    #[test]
    fn test_tone_clamped() {
        let config = GameConfig {
            tone_hz: MIN_TONE_HZ,
            ..still_config()
        };
        let mut state = GameState::new(&config);
        let mut recorder = InputRecorder::new();
        recorder.set(Button::ToneDown, true);
        let input = recorder.snapshot();

        let mut fb = FrameBuffer::with_size(1, 1).unwrap();
        let mut ring = AudioRing::with_sample_count(48000, 0, 0).unwrap();
        update_and_render(&mut state, fb.view_mut(), &mut ring, &input);

        assert_eq!(state.tone_hz, MIN_TONE_HZ);
    }

    #[test]
    fn test_waveform_toggle() {
        let mut state = GameState::default();
        let mut recorder = InputRecorder::new();
        recorder.set(Button::ToggleWaveform, true);
        let input = recorder.snapshot();

        let mut fb = FrameBuffer::with_size(1, 1).unwrap();
        let mut ring = AudioRing::new(48000, 60, 700).unwrap();
        update_and_render(&mut state, fb.view_mut(), &mut ring, &input);

        assert_eq!(state.waveform, Waveform::Square);
        assert!(ring.samples().iter().all(|&s| s == 700 || s == -700));
    }

    #[test]
    fn test_zero_area_view_does_not_fail() {
        let mut state = GameState::default();
        let mut empty: Vec<u8> = Vec::new();
        let frame = FrameViewMut::new(&mut empty, 0, 0, 0).unwrap();
        let mut ring = AudioRing::with_sample_count(48000, 0, 100).unwrap();
        update_and_render(&mut state, frame, &mut ring, &Input::default());
        assert_eq!(state.offset_x, 1);
    }
}
