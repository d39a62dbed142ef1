//! Platform loop
//!
//! Owns every buffer and drives one iteration at a time, strictly in order:
//! drain input, apply a pending resize, update and render, present, flush
//! audio. The window system and audio device sit behind [`Frontend`].

mod sdl;

pub use sdl::SdlFrontend;

use std::time::Duration;
use thiserror::Error;

use crate::audio::{AudioError, AudioRing};
use crate::config::{ConfigError, ResizeMode};
use crate::display::{FrameBuffer, FrameError, FrameView};
use crate::game::{self, GameState};
use crate::input::{InputEvent, InputRecorder};
use crate::util::FpsCounter;

const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("SDL error: {0}")]
    Sdl(String),

    #[error("Audio write failed: {0}")]
    AudioWrite(String),

    #[error("Audio underrun ({count} so far)")]
    AudioUnderrun { count: u64 },

    #[error("Frame buffer error: {0}")]
    Frame(#[from] FrameError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Window system and audio device as seen by the loop
pub trait Frontend {
    /// Drain pending events without blocking
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Scale `frame` onto the physical surface and show it
    fn present(&mut self, frame: FrameView<'_>) -> Result<(), PlatformError>;

    /// Hand one period of samples to the device
    fn flush_audio(&mut self, audio: &AudioRing) -> Result<(), PlatformError>;

    /// Pace the loop against the audio device; default does not wait
    fn wait_for_audio(&mut self) {}
}

pub struct PlatformLoop<F: Frontend> {
    frontend: F,
    frame: FrameBuffer,
    audio: AudioRing,
    state: GameState,
    input: InputRecorder,
    resize_mode: ResizeMode,
    pending_resize: Option<(u32, u32)>,
    running: bool,
    frames: u64,
    fps: Option<FpsCounter>,
}

impl<F: Frontend> PlatformLoop<F> {
    pub fn new(
        frontend: F,
        frame: FrameBuffer,
        audio: AudioRing,
        state: GameState,
        resize_mode: ResizeMode,
    ) -> Self {
        Self {
            frontend,
            frame,
            audio,
            state,
            input: InputRecorder::new(),
            resize_mode,
            pending_resize: None,
            running: true,
            frames: 0,
            fps: None,
        }
    }

    /// Log frame timing once per second
    pub fn with_fps_report(mut self, counter: FpsCounter) -> Self {
        self.fps = Some(counter);
        self
    }

    /// Iterate until a quit event or a fatal error
    pub fn run(&mut self) -> Result<(), PlatformError> {
        log::info!(
            "Running at {}x{}, {} Hz audio",
            self.frame.width(),
            self.frame.height(),
            self.audio.sample_rate()
        );
        while self.running {
            self.step()?;
        }
        log::info!("Stopped after {} frames", self.frames);
        Ok(())
    }

    /// One full iteration
    pub fn step(&mut self) -> Result<(), PlatformError> {
        self.frontend.wait_for_audio();

        for event in self.frontend.poll_events() {
            match event {
                InputEvent::Quit => self.running = false,
                InputEvent::Resized { width, height } => self.on_resized(width, height),
                InputEvent::Button { .. } => self.input.handle(&event),
            }
        }
        if !self.running {
            return Ok(());
        }

        if !self.apply_pending_resize() {
            // Keep the device fed while the frame is skipped; the next
            // update_and_render overwrites every sample
            self.audio.silence();
            return self.frontend.flush_audio(&self.audio);
        }

        let input = self.input.snapshot();
        game::update_and_render(&mut self.state, self.frame.view_mut(), &mut self.audio, &input);
        self.frontend.present(self.frame.view())?;
        self.frontend.flush_audio(&self.audio)?;

        self.frames += 1;
        log::trace!("frame {} done", self.frames);
        self.report_fps();
        Ok(())
    }

    fn on_resized(&mut self, width: u32, height: u32) {
        match self.resize_mode {
            ResizeMode::Match => self.pending_resize = Some((width, height)),
            ResizeMode::Stretch => {
                log::debug!(
                    "Window now {}x{}, stretching {}x{}",
                    width,
                    height,
                    self.frame.width(),
                    self.frame.height()
                );
            },
        }
    }

    /// Returns false when the iteration has to be abandoned
    fn apply_pending_resize(&mut self) -> bool {
        let Some((width, height)) = self.pending_resize.take() else {
            return true;
        };
        if (width, height) == self.frame.size() {
            return true;
        }
        match self.frame.resize(width, height) {
            Ok(()) => {
                log::info!("Frame buffer resized to {}x{}", width, height);
                true
            },
            Err(FrameError::ZeroArea { .. }) => {
                // Minimised window: keep drawing into the previous generation
                log::debug!("Ignoring resize to {}x{}", width, height);
                true
            },
            Err(e) => {
                log::warn!("Resize failed: {}; retrying next frame", e);
                self.pending_resize = Some((width, height));
                false
            },
        }
    }

    fn report_fps(&mut self) {
        let Some(fps) = self.fps.as_mut() else {
            return;
        };
        fps.tick();
        if fps.report_due(FPS_REPORT_INTERVAL) {
            let (min_fps, max_fps) = fps.min_max_fps();
            log::info!(
                "FPS {:.0} avg  {:.0} min  {:.0} max  {:.1}ms",
                fps.avg_fps(),
                min_fps,
                max_fps,
                fps.avg_frame_time_ms()
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::input::Button;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Wait,
        Poll,
        Present { width: u32, height: u32, first: [u8; 4] },
        Flush { samples: usize },
    }

    /// Records every call and replays scripted events, one batch per poll
    #[derive(Default)]
    struct MockFrontend {
        calls: Vec<Call>,
        script: VecDeque<Vec<InputEvent>>,
        fail_audio: bool,
    }

    impl MockFrontend {
        fn scripted(batches: Vec<Vec<InputEvent>>) -> Self {
            Self {
                script: batches.into(),
                ..Self::default()
            }
        }
    }

    impl Frontend for MockFrontend {
        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.calls.push(Call::Poll);
            self.script.pop_front().unwrap_or_default()
        }

        fn present(&mut self, frame: FrameView<'_>) -> Result<(), PlatformError> {
            self.calls.push(Call::Present {
                width: frame.width(),
                height: frame.height(),
                first: frame.pixel(0, 0).unwrap_or_default(),
            });
            Ok(())
        }

        fn flush_audio(&mut self, audio: &AudioRing) -> Result<(), PlatformError> {
            if self.fail_audio {
                return Err(PlatformError::AudioWrite("device gone".into()));
            }
            self.calls.push(Call::Flush {
                samples: audio.samples().len(),
            });
            Ok(())
        }

        fn wait_for_audio(&mut self) {
            self.calls.push(Call::Wait);
        }
    }

    fn platform(frontend: MockFrontend, mode: ResizeMode) -> PlatformLoop<MockFrontend> {
        PlatformLoop::new(
            frontend,
            FrameBuffer::with_size(800, 600).unwrap(),
            AudioRing::new(48000, 60, 3000).unwrap(),
            GameState::new(&GameConfig::default()),
            mode,
        )
    }

    #[test]
    fn test_iteration_order() {
        let mut p = platform(MockFrontend::default(), ResizeMode::Stretch);
        p.step().unwrap();

        assert_eq!(
            p.frontend().calls,
            vec![
                Call::Wait,
                Call::Poll,
                Call::Present {
                    width: 800,
                    height: 600,
                    first: [1, 0, 0, 0]
                },
                Call::Flush { samples: 1600 },
            ]
        );
        assert_eq!(p.frames_rendered(), 1);
    }

    #[test]
    fn test_quit_stops_before_rendering() {
        let frontend = MockFrontend::scripted(vec![vec![], vec![InputEvent::Quit]]);
        let mut p = platform(frontend, ResizeMode::Stretch);
        p.run().unwrap();

        assert!(!p.is_running());
        assert_eq!(p.frames_rendered(), 1);
        assert_eq!(p.frontend().calls.last(), Some(&Call::Poll));
    }

    #[test]
    fn test_match_mode_resizes_before_render() {
        let frontend = MockFrontend::scripted(vec![vec![InputEvent::Resized {
            width: 1024,
            height: 768,
        }]]);
        let mut p = platform(frontend, ResizeMode::Match);
        p.step().unwrap();

        assert_eq!(p.frame().size(), (1024, 768));
        assert_eq!(p.frame().as_bytes().len(), 1024 * 768 * 4);
        assert!(p.frontend().calls.iter().any(|c| matches!(
            c,
            Call::Present {
                width: 1024,
                height: 768,
                ..
            }
        )));
    }

    #[test]
    fn test_stretch_mode_keeps_logical_size() {
        let frontend = MockFrontend::scripted(vec![vec![InputEvent::Resized {
            width: 1024,
            height: 768,
        }]]);
        let mut p = platform(frontend, ResizeMode::Stretch);
        p.step().unwrap();
        assert_eq!(p.frame().size(), (800, 600));
    }

    #[test]
    fn test_zero_size_resize_ignored() {
        let frontend = MockFrontend::scripted(vec![vec![InputEvent::Resized {
            width: 0,
            height: 0,
        }]]);
        let mut p = platform(frontend, ResizeMode::Match);
        p.step().unwrap();
        assert_eq!(p.frame().size(), (800, 600));
        assert_eq!(p.frames_rendered(), 1);
    }

    #[test]
    fn test_button_events_reach_core() {
        let frontend = MockFrontend::scripted(vec![vec![InputEvent::Button {
            button: Button::ToneUp,
            is_down: true,
        }]]);
        let mut p = platform(frontend, ResizeMode::Stretch);
        p.step().unwrap();
        assert_eq!(p.state().tone_hz, 460.0);
        p.step().unwrap();
        assert_eq!(p.state().tone_hz, 460.0);
    }

    #[test]
    fn test_failed_resize_still_feeds_audio() {
        // Too large to describe, so the resize fails every time
        let frontend = MockFrontend::scripted(vec![vec![InputEvent::Resized {
            width: u32::MAX,
            height: u32::MAX,
        }]]);
        let mut p = platform(frontend, ResizeMode::Match);
        p.step().unwrap();
        p.step().unwrap();

        assert_eq!(p.frame().size(), (800, 600));
        assert_eq!(p.frames_rendered(), 0);
        assert_eq!(
            p.frontend().calls,
            vec![
                Call::Wait,
                Call::Poll,
                Call::Flush { samples: 1600 },
                Call::Wait,
                Call::Poll,
                Call::Flush { samples: 1600 },
            ]
        );
    }

    #[test]
    fn test_audio_failure_is_fatal() {
        let frontend = MockFrontend {
            fail_audio: true,
            ..MockFrontend::default()
        };
        let mut p = platform(frontend, ResizeMode::Stretch);
        assert!(matches!(p.run(), Err(PlatformError::AudioWrite(_))));
        assert_eq!(p.frames_rendered(), 0);
    }
}
