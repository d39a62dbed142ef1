use sdl2::render::TextureCreator;
use sdl2::video::WindowContext;

use super::{Frontend, PlatformError};
use crate::audio::{AudioRing, SdlAudioOut};
use crate::display::{Display, FrameView, RenderTarget};
use crate::input::InputEvent;

/// SDL2 window plus optional audio queue. Without a device the samples are
/// synthesized as usual and dropped at flush.
pub struct SdlFrontend<'a> {
    display: Display,
    texture_creator: &'a TextureCreator<WindowContext>,
    target: RenderTarget<'a>,
    audio: Option<SdlAudioOut>,
}

impl<'a> SdlFrontend<'a> {
    pub fn new(
        display: Display,
        texture_creator: &'a TextureCreator<WindowContext>,
        audio: Option<SdlAudioOut>,
    ) -> Result<Self, PlatformError> {
        let (width, height) = display.output_size().map_err(PlatformError::Sdl)?;
        let target = RenderTarget::with_size(texture_creator, width.max(1), height.max(1))
            .map_err(PlatformError::Sdl)?;
        Ok(Self {
            display,
            texture_creator,
            target,
            audio,
        })
    }

    /// Recreate the texture when the drawable size changed. A zero-sized
    /// drawable (minimised) keeps the old texture.
    fn sync_target_size(&mut self) -> Result<(), PlatformError> {
        let (width, height) = self.display.output_size().map_err(PlatformError::Sdl)?;
        if width == 0 || height == 0 || (width, height) == self.target.size() {
            return Ok(());
        }
        self.target = RenderTarget::with_size(self.texture_creator, width, height)
            .map_err(PlatformError::Sdl)?;
        log::info!("Presentation surface now {}x{}", width, height);
        Ok(())
    }
}

impl Frontend for SdlFrontend<'_> {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.display.poll_events()
    }

    fn present(&mut self, frame: FrameView<'_>) -> Result<(), PlatformError> {
        self.sync_target_size()?;
        self.display.present(&mut self.target, frame)
    }

    fn flush_audio(&mut self, audio: &AudioRing) -> Result<(), PlatformError> {
        match self.audio.as_mut() {
            Some(out) => out.flush(audio),
            None => Ok(()),
        }
    }

    fn wait_for_audio(&mut self) {
        if let Some(out) = &self.audio {
            out.wait_for_room();
        }
    }
}
