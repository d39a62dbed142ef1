mod blit;
mod frame_buffer;

pub use frame_buffer::{FrameBuffer, FrameError, FrameView, FrameViewMut};

use blit::blit_scaled;

use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::{AudioSubsystem, EventPump, Sdl};

use crate::input::{Button, InputEvent};
use crate::platform::PlatformError;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// SDL window, renderer and event pump
pub struct Display {
    sdl: Sdl,
    canvas: Canvas<Window>,
    event_pump: EventPump,
}

/// Streaming texture the size of the drawable area. This is the physical
/// surface the presentation blit writes into; it belongs to the platform.
pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    width: u32,
    height: u32,
}

impl Display {
    /// Create a resizable window with custom resolution and VSync settings
    /// vsync=true: locked to monitor refresh (typically 60fps)
    /// vsync=false: uncapped framerate, paced by the audio queue instead
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl = sdl2::init()?;
        let video_subsystem = sdl.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl.event_pump()?;

        Ok((
            Self {
                sdl,
                canvas,
                event_pump,
            },
            texture_creator,
        ))
    }

    pub fn audio(&self) -> Result<AudioSubsystem, String> {
        self.sdl.audio()
    }

    /// Drawable size in physical pixels
    pub fn output_size(&self) -> Result<(u32, u32), String> {
        self.canvas.output_size()
    }

    /// Blit `frame` into the target texture at the texture's size, then flip
    pub fn present(
        &mut self,
        target: &mut RenderTarget,
        frame: FrameView<'_>,
    ) -> Result<(), PlatformError> {
        let (width, height) = (target.width, target.height);
        target
            .texture
            .with_lock(None, |pixels: &mut [u8], pitch: usize| {
                let mut dst = FrameViewMut::new(pixels, width, height, pitch)?;
                blit_scaled(frame, &mut dst);
                Ok::<(), FrameError>(())
            })
            .map_err(PlatformError::Sdl)??;

        self.canvas.copy(&target.texture, None, None).map_err(PlatformError::Sdl)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let canvas = &self.canvas;
        let drawable = || match canvas.output_size() {
            Ok(size) => Some(size),
            Err(e) => {
                log::warn!("Could not read drawable size: {}", e);
                None
            },
        };
        self.event_pump
            .poll_iter()
            .filter_map(|event| translate_event(&event, drawable))
            .collect()
    }
}

/// Map one SDL event. Window size changes are reported in window
/// coordinates, which differ from drawable pixels on HiDPI displays, so a
/// resize carries whatever `drawable` reads back from the renderer instead.
fn translate_event(
    event: &Event,
    drawable: impl FnOnce() -> Option<(u32, u32)>,
) -> Option<InputEvent> {
    match event {
        Event::Quit { .. }
        | Event::KeyDown {
            keycode: Some(Keycode::Escape),
            ..
        } => Some(InputEvent::Quit),
        Event::KeyDown {
            keycode: Some(k), ..
        } => map_keycode(*k).map(|button| InputEvent::Button {
            button,
            is_down: true,
        }),
        Event::KeyUp {
            keycode: Some(k), ..
        } => map_keycode(*k).map(|button| InputEvent::Button {
            button,
            is_down: false,
        }),
        Event::Window {
            win_event: WindowEvent::SizeChanged(..),
            ..
        } => drawable().map(|(width, height)| InputEvent::Resized { width, height }),
        _ => None,
    }
}

impl<'a> RenderTarget<'a> {
    /// Create a render target of the given physical size
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        // RGB888 is B, G, R, X in memory on little-endian, matching the
        // byte order the core renders
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn map_keycode(key: Keycode) -> Option<Button> {
    match key {
        Keycode::A | Keycode::Left => Some(Button::MoveLeft),
        Keycode::D | Keycode::Right => Some(Button::MoveRight),
        Keycode::W | Keycode::Up => Some(Button::MoveUp),
        Keycode::S | Keycode::Down => Some(Button::MoveDown),
        Keycode::Equals | Keycode::KpPlus => Some(Button::ToneUp),
        Keycode::Minus | Keycode::KpMinus => Some(Button::ToneDown),
        Keycode::Tab => Some(Button::ToggleWaveform),
        _ => None,
    }
}
