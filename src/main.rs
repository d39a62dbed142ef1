// Allow unused accessors that only the tests exercise for now
#![allow(dead_code)]

mod audio;
mod config;
mod display;
mod game;
mod input;
mod platform;
mod util;

use std::path::PathBuf;

use audio::{AudioRing, SdlAudioOut};
use config::{Config, ResizeMode, DEFAULT_CONFIG_PATH};
use display::{Display, FrameBuffer};
use game::GameState;
use platform::{PlatformError, PlatformLoop, SdlFrontend};
use util::FpsCounter;

/// Command line overrides, applied on top of the config file
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    write_config: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    no_vsync: bool,
    no_audio: bool,
    match_window: bool,
    show_fps: bool,
}

fn print_help() {
    println!("Usage: backbuffer [OPTIONS]");
    println!();
    println!("Options:");
    println!(
        "  --config PATH         Load settings from PATH (default: {} if present)",
        DEFAULT_CONFIG_PATH
    );
    println!("  --write-config PATH   Write the effective settings to PATH and exit");
    println!("  --width W, -w W       Set window width");
    println!("  --height H, -h H      Set window height");
    println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1024x768)");
    println!("  --no-vsync            Disable VSync; the audio queue paces the loop");
    println!("  --no-audio            Run without an audio device");
    println!("  --match-window        Resize the frame buffer with the window instead of scaling");
    println!("  --show-fps            Log frame timing once per second");
    println!("  --help                Show this help message");
    println!();
    println!("Controls:");
    println!("  A/D, Left/Right  Scroll horizontally");
    println!("  W/S, Up/Down     Scroll vertically");
    println!("  = / -            Raise / lower the tone");
    println!("  Tab              Toggle sine / square");
    println!("  Escape           Quit");
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => options.no_vsync = true,
            "--no-audio" => options.no_audio = true,
            "--match-window" => options.match_window = true,
            "--show-fps" => options.show_fps = true,
            "--config" => {
                if i + 1 < args.len() {
                    options.config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            },
            "--write-config" => {
                if i + 1 < args.len() {
                    options.write_config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            },
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    options.width = args[i + 1].parse().ok();
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    options.height = args[i + 1].parse().ok();
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < args.len() {
                    // Parse WxH format (e.g., 1024x768)
                    if let Some((w, h)) = args[i + 1].split_once('x') {
                        if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                            options.width = Some(w);
                            options.height = Some(h);
                        }
                    }
                    i += 1;
                }
            },
            "--help" => {
                print_help();
                std::process::exit(0);
            },
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    options
}

/// Explicit --config must exist; the default path is optional
fn load_config(options: &Options) -> Result<Config, PlatformError> {
    match &options.config {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            Ok(Config::load(path)?)
        },
        None => match Config::load(DEFAULT_CONFIG_PATH) {
            Ok(config) => {
                log::info!("Loaded config from {}", DEFAULT_CONFIG_PATH);
                Ok(config)
            },
            Err(config::ConfigError::Io(_)) => Ok(Config::default()),
            Err(e) => Err(e.into()),
        },
    }
}

fn apply_overrides(config: &mut Config, options: &Options) {
    if let Some(w) = options.width {
        config.window.width = w;
    }
    if let Some(h) = options.height {
        config.window.height = h;
    }
    if options.no_vsync {
        config.window.vsync = false;
    }
    if options.no_audio {
        config.audio.enabled = false;
    }
    if options.match_window {
        config.window.resize_mode = ResizeMode::Match;
    }
}

fn run() -> Result<(), PlatformError> {
    let options = parse_args();
    let mut config = load_config(&options)?;
    apply_overrides(&mut config, &options);
    config.validate()?;

    if let Some(path) = &options.write_config {
        config.save(path)?;
        log::info!("Wrote config to {}", path.display());
        return Ok(());
    }

    let window = &config.window;
    log::info!("=== backbuffer ===");
    log::info!(
        "Resolution: {}x{}, VSync {}, resize mode {:?}",
        window.width,
        window.height,
        if window.vsync { "on" } else { "off" },
        window.resize_mode
    );

    let (display, texture_creator) =
        Display::with_options(&window.title, window.width, window.height, window.vsync)
            .map_err(PlatformError::Sdl)?;

    let a = &config.audio;
    let (audio_out, ring) = if a.enabled {
        let subsystem = display.audio().map_err(PlatformError::Sdl)?;
        let (out, ring) = SdlAudioOut::open(&subsystem, a)?;
        (Some(out), ring)
    } else {
        log::info!("Audio disabled");
        (None, AudioRing::new(a.sample_rate, a.periods_per_second, a.volume)?)
    };

    let frontend = SdlFrontend::new(display, &texture_creator, audio_out)?;
    let frame = FrameBuffer::with_size(window.width, window.height)?;
    let state = GameState::new(&config.game);

    let mut platform = PlatformLoop::new(frontend, frame, ring, state, window.resize_mode);
    if options.show_fps {
        platform = platform.with_fps_report(FpsCounter::new(60));
    }
    platform.run()
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
