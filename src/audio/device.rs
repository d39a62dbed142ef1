//! SDL2 audio queue output

use sdl2::audio::{AudioQueue, AudioSpecDesired};
use sdl2::AudioSubsystem;
use std::thread;
use std::time::{Duration, Instant};

use super::{AudioRing, CHANNELS};
use crate::config::{AudioConfig, UnderrunPolicy};
use crate::platform::PlatformError;

/// Longest the loop will block waiting for the device to drain
const MAX_WAIT: Duration = Duration::from_millis(250);

const FRAME_BYTES: u32 = (CHANNELS * std::mem::size_of::<i16>()) as u32;

/// Tracks whether the device queue has run dry between flushes
#[derive(Debug, Clone)]
struct UnderrunGuard {
    policy: UnderrunPolicy,
    primed: bool,
    underruns: u64,
}

impl UnderrunGuard {
    fn new(policy: UnderrunPolicy, primed: bool) -> Self {
        Self {
            policy,
            primed,
            underruns: 0,
        }
    }

    /// Check the queue level right before a flush. An empty queue only
    /// counts once something has been queued.
    fn observe(&mut self, queued_frames: u32) -> Result<(), PlatformError> {
        if !self.primed || queued_frames > 0 {
            return Ok(());
        }
        self.underruns += 1;
        match self.policy {
            UnderrunPolicy::Terminate => Err(PlatformError::AudioUnderrun {
                count: self.underruns,
            }),
            UnderrunPolicy::Continue => {
                log::warn!("Audio underrun #{}: device queue ran dry", self.underruns);
                Ok(())
            },
        }
    }
}

/// Queue sizing derived from the period length and the device buffer the
/// driver actually granted.
///
/// SDL drains the queue one whole device buffer per callback and pads any
/// shortfall with silence, so after every flush the queue must hold at least
/// two device buffers or a single callback can empty it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueBudget {
    period_frames: u32,
    /// Frames the queue must hold right after a flush
    low_water_frames: u32,
    /// `wait_for_room` blocks while more than this is queued
    limit_frames: u32,
    /// Silent periods queued before the device starts
    prefill_periods: u32,
}

impl QueueBudget {
    fn new(
        period_frames: u32,
        device_frames: u32,
        max_queued_periods: u32,
        prefill_periods: u32,
    ) -> Self {
        let period_frames = period_frames.max(1);
        let low_water_frames = device_frames.saturating_mul(2);
        // The queue drains in device-sized steps, so the loop is released
        // anywhere in (limit - device, limit]; that floor still has to clear
        // the low-water mark after one more period
        let limit_frames = period_frames
            .saturating_mul(max_queued_periods)
            .max(device_frames.saturating_mul(3));
        let prefill_periods = prefill_periods.max(low_water_frames.div_ceil(period_frames));
        Self {
            period_frames,
            low_water_frames,
            limit_frames,
            prefill_periods,
        }
    }

    /// Silent periods to queue ahead of the next period so the queue ends at
    /// or above the low-water mark
    fn top_up_periods(&self, queued_frames: u32) -> u32 {
        let after = queued_frames.saturating_add(self.period_frames);
        self.low_water_frames
            .saturating_sub(after)
            .div_ceil(self.period_frames)
    }
}

/// Device buffer to ask for: the period rounded up to a power of two
fn requested_device_frames(period_frames: u32) -> u16 {
    period_frames
        .max(1)
        .checked_next_power_of_two()
        .map_or(1 << 15, |n| n.min(1 << 15)) as u16
}

/// Stereo i16 output through an SDL audio queue
pub struct SdlAudioOut {
    queue: AudioQueue<i16>,
    budget: QueueBudget,
    silence: Vec<i16>,
    guard: UnderrunGuard,
}

impl SdlAudioOut {
    /// Open the device and build the staging ring from what it granted.
    /// Any failure here is a configuration failure for the session.
    pub fn open(
        audio: &AudioSubsystem,
        config: &AudioConfig,
    ) -> Result<(Self, AudioRing), PlatformError> {
        let period_hint = config.sample_rate / config.periods_per_second.max(1);
        let desired = AudioSpecDesired {
            freq: Some(config.sample_rate as i32),
            channels: Some(CHANNELS as u8),
            samples: Some(requested_device_frames(period_hint)),
        };
        let queue = audio
            .open_queue::<i16, _>(None, &desired)
            .map_err(PlatformError::Sdl)?;

        let spec = queue.spec();
        if usize::from(spec.channels) != CHANNELS {
            return Err(PlatformError::Sdl(format!(
                "audio device opened with {} channels, need {}",
                spec.channels, CHANNELS
            )));
        }
        let granted = spec.freq.max(0) as u32;
        if granted != config.sample_rate {
            log::warn!(
                "Requested {} Hz, device granted {} Hz",
                config.sample_rate,
                granted
            );
        }

        let ring = AudioRing::new(granted, config.periods_per_second, config.volume)?;
        let budget = QueueBudget::new(
            ring.sample_count() as u32,
            u32::from(spec.samples),
            config.max_queued_periods,
            config.prefill_periods,
        );
        log::info!(
            "Audio: {} Hz, {} frames per period, device buffer {} frames, queue limit {} frames",
            ring.sample_rate(),
            ring.sample_count(),
            spec.samples,
            budget.limit_frames
        );
        if budget.prefill_periods > config.prefill_periods {
            log::debug!(
                "Prefill raised to {} periods to cover the device buffer",
                budget.prefill_periods
            );
        }

        let silence = vec![0; ring.samples().len()];
        for _ in 0..budget.prefill_periods {
            queue.queue_audio(&silence).map_err(PlatformError::AudioWrite)?;
        }
        queue.resume();

        let out = Self {
            queue,
            budget,
            silence,
            guard: UnderrunGuard::new(config.underrun_policy, budget.prefill_periods > 0),
        };
        Ok((out, ring))
    }

    fn queued_frames(&self) -> u32 {
        self.queue.size() / FRAME_BYTES
    }

    /// Queue exactly one period, preceded by silence when the device is
    /// close to draining. A rejected write is fatal.
    pub fn flush(&mut self, ring: &AudioRing) -> Result<(), PlatformError> {
        let queued = self.queued_frames();
        self.guard.observe(queued)?;

        let top_up = self.budget.top_up_periods(queued);
        if top_up > 0 {
            log::debug!("Audio queue at {} frames, padding {} silent periods", queued, top_up);
        }
        for _ in 0..top_up {
            self.queue
                .queue_audio(&self.silence)
                .map_err(PlatformError::AudioWrite)?;
        }
        self.queue
            .queue_audio(ring.samples())
            .map_err(PlatformError::AudioWrite)?;
        self.guard.primed = true;
        Ok(())
    }

    /// Block until the queue is back under its limit
    pub fn wait_for_room(&self) {
        let start = Instant::now();
        while self.queued_frames() > self.budget.limit_frames {
            if start.elapsed() > MAX_WAIT {
                log::warn!("Audio device is not draining; continuing without waiting");
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
