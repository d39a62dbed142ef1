mod device;

pub use device::SdlAudioOut;

use thiserror::Error;

/// Interleaved stereo: left, right, left, right, ...
pub const CHANNELS: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),

    #[error("{periods_per_second} periods per second leaves no samples at {sample_rate} Hz")]
    InvalidPeriod {
        periods_per_second: u32,
        sample_rate: u32,
    },

    #[error("volume {0} exceeds the 16-bit sample range")]
    VolumeOutOfRange(u16),
}

/// Per-period staging buffer the core synthesizes into and the platform
/// flushes to the device.
///
/// Sized once for the device session: `sample_count` stereo frames, i.e.
/// `sample_count * 2` samples. Never resized; a new device session builds a
/// new ring.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioRing {
    samples: Vec<i16>,
    sample_count: usize,
    sample_rate: u32,
    volume: i16,
}

impl AudioRing {
    /// Ring holding one device period: `sample_rate / periods_per_second`
    /// stereo frames.
    pub fn new(sample_rate: u32, periods_per_second: u32, volume: u16) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }
        if periods_per_second == 0 || periods_per_second > sample_rate {
            return Err(AudioError::InvalidPeriod {
                periods_per_second,
                sample_rate,
            });
        }
        Self::with_sample_count(sample_rate, (sample_rate / periods_per_second) as usize, volume)
    }

    /// Ring with an explicit frame count. Zero frames is valid and makes
    /// synthesis a no-op.
    pub fn with_sample_count(
        sample_rate: u32,
        sample_count: usize,
        volume: u16,
    ) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(sample_rate));
        }
        let volume = i16::try_from(volume).map_err(|_| AudioError::VolumeOutOfRange(volume))?;
        Ok(Self {
            samples: vec![0; sample_count * CHANNELS],
            sample_count,
            sample_rate,
            volume,
        })
    }

    /// Stereo frames per period
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn volume(&self) -> i16 {
        self.volume
    }

    /// Interleaved samples, exactly `sample_count * 2` long
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// One `[left, right]` pair per stereo frame
    pub fn frames_mut(&mut self) -> std::slice::ChunksExactMut<'_, i16> {
        self.samples.chunks_exact_mut(CHANNELS)
    }

    /// Size of one period in bytes as the device sees it
    pub fn byte_len(&self) -> usize {
        self.samples.len() * std::mem::size_of::<i16>()
    }

    pub fn silence(&mut self) {
        self.samples.fill(0);
    }
}
