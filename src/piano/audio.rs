use super::tone::ToneBuffer;
use crate::error::AudioError;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Plays synthesized notes. `play` may block for the length of the note; it
/// is only called from voice threads.
pub trait AudioSink: Send + Sync {
    fn play(&self, tone: &ToneBuffer) -> Result<(), AudioError>;
}

/// Discards every note
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn play(&self, _tone: &ToneBuffer) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Records the frequency of every played note
#[derive(Default)]
pub struct RecordingAudioSink {
    played: Mutex<Vec<f32>>,
    hold: Duration,
    fail: bool,
}

impl RecordingAudioSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep each voice busy for `hold` before returning
    pub fn with_hold(hold: Duration) -> Self {
        Self {
            hold,
            ..Self::default()
        }
    }

    /// Record notes but report every playback as failed
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn played(&self) -> Vec<f32> {
        self.played.lock().clone()
    }

    /// Wait until at least `count` notes were played
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.played.lock().len() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl AudioSink for RecordingAudioSink {
    fn play(&self, tone: &ToneBuffer) -> Result<(), AudioError> {
        self.played.lock().push(tone.frequency);
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        if self.fail {
            return Err(AudioError::Stream {
                details: "recording sink set to fail".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "audio")]
pub use cpal_sink::CpalAudioSink;

#[cfg(feature = "audio")]
mod cpal_sink {
    use super::{AudioSink, ToneBuffer};
    use crate::error::AudioError;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SizedSample};
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::{info, warn};

    /// Grace period after the last sample so the device drains its buffer
    const DRAIN_TAIL: Duration = Duration::from_millis(50);

    /// Plays notes on the default output device. Each note opens its own
    /// stream on the calling voice thread, so notes overlap freely.
    pub struct CpalAudioSink;

    impl CpalAudioSink {
        pub fn new() -> Result<Self, AudioError> {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
            let name = device.name().unwrap_or_else(|_| "unknown".to_string());
            info!("Audio output on {}", name);
            Ok(Self)
        }
    }

    impl AudioSink for CpalAudioSink {
        fn play(&self, tone: &ToneBuffer) -> Result<(), AudioError> {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
            let supported = device
                .default_output_config()
                .map_err(|e| AudioError::Stream {
                    details: e.to_string(),
                })?;

            let config: cpal::StreamConfig = supported.config();
            let samples = Arc::new(resample(tone, config.sample_rate.0, config.channels));

            let stream = match supported.sample_format() {
                cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, samples)?,
                cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, samples)?,
                cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, samples)?,
                other => {
                    return Err(AudioError::Stream {
                        details: format!("unsupported output sample format: {other:?}"),
                    })
                }
            };

            stream.play().map_err(|e| AudioError::Stream {
                details: e.to_string(),
            })?;
            std::thread::sleep(tone.duration() + DRAIN_TAIL);
            Ok(())
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        samples: Arc<Vec<f32>>,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let mut position = 0usize;
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _| {
                    for slot in data.iter_mut() {
                        let value = samples.get(position).copied().unwrap_or(0.0);
                        position += 1;
                        *slot = T::from_sample(value);
                    }
                },
                |err| warn!("Audio stream error: {}", err),
                Some(Duration::from_millis(200)),
            )
            .map_err(|e| AudioError::Stream {
                details: e.to_string(),
            })
    }

    /// Convert a note to the device's rate and channel count as f32 samples
    fn resample(tone: &ToneBuffer, rate: u32, channels: u16) -> Vec<f32> {
        let source_frames = tone.frames();
        if source_frames == 0 || tone.sample_rate == 0 || rate == 0 {
            return Vec::new();
        }

        let source_channels = tone.channels.max(1) as usize;
        let frames = (source_frames as u64 * rate as u64 / tone.sample_rate as u64) as usize;
        let mut out = Vec::with_capacity(frames * channels as usize);

        for frame in 0..frames {
            let source = (frame as u64 * tone.sample_rate as u64 / rate as u64) as usize;
            let base = source.min(source_frames - 1) * source_channels;
            for channel in 0..channels as usize {
                let sample = tone.samples[base + channel.min(source_channels - 1)];
                out.push(sample as f32 / 32768.0);
            }
        }

        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::piano::synthesize_tone;

        #[test]
        fn test_resample_to_device_format() {
            let tone = synthesize_tone(440.0, Duration::from_millis(100), 22050);
            let out = resample(&tone, 44100, 1);

            assert_eq!(out.len(), tone.frames() * 2);
            assert!(out.iter().all(|s| s.abs() <= 4096.0 / 32768.0 + f32::EPSILON));
        }
    }
}
