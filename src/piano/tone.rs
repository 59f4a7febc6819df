use std::f64::consts::PI;
use std::time::Duration;

/// Peak amplitude of a synthesized note before the envelope
pub const TONE_AMPLITUDE: f64 = 4096.0;

pub const TONE_CHANNELS: u16 = 2;

/// Interleaved stereo PCM for one note
#[derive(Debug, Clone, PartialEq)]
pub struct ToneBuffer {
    pub frequency: f32,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl ToneBuffer {
    /// Number of sample frames (one sample per channel each)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// Synthesize a sine note with a linear attack over the first 10% of the
/// samples and a linear release over the last 30%
pub fn synthesize_tone(frequency: f32, duration: Duration, sample_rate: u32) -> ToneBuffer {
    let frames = (duration.as_secs_f64() * sample_rate as f64) as usize;
    let attack_end = frames as f64 * 0.1;
    let release_start = frames as f64 * 0.7;
    let release_len = frames as f64 * 0.3;
    let max_sample = i16::MAX as f64;

    let mut samples = Vec::with_capacity(frames * TONE_CHANNELS as usize);
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let position = i as f64;

        let envelope = if position < attack_end {
            position / attack_end
        } else if position > release_start {
            1.0 - (position - release_start) / release_len
        } else {
            1.0
        };

        let wave = TONE_AMPLITUDE * (2.0 * PI * frequency as f64 * t).sin() * envelope;
        let sample = wave.clamp(-max_sample, max_sample) as i16;
        samples.push(sample);
        samples.push(sample);
    }

    ToneBuffer {
        frequency,
        sample_rate,
        channels: TONE_CHANNELS,
        samples,
    }
}
