use super::audio::AudioSink;
use super::notes::{note_for, Note, LEFT_HAND_NOTES, RIGHT_HAND_NOTES};
use super::tone::{synthesize_tone, ToneBuffer};
use crate::config::AudioConfig;
use crate::hands::HandSide;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What happened to a release event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteOutcome {
    /// A voice thread is playing the note
    Dispatched(Note),
    /// The voice cap was reached or no thread could be started
    Dropped(Note),
    /// No note is mapped to this finger
    Unmapped,
}

/// Turns finger releases into notes played on detached voice threads
pub struct PianoEngine {
    sink: Arc<dyn AudioSink>,
    right_tones: Vec<Arc<ToneBuffer>>,
    left_tones: Vec<Arc<ToneBuffer>>,
    max_voices: usize,
    active_voices: Arc<AtomicUsize>,
}

impl PianoEngine {
    pub fn new(sink: Arc<dyn AudioSink>, config: &AudioConfig) -> Self {
        let render = |notes: &[Note]| -> Vec<Arc<ToneBuffer>> {
            notes
                .iter()
                .map(|note| {
                    Arc::new(synthesize_tone(
                        note.frequency,
                        config.note_duration(),
                        config.sample_rate,
                    ))
                })
                .collect()
        };

        debug!(
            "Piano engine ready ({} Hz, {:?} notes, voice cap {})",
            config.sample_rate,
            config.note_duration(),
            config.max_voices
        );

        Self {
            sink,
            right_tones: render(&RIGHT_HAND_NOTES),
            left_tones: render(&LEFT_HAND_NOTES),
            max_voices: config.max_voices,
            active_voices: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Play the note of `finger` (0 = thumb) on the shown `side`. Never
    /// blocks and never fails; playback errors are logged and dropped.
    pub fn on_release(&self, side: HandSide, finger: usize) -> NoteOutcome {
        let Some(note) = note_for(side, finger) else {
            return NoteOutcome::Unmapped;
        };
        let tones = match side {
            HandSide::Right => &self.right_tones,
            HandSide::Left => &self.left_tones,
        };
        let Some(tone) = tones.get(finger).cloned() else {
            return NoteOutcome::Unmapped;
        };

        if !self.claim_voice() {
            debug!("Voice cap reached, dropping {}", note.name);
            return NoteOutcome::Dropped(note);
        }

        let sink = Arc::clone(&self.sink);
        let active = Arc::clone(&self.active_voices);
        let spawned = std::thread::Builder::new()
            .name("piano-voice".to_string())
            .spawn(move || {
                if let Err(e) = sink.play(&tone) {
                    trace!("Note at {} Hz not played: {}", tone.frequency, e);
                }
                active.fetch_sub(1, Ordering::AcqRel);
            });

        match spawned {
            Ok(_) => {
                trace!("Playing {} ({} Hz)", note.name, note.frequency);
                NoteOutcome::Dispatched(note)
            }
            Err(e) => {
                self.active_voices.fetch_sub(1, Ordering::AcqRel);
                warn!("Could not start voice thread: {}", e);
                NoteOutcome::Dropped(note)
            }
        }
    }

    fn claim_voice(&self) -> bool {
        if self.max_voices == 0 {
            self.active_voices.fetch_add(1, Ordering::AcqRel);
            return true;
        }

        self.active_voices
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < self.max_voices).then_some(active + 1)
            })
            .is_ok()
    }

    pub fn active_voices(&self) -> usize {
        self.active_voices.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FingerplayConfig;
    use crate::piano::RecordingAudioSink;
    use std::time::Duration;

    fn audio_config(max_voices: usize) -> AudioConfig {
        AudioConfig {
            max_voices,
            ..FingerplayConfig::default().audio
        }
    }

    #[test]
    fn test_release_plays_mapped_note() {
        let sink = Arc::new(RecordingAudioSink::new());
        let engine = PianoEngine::new(sink.clone(), &audio_config(16));

        let outcome = engine.on_release(HandSide::Right, 2);
        assert!(matches!(outcome, NoteOutcome::Dispatched(note) if note.name == "E4"));

        assert!(sink.wait_for(1, Duration::from_secs(2)));
        assert_eq!(sink.played(), vec![329.63]);
    }

    #[test]
    fn test_unmapped_finger() {
        let engine = PianoEngine::new(Arc::new(RecordingAudioSink::new()), &audio_config(16));
        assert_eq!(engine.on_release(HandSide::Left, 7), NoteOutcome::Unmapped);
    }

    #[test]
    fn test_voice_cap_drops_excess_notes() {
        let sink = Arc::new(RecordingAudioSink::with_hold(Duration::from_millis(500)));
        let engine = PianoEngine::new(sink.clone(), &audio_config(2));

        let outcomes: Vec<NoteOutcome> = (0..3)
            .map(|finger| engine.on_release(HandSide::Left, finger))
            .collect();

        assert!(matches!(outcomes[0], NoteOutcome::Dispatched(_)));
        assert!(matches!(outcomes[1], NoteOutcome::Dispatched(_)));
        assert!(matches!(outcomes[2], NoteOutcome::Dropped(note) if note.name == "C5"));
    }

    #[test]
    fn test_voices_are_returned_after_playback() {
        let sink = Arc::new(RecordingAudioSink::failing());
        let engine = PianoEngine::new(sink.clone(), &audio_config(1));

        assert!(matches!(
            engine.on_release(HandSide::Right, 0),
            NoteOutcome::Dispatched(_)
        ));
        assert!(sink.wait_for(1, Duration::from_secs(2)));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while engine.active_voices() > 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(engine.active_voices(), 0);

        assert!(matches!(
            engine.on_release(HandSide::Right, 1),
            NoteOutcome::Dispatched(_)
        ));
    }

    #[test]
    fn test_zero_cap_is_unbounded() {
        let sink = Arc::new(RecordingAudioSink::with_hold(Duration::from_millis(200)));
        let engine = PianoEngine::new(sink.clone(), &audio_config(0));

        for finger in 0..5 {
            assert!(matches!(
                engine.on_release(HandSide::Right, finger),
                NoteOutcome::Dispatched(_)
            ));
        }
        assert!(sink.wait_for(5, Duration::from_secs(2)));
    }
}
