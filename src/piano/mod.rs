mod audio;
mod engine;
mod notes;
mod tone;

#[cfg(feature = "audio")]
pub use audio::CpalAudioSink;
pub use audio::{AudioSink, NullAudioSink, RecordingAudioSink};
pub use engine::{NoteOutcome, PianoEngine};
pub use notes::{note_for, Note, LEFT_HAND_NOTES, RIGHT_HAND_NOTES};
pub use tone::{synthesize_tone, ToneBuffer, TONE_AMPLITUDE, TONE_CHANNELS};
