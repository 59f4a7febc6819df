mod detector;
#[cfg(test)]
pub(crate) mod fixtures;
mod landmarks;
mod subprocess;

pub use detector::{initialize_detector, HandDetector, ScriptedDetector};
pub use landmarks::{
    index, DetectedHand, HandLandmarks, HandSide, Landmark, HAND_CONNECTIONS, LANDMARK_COUNT,
};
pub use subprocess::SubprocessDetector;
