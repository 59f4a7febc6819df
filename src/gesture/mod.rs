mod fingers;
mod tracker;

pub use fingers::{compute_finger_states, count_extended, FingerStates, FINGER_NAMES};
pub use tracker::{GestureTracker, HandIdentity, IdentityStrategy, Transition};
