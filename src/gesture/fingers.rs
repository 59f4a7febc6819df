use crate::hands::{index, HandLandmarks, HandSide};

/// Extended (`true`) or curled state of thumb, index, middle, ring, pinky
pub type FingerStates = [bool; 5];

pub const FINGER_NAMES: [&str; 5] = ["thumb", "index", "middle", "ring", "pinky"];

/// Derive which fingers are extended from one hand pose.
///
/// `side` is the side shown on the mirrored frame. The thumb is extended when
/// its tip lies outward of the IP joint (right of it for a right hand, left
/// of it for a left hand), or failing that when the tip is above both the IP
/// and MCP joints. The other fingers are extended when the tip is above the
/// PIP joint.
pub fn compute_finger_states(landmarks: &HandLandmarks, side: HandSide) -> FingerStates {
    let mut states = [false; 5];

    let tip = landmarks[index::THUMB_TIP];
    let ip = landmarks[index::THUMB_IP];
    let mcp = landmarks[index::THUMB_MCP];

    states[0] = match side {
        HandSide::Right => tip.x > ip.x,
        HandSide::Left => tip.x < ip.x,
    };
    if !states[0] {
        states[0] = tip.y < ip.y && tip.y < mcp.y;
    }

    for (finger, (&tip, &pip)) in index::FINGER_TIPS
        .iter()
        .zip(index::FINGER_PIPS.iter())
        .enumerate()
    {
        states[finger + 1] = landmarks[tip].y < landmarks[pip].y;
    }

    states
}

/// Number of extended fingers
pub fn count_extended(states: &FingerStates) -> usize {
    states.iter().filter(|&&extended| extended).count()
}
