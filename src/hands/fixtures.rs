//! Synthetic hand poses for tests

use super::landmarks::{index, DetectedHand, HandLandmarks, HandSide, Landmark, LANDMARK_COUNT};

/// Build a hand pose centred on `center_x` whose fingers (thumb..pinky)
/// read as extended or curled according to `fingers`. `side` is the side the
/// pose is evaluated as, i.e. the side shown on the mirrored frame.
pub fn pose_at(side: HandSide, center_x: f32, fingers: [bool; 5]) -> HandLandmarks {
    let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
    let outward = match side {
        HandSide::Right => 1.0,
        HandSide::Left => -1.0,
    };

    landmarks[index::WRIST] = Landmark::new(center_x, 0.8);

    landmarks[index::THUMB_CMC] = Landmark::new(center_x + 0.02 * outward, 0.72);
    landmarks[index::THUMB_MCP] = Landmark::new(center_x + 0.04 * outward, 0.66);
    landmarks[index::THUMB_IP] = Landmark::new(center_x + 0.06 * outward, 0.6);
    landmarks[index::THUMB_TIP] = if fingers[0] {
        Landmark::new(center_x + 0.1 * outward, 0.6)
    } else {
        Landmark::new(center_x + 0.02 * outward, 0.7)
    };

    for finger in 0..4 {
        let tip = index::FINGER_TIPS[finger];
        let pip = index::FINGER_PIPS[finger];
        let x = center_x - 0.03 * outward + finger as f32 * 0.03 * -outward;

        landmarks[pip - 1] = Landmark::new(x, 0.6);
        landmarks[pip] = Landmark::new(x, 0.5);
        if fingers[finger + 1] {
            landmarks[tip - 1] = Landmark::new(x, 0.4);
            landmarks[tip] = Landmark::new(x, 0.3);
        } else {
            landmarks[tip - 1] = Landmark::new(x, 0.52);
            landmarks[tip] = Landmark::new(x, 0.56);
        }
    }

    landmarks
}

/// A detected hand whose reported label mirrors to `shown_side`
pub fn hand_with_fingers(shown_side: HandSide, fingers: [bool; 5]) -> DetectedHand {
    let center_x = match shown_side {
        HandSide::Right => 0.7,
        HandSide::Left => 0.3,
    };
    DetectedHand::new(
        shown_side.mirrored(),
        pose_at(shown_side, center_x, fingers),
    )
}

/// Like [`hand_with_fingers`] with the wrist moved to `center_x`
pub fn hand_at(shown_side: HandSide, center_x: f32, fingers: [bool; 5]) -> DetectedHand {
    DetectedHand::new(shown_side.mirrored(), pose_at(shown_side, center_x, fingers))
}
