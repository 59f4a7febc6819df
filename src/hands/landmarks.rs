use std::fmt;

/// Number of landmarks in one hand pose
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices in the MediaPipe hand model
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Tips of the index..pinky fingers
    pub const FINGER_TIPS: [usize; 4] = [
        INDEX_FINGER_TIP,
        MIDDLE_FINGER_TIP,
        RING_FINGER_TIP,
        PINKY_TIP,
    ];

    /// PIP joints paired with [`FINGER_TIPS`]
    pub const FINGER_PIPS: [usize; 4] = [
        INDEX_FINGER_PIP,
        MIDDLE_FINGER_PIP,
        RING_FINGER_PIP,
        PINKY_PIP,
    ];
}

/// Bones of the hand skeleton as landmark index pairs
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (0, 17),
];

/// One landmark in normalized image coordinates; `z` is depth relative to
/// the wrist
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Position in pixels for a frame of the given size
    pub fn to_pixels(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub type HandLandmarks = [Landmark; LANDMARK_COUNT];

/// Which hand a pose belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    /// Parse a handedness label as reported by the detector
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// The opposite side. Detector labels refer to the unmirrored image, so
    /// the side shown on a mirrored frame is the opposite one.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hand found by the detector in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHand {
    pub landmarks: HandLandmarks,
    /// Handedness as reported by the detector
    pub label: HandSide,
    pub score: f32,
}

impl DetectedHand {
    pub fn new(label: HandSide, landmarks: HandLandmarks) -> Self {
        Self {
            landmarks,
            label,
            score: 1.0,
        }
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[index::WRIST]
    }

    /// All landmarks in pixel coordinates
    pub fn pixel_points(&self, width: u32, height: u32) -> Vec<(f32, f32)> {
        self.landmarks
            .iter()
            .map(|lm| lm.to_pixels(width, height))
            .collect()
    }
}
