use crate::hands::HandSide;

/// A key of the finger piano
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub name: &'static str,
    pub frequency: f32,
}

const fn note(name: &'static str, frequency: f32) -> Note {
    Note { name, frequency }
}

/// Right hand plays C4 to G4, thumb first
pub const RIGHT_HAND_NOTES: [Note; 5] = [
    note("C4", 261.63),
    note("D4", 293.66),
    note("E4", 329.63),
    note("F4", 349.23),
    note("G4", 392.00),
];

/// Left hand plays A4 to E5, thumb first
pub const LEFT_HAND_NOTES: [Note; 5] = [
    note("A4", 440.00),
    note("B4", 493.88),
    note("C5", 523.25),
    note("D5", 587.33),
    note("E5", 659.25),
];

/// Note played when `finger` (0 = thumb) of the shown `side` curls
pub fn note_for(side: HandSide, finger: usize) -> Option<Note> {
    let table = match side {
        HandSide::Right => &RIGHT_HAND_NOTES,
        HandSide::Left => &LEFT_HAND_NOTES,
    };
    table.get(finger).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_table() {
        assert_eq!(note_for(HandSide::Right, 0).unwrap().frequency, 261.63);
        assert_eq!(note_for(HandSide::Right, 4).unwrap().name, "G4");
        assert_eq!(note_for(HandSide::Left, 0).unwrap().frequency, 440.0);
        assert_eq!(note_for(HandSide::Left, 4).unwrap().frequency, 659.25);
        assert!(note_for(HandSide::Left, 5).is_none());
    }

    #[test]
    fn test_hands_cover_distinct_ranges() {
        let right_top = RIGHT_HAND_NOTES[4].frequency;
        assert!(LEFT_HAND_NOTES.iter().all(|n| n.frequency > right_top));
    }
}
