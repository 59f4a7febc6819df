use super::fingers::FingerStates;
use crate::config::{GestureConfig, IdentityStrategyKind};
use crate::hands::{HandSide, Landmark};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// Frame-local identity of a hand: its side plus a slot number. With slot
/// keying the slot is the detection index, so identities are not stable
/// across reorderings or when a hand leaves and comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandIdentity {
    pub side: HandSide,
    pub slot: usize,
}

impl HandIdentity {
    pub fn new(side: HandSide, slot: usize) -> Self {
        Self { side, slot }
    }
}

impl fmt::Display for HandIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.side, self.slot)
    }
}

/// Edge between two consecutive finger states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Curled to extended
    Pressed,
    /// Extended to curled
    Released,
    None,
}

impl Transition {
    fn between(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (true, false) => Self::Released,
            (false, true) => Self::Pressed,
            _ => Self::None,
        }
    }
}

/// How detections are matched to identities from the previous frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdentityStrategy {
    /// Key by side and detection index
    SlotIndex,
    /// Reuse the identity of the closest previous wrist of the same side
    /// within `max_distance` (normalized units); ties and misses fall back
    /// to slot keying
    NearestWrist { max_distance: f32 },
}

impl From<&GestureConfig> for IdentityStrategy {
    fn from(config: &GestureConfig) -> Self {
        match config.identity {
            IdentityStrategyKind::Slot => Self::SlotIndex,
            IdentityStrategyKind::NearestWrist => Self::NearestWrist {
                max_distance: config.wrist_match_distance,
            },
        }
    }
}

/// Tracks the last finger states of every hand identity and reports edges
pub struct GestureTracker {
    strategy: IdentityStrategy,
    previous: HashMap<HandIdentity, FingerStates>,
    last_wrists: HashMap<HandIdentity, Landmark>,
}

impl GestureTracker {
    pub fn new(strategy: IdentityStrategy) -> Self {
        Self {
            strategy,
            previous: HashMap::new(),
            last_wrists: HashMap::new(),
        }
    }

    pub fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    /// Assign an identity to each detection of this frame, in order.
    /// `hands` holds the shown side and wrist position of each detection.
    pub fn resolve_identities(&mut self, hands: &[(HandSide, Landmark)]) -> Vec<HandIdentity> {
        let identities = match self.strategy {
            IdentityStrategy::SlotIndex => hands
                .iter()
                .enumerate()
                .map(|(slot, (side, _))| HandIdentity::new(*side, slot))
                .collect(),
            IdentityStrategy::NearestWrist { max_distance } => {
                self.match_wrists(hands, max_distance)
            }
        };

        self.last_wrists = identities
            .iter()
            .zip(hands)
            .map(|(identity, (_, wrist))| (*identity, *wrist))
            .collect();

        identities
    }

    fn match_wrists(&self, hands: &[(HandSide, Landmark)], max_distance: f32) -> Vec<HandIdentity> {
        let mut claimed: HashSet<HandIdentity> = HashSet::new();
        let mut resolved: Vec<Option<HandIdentity>> = vec![None; hands.len()];

        for (i, (side, wrist)) in hands.iter().enumerate() {
            let mut candidates: Vec<(f32, HandIdentity)> = self
                .last_wrists
                .iter()
                .filter(|(identity, _)| identity.side == *side && !claimed.contains(*identity))
                .map(|(identity, previous)| (previous.distance_to(wrist), *identity))
                .filter(|(distance, _)| *distance <= max_distance)
                .collect();
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let ambiguous = candidates.len() > 1 && candidates[0].0 == candidates[1].0;
            match candidates.first() {
                Some((distance, identity)) if !ambiguous => {
                    trace!("Matched hand {} to {} ({:.3})", i, identity, distance);
                    claimed.insert(*identity);
                    resolved[i] = Some(*identity);
                }
                _ => {}
            }
        }

        hands
            .iter()
            .zip(resolved)
            .enumerate()
            .map(|(i, ((side, _), matched))| match matched {
                Some(identity) => identity,
                None => {
                    let mut slot = i;
                    while claimed.contains(&HandIdentity::new(*side, slot)) {
                        slot += 1;
                    }
                    let identity = HandIdentity::new(*side, slot);
                    claimed.insert(identity);
                    identity
                }
            })
            .collect()
    }

    /// Compare `current` against the stored states of `identity` and store
    /// it. A new identity is seeded and reports no transitions.
    pub fn diff(&mut self, identity: HandIdentity, current: FingerStates) -> [Transition; 5] {
        let mut transitions = [Transition::None; 5];

        match self.previous.insert(identity, current) {
            Some(previous) => {
                for (finger, transition) in transitions.iter_mut().enumerate() {
                    *transition = Transition::between(previous[finger], current[finger]);
                }
            }
            None => debug!("Tracking new hand {}", identity),
        }

        transitions
    }

    /// Forget every identity not present in `active`
    pub fn prune(&mut self, active: &[HandIdentity]) {
        let before = self.previous.len();
        self.previous.retain(|identity, _| active.contains(identity));
        let removed = before - self.previous.len();
        if removed > 0 {
            debug!("Pruned {} hand(s) from gesture state", removed);
        }
    }

    /// Forget every identity
    pub fn reset(&mut self) {
        self.previous.clear();
        self.last_wrists.clear();
    }

    pub fn tracked(&self) -> usize {
        self.previous.len()
    }

    pub fn is_tracking(&self, identity: &HandIdentity) -> bool {
        self.previous.contains_key(identity)
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(IdentityStrategy::SlotIndex)
    }
}
