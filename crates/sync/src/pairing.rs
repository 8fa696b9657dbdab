use crate::SyncError;
use physync_common::{BodyHandle, VisualHandle};
use std::collections::BTreeSet;

/// One body driving one visual object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedPair {
    pub body: BodyHandle,
    pub visual: VisualHandle,
}

impl TrackedPair {
    pub fn new(body: BodyHandle, visual: VisualHandle) -> Self {
        Self { body, visual }
    }
}

/// Ordered, fixed set of tracked pairs.
///
/// Membership is decided at construction. A visual may appear at most once;
/// a body may drive several visuals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingSet {
    pairs: Vec<TrackedPair>,
}

impl PairingSet {
    pub fn new(pairs: impl IntoIterator<Item = TrackedPair>) -> Result<Self, SyncError> {
        let pairs: Vec<TrackedPair> = pairs.into_iter().collect();
        let mut seen = BTreeSet::new();
        for pair in &pairs {
            if !seen.insert(pair.visual) {
                return Err(SyncError::DuplicateVisual(pair.visual));
            }
        }
        Ok(Self { pairs })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedPair> {
        self.pairs.iter()
    }

    pub fn body_for(&self, visual: VisualHandle) -> Option<BodyHandle> {
        self.pairs
            .iter()
            .find(|p| p.visual == visual)
            .map(|p| p.body)
    }
}

impl<'a> IntoIterator for &'a PairingSet {
    type Item = &'a TrackedPair;
    type IntoIter = std::slice::Iter<'a, TrackedPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
