//! Per-worker, per-run registry of track identities.
//!
//! Tracks three things for one worker's run:
//! - which tracks were already credited for reaching the exit face
//! - which tracks were terminated (no further steps may arrive for them)
//! - how many boundary interactions each track has had
//!
//! The registry is owned by exactly one worker context and cleared at the
//! start of every run. It is never shared.

use std::collections::{HashMap, HashSet};

use types::TrackId;

/// Track-identity side channel for classification.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    credited: HashSet<TrackId>,
    terminated: HashSet<TrackId>,
    surface_hits: HashMap<TrackId, u32>,
}

impl DedupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `track` for the exit face.
    ///
    /// Returns `true` and records the track the first time; `false` on every
    /// later call for the same track.
    #[inline]
    pub fn credit(&mut self, track: TrackId) -> bool {
        self.credited.insert(track)
    }

    /// Whether `track` has already been credited.
    #[inline]
    pub fn is_credited(&self, track: TrackId) -> bool {
        self.credited.contains(&track)
    }

    /// Record that termination of `track` was requested.
    ///
    /// Returns `false` if it was already terminated.
    #[inline]
    pub fn mark_terminated(&mut self, track: TrackId) -> bool {
        self.terminated.insert(track)
    }

    /// Whether termination of `track` was requested.
    #[inline]
    pub fn is_terminated(&self, track: TrackId) -> bool {
        self.terminated.contains(&track)
    }

    /// Count one boundary interaction for `track`, returning the new total.
    pub fn record_surface_hit(&mut self, track: TrackId) -> u32 {
        let hits = self.surface_hits.entry(track).or_insert(0);
        *hits = hits.saturating_add(1);
        *hits
    }

    /// Number of tracks credited so far.
    pub fn credited_count(&self) -> usize {
        self.credited.len()
    }

    /// Check if the registry holds no state at all.
    pub fn is_empty(&self) -> bool {
        self.credited.is_empty() && self.terminated.is_empty() && self.surface_hits.is_empty()
    }

    /// Forget everything. Called once at begin-of-run.
    pub fn clear(&mut self) {
        self.credited.clear();
        self.terminated.clear();
        self.surface_hits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_once() {
        let mut registry = DedupRegistry::new();
        assert!(registry.credit(TrackId(2)));
        assert!(!registry.credit(TrackId(2)));
        assert!(!registry.credit(TrackId(2)));
        assert!(registry.credit(TrackId(3)));
        assert_eq!(registry.credited_count(), 2);
    }

    #[test]
    fn test_termination_is_separate_from_credit() {
        let mut registry = DedupRegistry::new();
        assert!(registry.mark_terminated(TrackId(1)));
        assert!(!registry.mark_terminated(TrackId(1)));
        assert!(registry.is_terminated(TrackId(1)));
        assert!(!registry.is_credited(TrackId(1)));
    }

    #[test]
    fn test_surface_hits() {
        let mut registry = DedupRegistry::new();
        assert_eq!(registry.record_surface_hit(TrackId(4)), 1);
        assert_eq!(registry.record_surface_hit(TrackId(4)), 2);
        assert_eq!(registry.record_surface_hit(TrackId(5)), 1);
    }

    #[test]
    fn test_clear() {
        let mut registry = DedupRegistry::new();
        registry.credit(TrackId(1));
        registry.mark_terminated(TrackId(2));
        registry.record_surface_hit(TrackId(3));
        assert!(!registry.is_empty());

        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.credit(TrackId(1)));
    }
}
