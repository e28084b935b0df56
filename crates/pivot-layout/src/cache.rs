//! Position cache keyed by stable node id.
//!
//! [`PositionCache`] is what makes the layout stable. The first time a layout
//! pass sees a path it computes a position and stores it here; every later
//! pass reuses the stored value untouched, no matter how the rest of the tree
//! has grown since.
//!
//! # Lifecycle
//!
//! The cache lives exactly as long as one generation request. It is owned by
//! the session, passed into [`LayoutEngine::layout`](crate::LayoutEngine::layout)
//! by `&mut`, and emptied with [`PositionCache::clear`] when a new request
//! starts. There is no eviction: a pivot tree only grows.
//!
//! # Newest node
//!
//! The cache also remembers which id was assigned a position most recently.
//! That single marker drives the transient "being written" cue on one node.

use pivot_core::NodeId;
use rustc_hash::FxHashMap;

use crate::model::Position;

/// Statistics about position cache usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionCacheStats {
    /// Number of positioned ids.
    pub entries: usize,
    /// Lookups answered from the cache since creation or last reset.
    pub hits: u64,
    /// Positions computed since creation or last reset.
    pub misses: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
pub struct PositionCache {
    positions: FxHashMap<NodeId, Position>,
    newest: Option<NodeId>,
    hits: u64,
    misses: u64,
}

impl PositionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached position for `id`, or compute, store, and mark it
    /// newest.
    ///
    /// `compute` runs at most once per id for the lifetime of the cache.
    pub fn get_or_assign<F>(&mut self, id: &NodeId, compute: F) -> Position
    where
        F: FnOnce() -> Position,
    {
        if let Some(position) = self.positions.get(id) {
            self.hits += 1;
            return *position;
        }

        self.misses += 1;
        let position = compute();
        self.positions.insert(id.clone(), position);
        self.newest = Some(id.clone());
        position
    }

    pub fn get(&self, id: &NodeId) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Id most recently assigned a new position.
    pub fn newest(&self) -> Option<&NodeId> {
        self.newest.as_ref()
    }

    /// Forget every position and the newest marker.
    ///
    /// Called exactly when a new generation request begins.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.newest = None;
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn stats(&self) -> PositionCacheStats {
        let total = self.hits + self.misses;
        PositionCacheStats {
            entries: self.positions.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(segments: &[usize]) -> NodeId {
        NodeId::from_segments(segments)
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = PositionCache::new();
        assert!(cache.is_empty());
        assert!(cache.newest().is_none());
        assert_eq!(cache.stats(), PositionCacheStats::default());
    }

    #[test]
    fn compute_runs_once_per_id() {
        let mut cache = PositionCache::new();
        let mut calls = 0;
        let first = cache.get_or_assign(&id(&[0]), || {
            calls += 1;
            Position::new(1.0, 2.0)
        });
        let second = cache.get_or_assign(&id(&[0]), || {
            calls += 1;
            Position::new(9.0, 9.0)
        });
        assert_eq!(calls, 1);
        assert_eq!(first, second);
        assert_eq!(cache.get(&id(&[0])), Some(Position::new(1.0, 2.0)));
    }

    #[test]
    fn newest_tracks_last_assignment_only() {
        let mut cache = PositionCache::new();
        cache.get_or_assign(&id(&[]), Position::default);
        cache.get_or_assign(&id(&[0]), Position::default);
        assert_eq!(cache.newest(), Some(&id(&[0])));

        // A hit does not move the marker.
        cache.get_or_assign(&id(&[]), Position::default);
        assert_eq!(cache.newest(), Some(&id(&[0])));
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let mut cache = PositionCache::new();
        cache.get_or_assign(&id(&[]), Position::default);
        cache.get_or_assign(&id(&[]), Position::default);
        cache.get_or_assign(&id(&[]), Position::default);
        cache.get_or_assign(&id(&[1]), Position::default);

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);

        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn clear_forgets_positions_and_newest() {
        let mut cache = PositionCache::new();
        cache.get_or_assign(&id(&[]), || Position::new(5.0, 0.0));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.newest().is_none());
        let position = cache.get_or_assign(&id(&[]), || Position::new(7.0, 0.0));
        assert_eq!(position, Position::new(7.0, 0.0));
    }
}
