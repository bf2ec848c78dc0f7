use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::EpisodeId;

/// Maps each point value of a fingerprint to the last index at which it occurs.
///
/// Repeated values (near-silence, for example) are poor alignment anchors, so only their
/// most recent position is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvertedIndex(HashMap<u32, usize>);

impl InvertedIndex {
    pub fn from_points(points: &[u32]) -> Self {
        let mut index = HashMap::with_capacity(points.len());
        for (i, point) in points.iter().enumerate() {
            index.insert(*point, i);
        }
        Self(index)
    }

    pub fn get(&self, point: u32) -> Option<usize> {
        self.0.get(&point).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(point, last index)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.0.iter().map(|(point, i)| (*point, *i))
    }
}

/// Thread-safe cache of inverted indexes, keyed by episode.
///
/// Entries are never invalidated automatically: callers evict a season's episodes once the
/// season is done. Episode ids are only unique within a season, so one cache must not be
/// shared by seasons analyzed at the same time.
#[derive(Debug, Default)]
pub struct IndexCache {
    indexes: Mutex<HashMap<EpisodeId, Arc<InvertedIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached index for `episode_id`, building it from `points` on a miss.
    pub fn get_or_build(&self, episode_id: &EpisodeId, points: &[u32]) -> Arc<InvertedIndex> {
        if let Some(index) = self.lock().get(episode_id) {
            tracing::trace!(%episode_id, "inverted index cache hit");
            return Arc::clone(index);
        }

        // Build outside of the lock; a racing insert for the same episode is equivalent.
        let index = Arc::new(InvertedIndex::from_points(points));
        self.lock()
            .entry(episode_id.clone())
            .or_insert_with(|| Arc::clone(&index))
            .clone()
    }

    pub fn evict(&self, episode_id: &EpisodeId) {
        self.lock().remove(episode_id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EpisodeId, Arc<InvertedIndex>>> {
        // The map is always left in a consistent state, so a poisoned lock is still usable.
        self.indexes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
