use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

use rollcall_identity::IdentityId;

use crate::cosine::{cosine_distance, l2_normalize};
use crate::error::GalleryError;

/// Hit is a single result from a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Identity that owns the matched template.
    pub identity_id: IdentityId,

    /// Cosine distance between the query and the template, in `[0, 2]`.
    /// Lower values indicate higher similarity.
    pub distance: f32,
}

impl Hit {
    /// Cosine similarity recovered from the distance, in `[-1, 1]`.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub(crate) identity_id: IdentityId,
    pub(crate) vector: Vec<f32>,
}

/// An immutable point-in-time view of the index.
///
/// A snapshot stays searchable while the owning [`Gallery`] mutates
/// underneath it, so a caller can hold one across a batch of queries
/// and see a consistent result set.
#[derive(Debug)]
pub struct GallerySnapshot {
    pub(crate) dim: usize,
    pub(crate) entries: Vec<Entry>,
}

/// Quantize a distance so float jitter below 1e-6 cannot reorder hits
/// that are equal for practical purposes.
fn distance_key(d: f32) -> i64 {
    (d as f64 / 1e-6).round() as i64
}

impl GallerySnapshot {
    pub(crate) fn empty(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub(crate) fn from_entries(dim: usize, entries: Vec<Entry>) -> Self {
        Self { dim, entries }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of templates in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct identities with at least one template, ascending.
    pub fn identity_ids(&self) -> Vec<IdentityId> {
        let ids: BTreeSet<IdentityId> = self.entries.iter().map(|e| e.identity_id).collect();
        ids.into_iter().collect()
    }

    pub fn identity_count(&self) -> usize {
        self.identity_ids().len()
    }

    /// Return the top-k nearest templates to the query, ordered by
    /// ascending distance (closest first).
    ///
    /// Equal distances are broken by identity ID, so repeated searches
    /// over the same snapshot return the same order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Hit>, GalleryError> {
        if query.len() != self.dim {
            return Err(GalleryError::DimensionMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        if query.iter().all(|&x| x == 0.0) {
            return Err(GalleryError::ZeroVector);
        }
        if self.entries.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }

        let mut results: Vec<(f32, IdentityId)> = self
            .entries
            .iter()
            .map(|e| (cosine_distance(query, &e.vector), e.identity_id))
            .collect();

        results.sort_by_key(|&(d, id)| (distance_key(d), id));

        if results.len() > top_k {
            results.truncate(top_k);
        }

        Ok(results
            .into_iter()
            .map(|(distance, identity_id)| Hit {
                identity_id,
                distance,
            })
            .collect())
    }
}

/// Gallery is a concurrent index of face templates using brute-force
/// cosine distance. Exact by construction, sized for galleries in the
/// thousands of templates.
///
/// Readers clone the current snapshot `Arc` and search without blocking.
/// Writers serialize on an internal mutex, build a successor snapshot
/// and publish it with a brief write lock.
pub struct Gallery {
    dim: usize,
    current: RwLock<Arc<GallerySnapshot>>,
    writer: Mutex<()>,
}

impl Gallery {
    /// Create an empty gallery for `dim`-dimensional templates.
    ///
    /// Panics if `dim` is zero.
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "gallery: dim must be positive");
        Self {
            dim,
            current: RwLock::new(Arc::new(GallerySnapshot::empty(dim))),
            writer: Mutex::new(()),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Current snapshot. Cheap to take; the `Arc` keeps it alive across
    /// later mutations.
    pub fn snapshot(&self) -> Result<Arc<GallerySnapshot>, GalleryError> {
        Ok(self
            .current
            .read()
            .map_err(|_| GalleryError::Unavailable)?
            .clone())
    }

    /// Search the current snapshot. See [`GallerySnapshot::search`].
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Hit>, GalleryError> {
        self.snapshot()?.search(query, top_k)
    }

    /// Add one template for an identity.
    ///
    /// The vector is L2-normalized before storage. Returns false when the
    /// identity already holds an identical template (the call is a no-op).
    pub fn insert(&self, identity_id: IdentityId, vector: &[f32]) -> Result<bool, GalleryError> {
        let vector = self.prepare(vector)?;
        let _writer = self.writer.lock().map_err(|_| GalleryError::Unavailable)?;
        let snap = self.snapshot()?;
        if snap
            .entries
            .iter()
            .any(|e| e.identity_id == identity_id && e.vector == vector)
        {
            return Ok(false);
        }
        let mut entries = snap.entries.clone();
        entries.push(Entry {
            identity_id,
            vector,
        });
        self.publish(GallerySnapshot::from_entries(self.dim, entries))?;
        Ok(true)
    }

    /// Replace every template held for an identity with `vectors`.
    ///
    /// Returns the number of templates the identity holds afterwards.
    /// Replaying the same call leaves the index unchanged, so retried
    /// approvals cannot accumulate duplicates.
    pub fn upsert(
        &self,
        identity_id: IdentityId,
        vectors: &[Vec<f32>],
    ) -> Result<usize, GalleryError> {
        let mut prepared = Vec::with_capacity(vectors.len());
        for v in vectors {
            prepared.push(self.prepare(v)?);
        }
        let _writer = self.writer.lock().map_err(|_| GalleryError::Unavailable)?;
        let snap = self.snapshot()?;
        let mut entries: Vec<Entry> = snap
            .entries
            .iter()
            .filter(|e| e.identity_id != identity_id)
            .cloned()
            .collect();
        let count = prepared.len();
        entries.extend(prepared.into_iter().map(|vector| Entry {
            identity_id,
            vector,
        }));
        self.publish(GallerySnapshot::from_entries(self.dim, entries))?;
        Ok(count)
    }

    /// Drop every template held for an identity.
    /// Returns the number removed; zero when the identity holds none.
    pub fn remove(&self, identity_id: IdentityId) -> Result<usize, GalleryError> {
        let _writer = self.writer.lock().map_err(|_| GalleryError::Unavailable)?;
        let snap = self.snapshot()?;
        let entries: Vec<Entry> = snap
            .entries
            .iter()
            .filter(|e| e.identity_id != identity_id)
            .cloned()
            .collect();
        let removed = snap.entries.len() - entries.len();
        if removed > 0 {
            self.publish(GallerySnapshot::from_entries(self.dim, entries))?;
        }
        Ok(removed)
    }

    /// Rebuild the index wholesale from `(identity, templates)` pairs,
    /// discarding the current contents. Returns the new template count.
    pub fn rebuild_from<I>(&self, items: I) -> Result<usize, GalleryError>
    where
        I: IntoIterator<Item = (IdentityId, Vec<Vec<f32>>)>,
    {
        let mut entries = Vec::new();
        for (identity_id, vectors) in items {
            for v in vectors {
                entries.push(Entry {
                    identity_id,
                    vector: self.prepare(&v)?,
                });
            }
        }
        let count = entries.len();
        let _writer = self.writer.lock().map_err(|_| GalleryError::Unavailable)?;
        self.publish(GallerySnapshot::from_entries(self.dim, entries))?;
        Ok(count)
    }

    /// Swap in a previously built snapshot, such as one restored by
    /// [`crate::io::load`]. Fails on dimension mismatch.
    pub fn install(&self, snapshot: GallerySnapshot) -> Result<(), GalleryError> {
        if snapshot.dim != self.dim {
            return Err(GalleryError::DimensionMismatch {
                got: snapshot.dim,
                want: self.dim,
            });
        }
        let _writer = self.writer.lock().map_err(|_| GalleryError::Unavailable)?;
        self.publish(snapshot)
    }

    fn prepare(&self, vector: &[f32]) -> Result<Vec<f32>, GalleryError> {
        if vector.len() != self.dim {
            return Err(GalleryError::DimensionMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        let mut v = vector.to_vec();
        if !l2_normalize(&mut v) {
            return Err(GalleryError::ZeroVector);
        }
        Ok(v)
    }

    fn publish(&self, snapshot: GallerySnapshot) -> Result<(), GalleryError> {
        let mut current = self.current.write().map_err(|_| GalleryError::Unavailable)?;
        *current = Arc::new(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> IdentityId {
        IdentityId::from_u128(n)
    }

    #[test]
    fn test_insert_and_search() {
        let g = Gallery::new(4);
        g.insert(id(1), &[1.0, 0.0, 0.0, 0.0]).unwrap();
        g.insert(id(2), &[0.0, 1.0, 0.0, 0.0]).unwrap();
        g.insert(id(3), &[0.9, 0.1, 0.0, 0.0]).unwrap();

        let hits = g.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].identity_id, id(1));
        assert_eq!(hits[1].identity_id, id(3));
        assert!(hits[0].distance < hits[1].distance);
        assert!(hits[0].similarity() > 0.999);
    }

    #[test]
    fn test_search_empty() {
        let g = Gallery::new(3);
        assert!(g.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_zero_topk() {
        let g = Gallery::new(2);
        g.insert(id(1), &[1.0, 0.0]).unwrap();
        assert!(g.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_checks() {
        let g = Gallery::new(3);
        assert!(matches!(
            g.insert(id(1), &[1.0, 0.0]),
            Err(GalleryError::DimensionMismatch { got: 2, want: 3 })
        ));
        assert!(matches!(
            g.search(&[1.0, 0.0, 0.0, 0.0], 1),
            Err(GalleryError::DimensionMismatch { got: 4, want: 3 })
        ));
    }

    #[test]
    fn test_zero_vector_rejected() {
        let g = Gallery::new(2);
        assert!(matches!(
            g.insert(id(1), &[0.0, 0.0]),
            Err(GalleryError::ZeroVector)
        ));
        g.insert(id(1), &[1.0, 0.0]).unwrap();
        assert!(matches!(
            g.search(&[0.0, 0.0], 1),
            Err(GalleryError::ZeroVector)
        ));
    }

    #[test]
    fn test_insert_skips_exact_duplicate() {
        let g = Gallery::new(2);
        assert!(g.insert(id(1), &[1.0, 0.0]).unwrap());
        assert!(!g.insert(id(1), &[1.0, 0.0]).unwrap());
        // Same direction, different scale normalizes to the same template.
        assert!(!g.insert(id(1), &[2.0, 0.0]).unwrap());
        // Same template under a different identity is a distinct entry.
        assert!(g.insert(id(2), &[1.0, 0.0]).unwrap());
        assert_eq!(g.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_replaces_and_replays() {
        let g = Gallery::new(2);
        g.insert(id(1), &[1.0, 0.0]).unwrap();
        g.insert(id(1), &[0.0, 1.0]).unwrap();
        g.insert(id(2), &[1.0, 1.0]).unwrap();

        let n = g
            .upsert(id(1), &[vec![0.5, 0.5], vec![0.7, 0.3], vec![0.3, 0.7]])
            .unwrap();
        assert_eq!(n, 3);
        let snap = g.snapshot().unwrap();
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.identity_count(), 2);

        // Replay changes nothing.
        g.upsert(id(1), &[vec![0.5, 0.5], vec![0.7, 0.3], vec![0.3, 0.7]])
            .unwrap();
        assert_eq!(g.snapshot().unwrap().len(), 4);
    }

    #[test]
    fn test_remove() {
        let g = Gallery::new(2);
        g.insert(id(1), &[1.0, 0.0]).unwrap();
        g.insert(id(1), &[0.0, 1.0]).unwrap();
        g.insert(id(2), &[1.0, 1.0]).unwrap();

        assert_eq!(g.remove(id(1)).unwrap(), 2);
        assert_eq!(g.remove(id(1)).unwrap(), 0);
        let snap = g.snapshot().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.identity_ids(), vec![id(2)]);
    }

    #[test]
    fn test_rebuild_from() {
        let g = Gallery::new(2);
        g.insert(id(1), &[1.0, 0.0]).unwrap();

        let n = g
            .rebuild_from(vec![
                (id(2), vec![vec![0.0, 1.0]]),
                (id(3), vec![vec![1.0, 1.0], vec![1.0, 0.5]]),
            ])
            .unwrap();
        assert_eq!(n, 3);
        let snap = g.snapshot().unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.identity_ids(), vec![id(2), id(3)]);
    }

    #[test]
    fn test_snapshot_isolation() {
        let g = Gallery::new(2);
        g.insert(id(1), &[1.0, 0.0]).unwrap();

        let before = g.snapshot().unwrap();
        g.insert(id(2), &[0.0, 1.0]).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(g.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn test_equal_distance_orders_by_identity() {
        let g = Gallery::new(2);
        // Insert in descending identity order; hits must come back ascending.
        g.insert(id(9), &[1.0, 0.0]).unwrap();
        g.insert(id(4), &[1.0, 0.0]).unwrap();
        g.insert(id(7), &[1.0, 0.0]).unwrap();

        let hits = g.search(&[1.0, 0.0], 3).unwrap();
        let got: Vec<IdentityId> = hits.iter().map(|h| h.identity_id).collect();
        assert_eq!(got, vec![id(4), id(7), id(9)]);
    }

    #[test]
    fn test_install_checks_dimension() {
        let g = Gallery::new(3);
        let foreign = GallerySnapshot::empty(4);
        assert!(matches!(
            g.install(foreign),
            Err(GalleryError::DimensionMismatch { got: 4, want: 3 })
        ));
    }

    #[test]
    fn test_concurrent_inserts_and_searches() {
        let g = Gallery::new(4);
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..50u128 {
                    g.insert(id(i), &[1.0, i as f32, 0.0, 0.0]).unwrap();
                }
            });
            s.spawn(|| {
                for i in 50..100u128 {
                    g.insert(id(i), &[0.0, 0.0, 1.0, i as f32]).unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..100 {
                    let hits = g.search(&[1.0, 1.0, 1.0, 1.0], 5).unwrap();
                    assert!(hits.len() <= 5);
                }
            });
        });
        assert_eq!(g.snapshot().unwrap().len(), 100);
    }
}
