//! ObjectStore (C2): typed, dense, aligned repository of raw vectors.
//!
//! Grounded in the teacher's `VectorGuard`/`BorrowedVector` zero-copy
//! pattern (`src/vector_ref.rs`): `get` hands back a view tied to the
//! store's read lock rather than an owned copy, so a search touching
//! thousands of candidates allocates nothing.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::metric::{self, Metric};
use crate::object_id::{FreeList, ObjectId, TOMBSTONE};
use crate::scalar::{self, ScalarKind};
use crate::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Slot {
    Tombstone,
    Live(Vec<f32>),
}

/// Owns the raw vector bytes for every object ever allocated, live or
/// tombstoned, for one index.
///
/// Reads take a shared lock; every mutation (`insert`/`remove`) takes the
/// exclusive lock for its whole duration, matching §5's "writes take a
/// single exclusive lock spanning the whole mutation" rule.
pub struct ObjectStore {
    kind: ScalarKind,
    dim: usize,
    metric: Metric,
    slots: RwLock<Vec<Slot>>,
    free: RwLock<FreeList>,
}

/// A read-only borrow of one object's vector, valid as long as the
/// enclosing store is not mutated.
///
/// Callers needing to hold the view across other calls should clone it;
/// this mirrors the teacher's `BorrowedVector` rather than returning a
/// lock guard directly, since `parking_lot::RwLockReadGuard` cannot be
/// returned from behind `get`'s internal lock without holding the whole
/// store locked for the view's lifetime.
#[derive(Debug, Clone)]
pub struct VectorView(Vec<f32>);

impl VectorView {
    /// Borrows the vector's components.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl ObjectStore {
    /// Fixes scalar kind, logical dimension, and metric; computes the
    /// padded width every stored vector will occupy.
    #[must_use]
    pub fn allocate(kind: ScalarKind, dim: usize, metric: Metric) -> Self {
        Self {
            kind,
            dim,
            metric,
            slots: RwLock::new(Vec::new()),
            free: RwLock::new(FreeList::new()),
        }
    }

    /// Declared logical dimension (unpadded).
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Scalar kind fixed at creation.
    #[must_use]
    pub const fn scalar_kind(&self) -> ScalarKind {
        self.kind
    }

    /// Metric fixed at creation; governs on-insert normalisation.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Copies `vec`, normalising it if [`Metric::implies_normalisation`],
    /// and returns the id it was stored under. Ids are reused from the
    /// free list, smallest first; id `0` is never returned.
    ///
    /// # Errors
    /// [`Error::DimensionMismatch`] if `vec.len() != self.dim()`;
    /// [`Error::InvalidVector`] if normalisation fails its domain check.
    pub fn insert(&self, vec: &[f32]) -> Result<ObjectId> {
        if vec.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vec.len(),
            });
        }
        let mut values = metric::pad_to_lane_width(vec.to_vec());
        // normalise only the logical prefix; padding stays zero
        {
            let logical = &mut values[..self.dim];
            metric::prepare_for_insert(self.metric, logical)?;
        }

        let mut free = self.free.write();
        let id = free.allocate();
        let idx = id as usize;
        let mut slots = self.slots.write();
        if idx >= slots.len() {
            slots.resize(idx + 1, Slot::Tombstone);
        }
        slots[idx] = Slot::Live(values);
        Ok(id)
    }

    /// Borrows object `id`'s stored (possibly normalised, always padded)
    /// vector.
    ///
    /// # Errors
    /// [`Error::NotFound`] if `id` is out of range, tombstoned, or `0`.
    pub fn get(&self, id: ObjectId) -> Result<VectorView> {
        if id == TOMBSTONE {
            return Err(Error::NotFound(id));
        }
        let slots = self.slots.read();
        match slots.get(id as usize) {
            Some(Slot::Live(v)) => Ok(VectorView(v.clone())),
            _ => Err(Error::NotFound(id)),
        }
    }

    /// Marks `id` tombstoned and returns it to the free list. Idempotent
    /// on an already-tombstoned id is an error, matching O2's "after
    /// remove, get fails".
    ///
    /// # Errors
    /// [`Error::NotFound`] if `id` is not currently live.
    pub fn remove(&self, id: ObjectId) -> Result<()> {
        if id == TOMBSTONE {
            return Err(Error::NotFound(id));
        }
        let mut slots = self.slots.write();
        match slots.get_mut(id as usize) {
            Some(slot @ Slot::Live(_)) => {
                *slot = Slot::Tombstone;
            }
            _ => return Err(Error::NotFound(id)),
        }
        drop(slots);
        self.free.write().release(id);
        Ok(())
    }

    /// Total slots ever allocated, including tombstoned ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// True if no object has ever been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of currently-live (non-tombstoned) objects.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots
            .read()
            .iter()
            .filter(|s| matches!(s, Slot::Live(_)))
            .count()
    }

    /// Iterates over every currently-live `(id, vector)` pair, in id order.
    pub fn iter_live(&self) -> Vec<(ObjectId, Vec<f32>)> {
        self.slots
            .read()
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                Slot::Live(v) => Some((idx as ObjectId, v.clone())),
                Slot::Tombstone => None,
            })
            .collect()
    }

    /// Persists a length-prefixed sequence of slots: `-` for a tombstone,
    /// `+` followed by raw encoded bytes for a live slot (§4.2).
    ///
    /// # Errors
    /// [`Error::Io`] on a write failure.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        let slots = self.slots.read();
        writer.write_all(&(slots.len() as u32).to_le_bytes())?;
        for slot in slots.iter() {
            match slot {
                Slot::Tombstone => writer.write_all(b"-")?,
                Slot::Live(values) => {
                    writer.write_all(b"+")?;
                    let bytes = scalar::from_f32_vec(self.kind, values);
                    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
                    writer.write_all(&bytes)?;
                }
            }
        }
        Ok(())
    }

    /// Reopens a store previously written by [`Self::save`].
    ///
    /// # Errors
    /// [`Error::Corrupt`] if the tag byte or length prefixes don't parse;
    /// [`Error::Io`] on a read failure.
    pub fn open<R: Read>(kind: ScalarKind, dim: usize, metric: Metric, mut reader: R) -> Result<Self> {
        let mut count_buf = [0u8; 4];
        reader.read_exact(&mut count_buf)?;
        let count = u32::from_le_bytes(count_buf) as usize;

        let mut slots = Vec::with_capacity(count);
        let mut tag = [0u8; 1];
        for _ in 0..count {
            reader.read_exact(&mut tag)?;
            match &tag {
                b"-" => slots.push(Slot::Tombstone),
                b"+" => {
                    let mut len_buf = [0u8; 4];
                    reader.read_exact(&mut len_buf)?;
                    let len = u32::from_le_bytes(len_buf) as usize;
                    let mut bytes = vec![0u8; len];
                    reader.read_exact(&mut bytes)?;
                    slots.push(Slot::Live(scalar::to_f32_vec(kind, &bytes)));
                }
                other => {
                    return Err(Error::Corrupt(format!(
                        "unexpected object-store tag byte {other:?}"
                    )))
                }
            }
        }

        // Rebuild the free list: every slot index gets minted in order via
        // `allocate()`, then tombstoned ones (other than the reserved slot
        // 0) are handed back, so future inserts reuse them smallest-first
        // exactly as if they had been removed in index order originally.
        let mut free = FreeList::new();
        for _ in 1..count {
            free.allocate();
        }
        for (idx, slot) in slots.iter().enumerate() {
            if idx != 0 && matches!(slot, Slot::Tombstone) {
                free.release(idx as ObjectId);
            }
        }

        Ok(Self {
            kind,
            dim,
            metric,
            slots: RwLock::new(slots),
            free: RwLock::new(free),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dim: usize, metric: Metric) -> ObjectStore {
        ObjectStore::allocate(ScalarKind::F32, dim, metric)
    }

    #[test]
    fn insert_then_get_is_byte_identical_before_padding() {
        let s = store(4, Metric::L2);
        let id = s.insert(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let view = s.get(id).unwrap();
        assert_eq!(&view.as_slice()[..4], &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn ids_start_at_one_and_skip_tombstone() {
        let s = store(2, Metric::L2);
        let id = s.insert(&[0.0, 0.0]).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn remove_then_get_fails_and_id_is_reused() {
        let s = store(2, Metric::L2);
        let id = s.insert(&[1.0, 1.0]).unwrap();
        s.remove(id).unwrap();
        assert!(s.get(id).is_err());
        let reused = s.insert(&[2.0, 2.0]).unwrap();
        assert_eq!(reused, id);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let s = store(4, Metric::L2);
        assert!(matches!(
            s.insert(&[1.0, 2.0]),
            Err(Error::DimensionMismatch { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn normalized_metric_rejects_zero_vector() {
        let s = store(4, Metric::NormalizedL2);
        assert!(matches!(s.insert(&[0.0; 4]), Err(Error::InvalidVector(_))));
    }

    #[test]
    fn save_and_open_round_trips_live_and_tombstoned_slots() {
        let s = store(2, Metric::L2);
        let a = s.insert(&[1.0, 2.0]).unwrap();
        let _b = s.insert(&[3.0, 4.0]).unwrap();
        s.remove(a).unwrap();
        let mut buf = Vec::new();
        s.save(&mut buf).unwrap();

        let reopened = ObjectStore::open(ScalarKind::F32, 2, Metric::L2, &buf[..]).unwrap();
        assert_eq!(reopened.len(), s.len());
        assert!(reopened.get(a).is_err());
        assert_eq!(reopened.live_count(), s.live_count());
    }

    #[test]
    fn live_count_excludes_tombstones() {
        let s = store(2, Metric::L2);
        let a = s.insert(&[1.0, 1.0]).unwrap();
        let _b = s.insert(&[2.0, 2.0]).unwrap();
        s.remove(a).unwrap();
        assert_eq!(s.live_count(), 1);
        assert_eq!(s.len(), 2);
    }
}
