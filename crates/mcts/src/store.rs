//! Fingerprint-indexed store of [`PositionRecord`]s.
//!
//! The store is a fixed-size table of bucket heads indexed by the low bits
//! of the position fingerprint. Each bucket is a singly linked chain of
//! records threaded through an arena, so tree nodes hold small copyable
//! [`RecordId`] handles instead of pointers into shared state.
//!
//! Distinct fingerprints landing in the same bucket only cost chain length.
//! Two different positions sharing one fingerprint are indistinguishable to
//! the store; that risk comes with hashing and is accepted, not detected.
//!
//! Records are reclaimed generationally: the store keeps one generation
//! counter that advances once per real game move, every lookup stamps the
//! record with the current generation, and [`TranspositionStore::reclaim`]
//! evicts records left untouched for too long.

use tracing::trace;

use crate::record::PositionRecord;

/// Handle to a record inside the store's arena.
///
/// A handle stays valid until the record is reclaimed; reclamation only
/// runs between move decisions, never while a search tree holds handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(u32);

impl RecordId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Occupancy figures for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreStats {
    /// Live records.
    pub records: usize,
    /// Number of buckets (a power of two).
    pub buckets: usize,
    /// Length of the longest collision chain.
    pub longest_chain: usize,
}

/// Hash table with chaining from fingerprint to [`PositionRecord`].
///
/// Invariant: at most one record per distinct fingerprint.
#[derive(Debug)]
pub struct TranspositionStore {
    buckets: Vec<Option<RecordId>>,
    mask: u64,
    slots: Vec<Option<PositionRecord>>,
    free: Vec<RecordId>,
    len: usize,
    generation: u32,
}

impl TranspositionStore {
    /// Create a store with `2^bits` buckets.
    ///
    /// # Panics
    /// Panics if `bits` is not in `1..=30`.
    pub fn new(bits: u8) -> Self {
        assert!(
            (1..=30).contains(&bits),
            "BUG: store size 2^{bits} is outside 2^1..=2^30"
        );
        let buckets = 1usize << bits;
        Self {
            buckets: vec![None; buckets],
            mask: (buckets - 1) as u64,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            generation: 0,
        }
    }

    /// Find the record for `fingerprint`, optionally creating it.
    ///
    /// A found or created record is stamped with the current generation.
    /// Returns `None` only when the record is absent and `create` is false.
    pub fn resolve(&mut self, fingerprint: u64, create: bool) -> Option<RecordId> {
        let generation = self.generation;
        let bucket = self.bucket(fingerprint);
        let mut tail = None;
        let mut cursor = self.buckets[bucket];

        while let Some(id) = cursor {
            let record = self.get_mut(id);
            if record.fingerprint() == fingerprint {
                record.touch(generation);
                return Some(id);
            }
            tail = Some(id);
            cursor = record.next;
        }

        if !create {
            return None;
        }

        let id = self.allocate(PositionRecord::new(fingerprint, generation));
        match tail {
            Some(last) => self.get_mut(last).next = Some(id),
            None => self.buckets[bucket] = Some(id),
        }
        Some(id)
    }

    /// Find or create the record for `fingerprint`.
    pub fn entry(&mut self, fingerprint: u64) -> RecordId {
        self.resolve(fingerprint, true)
            .unwrap_or_else(|| unreachable!("resolve with create always yields a record"))
    }

    /// Look up a record without creating it or touching its generation.
    pub fn find(&self, fingerprint: u64) -> Option<&PositionRecord> {
        let mut cursor = self.buckets[self.bucket(fingerprint)];
        while let Some(id) = cursor {
            let record = self.get(id);
            if record.fingerprint() == fingerprint {
                return Some(record);
            }
            cursor = record.next;
        }
        None
    }

    pub fn contains(&self, fingerprint: u64) -> bool {
        self.find(fingerprint).is_some()
    }

    /// Get a record by handle.
    ///
    /// # Panics
    /// Panics if the handle refers to a reclaimed record.
    pub fn get(&self, id: RecordId) -> &PositionRecord {
        self.slots[id.index()]
            .as_ref()
            .expect("BUG: record handle outlived its record")
    }

    /// Get a mutable record by handle.
    ///
    /// # Panics
    /// Panics if the handle refers to a reclaimed record.
    pub fn get_mut(&mut self, id: RecordId) -> &mut PositionRecord {
        self.slots[id.index()]
            .as_mut()
            .expect("BUG: record handle outlived its record")
    }

    /// Evict records idle for at least `min_idle` generations, then start
    /// a new generation.
    ///
    /// Records touched in the current generation always survive. Runs in
    /// time linear in buckets plus live records and returns the number of
    /// records removed.
    pub fn reclaim(&mut self, min_idle: u32) -> usize {
        let current = self.generation;
        let mut removed = 0;

        for bucket in 0..self.buckets.len() {
            let mut previous: Option<RecordId> = None;
            let mut cursor = self.buckets[bucket];

            while let Some(id) = cursor {
                let record = self.get(id);
                let next = record.next;
                let last = record.generation();

                if last != current && current.wrapping_sub(last) >= min_idle {
                    match previous {
                        Some(prev) => self.get_mut(prev).next = next,
                        None => self.buckets[bucket] = next,
                    }
                    self.slots[id.index()] = None;
                    self.free.push(id);
                    removed += 1;
                } else {
                    previous = Some(id);
                }
                cursor = next;
            }
        }

        self.len -= removed;
        self.generation = self.generation.wrapping_add(1);
        trace!(
            removed,
            remaining = self.len,
            generation = self.generation,
            "reclaimed transposition store"
        );
        removed
    }

    /// Drop every record and restart the generation count.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|head| *head = None);
        self.slots.clear();
        self.free.clear();
        self.len = 0;
        self.generation = 0;
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The current generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn stats(&self) -> StoreStats {
        let longest_chain = self
            .buckets
            .iter()
            .map(|head| {
                let mut length = 0;
                let mut cursor = *head;
                while let Some(id) = cursor {
                    length += 1;
                    cursor = self.get(id).next;
                }
                length
            })
            .max()
            .unwrap_or(0);

        StoreStats {
            records: self.len,
            buckets: self.buckets.len(),
            longest_chain,
        }
    }

    fn bucket(&self, fingerprint: u64) -> usize {
        (fingerprint & self.mask) as usize
    }

    fn allocate(&mut self, record: PositionRecord) -> RecordId {
        self.len += 1;
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(record);
            return id;
        }
        let id = RecordId(
            u32::try_from(self.slots.len()).expect("BUG: transposition store exceeded u32 records"),
        );
        self.slots.push(Some(record));
        id
    }
}
