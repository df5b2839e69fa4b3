//! Slab allocator for object storage.
//!
//! Storage is a growable list of fixed-capacity buckets. Entries are never
//! moved: a bucket is added when every existing bucket is full, and nothing
//! is ever compacted or returned to the system. Each entry carries a
//! generation counter that is bumped on free, so an [`ObjectId`] taken
//! before a free can be recognised as stale after the entry is reused.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::mem;
use std::rc::Rc;

use log::trace;

use crate::object::Object;

/// Number of entries per bucket.
pub const BUCKET_CAPACITY: usize = 100;

/// Generation-checked address of an allocator entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    bucket: u32,
    slot: u32,
    generation: u32,
}

impl ObjectId {
    /// Bucket number.
    pub fn bucket(self) -> u32 {
        self.bucket
    }

    /// Position inside the bucket.
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Generation of the entry when this id was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// A single integer naming the entry, for diagnostics.
    pub fn address(self) -> u64 {
        self.bucket as u64 * BUCKET_CAPACITY as u64 + self.slot as u64
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address(), self.generation)
    }
}

pub(crate) struct Entry {
    in_use: Cell<bool>,
    generation: Cell<u32>,
    ref_count: Cell<u32>,
    object: RefCell<Object>,
}

impl Entry {
    fn new() -> Self {
        Entry {
            in_use: Cell::new(false),
            generation: Cell::new(0),
            ref_count: Cell::new(0),
            object: RefCell::new(Object::default()),
        }
    }

    fn matches(&self, id: ObjectId) -> bool {
        self.in_use.get() && self.generation.get() == id.generation
    }

    pub(crate) fn ref_count(&self) -> &Cell<u32> {
        &self.ref_count
    }

    pub(crate) fn object(&self) -> Ref<'_, Object> {
        self.object.borrow()
    }

    pub(crate) fn object_mut(&self) -> RefMut<'_, Object> {
        self.object.borrow_mut()
    }
}

pub(crate) struct Bucket {
    entries: Box<[Entry]>,
    used: Cell<usize>,
    next: Cell<usize>,
}

impl Bucket {
    fn new() -> Self {
        Bucket {
            entries: (0..BUCKET_CAPACITY).map(|_| Entry::new()).collect(),
            used: Cell::new(0),
            next: Cell::new(0),
        }
    }

    fn is_full(&self) -> bool {
        self.used.get() >= BUCKET_CAPACITY
    }

    /// First free entry at or after the rotating cursor.
    fn claim(&self) -> Option<usize> {
        let start = self.next.get();
        (0..BUCKET_CAPACITY)
            .map(|i| (start + i) % BUCKET_CAPACITY)
            .find(|&i| !self.entries[i].in_use.get())
    }

    pub(crate) fn entry(&self, slot: u32) -> Option<&Entry> {
        self.entries.get(slot as usize)
    }
}

/// The bucket list.
#[derive(Default)]
pub struct Allocator {
    buckets: RefCell<Vec<Rc<Bucket>>>,
}

impl Allocator {
    /// An allocator with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a free entry, resetting its contents. The reference count of
    /// the new entry is zero; callers set it.
    pub fn allocate(&self) -> ObjectId {
        let found = {
            let buckets = self.buckets.borrow();
            buckets.iter().enumerate().find_map(|(b, bucket)| {
                if bucket.is_full() {
                    return None;
                }
                bucket.claim().map(|s| (b, Rc::clone(bucket), s))
            })
        };
        let (b, bucket, s) = match found {
            Some(found) => found,
            None => {
                let bucket = Rc::new(Bucket::new());
                let mut buckets = self.buckets.borrow_mut();
                buckets.push(Rc::clone(&bucket));
                trace!("allocator grew to {} bucket(s)", buckets.len());
                (buckets.len() - 1, bucket, 0)
            }
        };
        let entry = &bucket.entries[s];
        entry.in_use.set(true);
        entry.ref_count.set(0);
        // Contents were taken on free; reset anyway in case of a fresh bucket.
        *entry.object.borrow_mut() = Object::default();
        bucket.used.set(bucket.used.get() + 1);
        bucket.next.set((s + 1) % BUCKET_CAPACITY);
        ObjectId {
            bucket: b as u32,
            slot: s as u32,
            generation: entry.generation.get(),
        }
    }

    /// Releases the entry named by `id` and hands back its former contents.
    ///
    /// Stale ids return `None`. The contents are returned rather than dropped
    /// so the caller can drop them after every borrow has ended.
    pub fn free(&self, id: ObjectId) -> Option<Object> {
        let bucket = self.bucket(id)?;
        let entry = bucket.entry(id.slot)?;
        if !entry.matches(id) {
            return None;
        }
        entry.in_use.set(false);
        entry.generation.set(entry.generation.get().wrapping_add(1));
        entry.ref_count.set(0);
        bucket.used.set(bucket.used.get().saturating_sub(1));
        let contents = mem::take(&mut *entry.object.borrow_mut());
        Some(contents)
    }

    /// Returns `true` when `id` names a live entry.
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.bucket(id)
            .and_then(|b| b.entry(id.slot).map(|e| e.matches(id)))
            .unwrap_or(false)
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        self.buckets.borrow().iter().map(|b| b.used.get()).sum()
    }

    /// Ids of every live entry.
    pub fn live_ids(&self) -> Vec<ObjectId> {
        let buckets = self.buckets.borrow();
        let mut ids = Vec::with_capacity(self.live_count());
        for (b, bucket) in buckets.iter().enumerate() {
            for (s, entry) in bucket.entries.iter().enumerate() {
                if entry.in_use.get() {
                    ids.push(ObjectId {
                        bucket: b as u32,
                        slot: s as u32,
                        generation: entry.generation.get(),
                    });
                }
            }
        }
        ids
    }

    /// Number of buckets allocated so far.
    pub fn bucket_count(&self) -> usize {
        self.buckets.borrow().len()
    }

    /// Runs `f` on the live entry named by `id`.
    pub(crate) fn with_entry<R>(&self, id: ObjectId, f: impl FnOnce(&Entry) -> R) -> Option<R> {
        let bucket = self.bucket(id)?;
        let entry = bucket.entry(id.slot)?;
        if entry.matches(id) {
            Some(f(entry))
        } else {
            None
        }
    }

    /// The bucket holding `id`, when `id` is live.
    pub(crate) fn live_bucket(&self, id: ObjectId) -> Option<Rc<Bucket>> {
        self.bucket(id)
            .filter(|b| b.entry(id.slot).map(|e| e.matches(id)).unwrap_or(false))
    }

    fn bucket(&self, id: ObjectId) -> Option<Rc<Bucket>> {
        self.buckets.borrow().get(id.bucket as usize).cloned()
    }
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("buckets", &self.bucket_count())
            .field("live", &self.live_count())
            .finish()
    }
}
