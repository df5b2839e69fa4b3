//! Counted object handles.
//!
//! Every [`ObjectPtr`] owns one reference count on its allocator entry:
//! cloning increments, dropping decrements, and the entry is freed the moment
//! the count reaches zero. Freed contents go to a graveyard that is drained
//! iteratively, so releasing a long chain of objects never recurses and never
//! re-borrows an entry that is already borrowed.
//!
//! Counting alone cannot free cycles; [`Heap::sweep`] frees entries that the
//! tracer did not reach whatever their count.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use log::{trace, warn};

use core_types::{Protection, Symbol};

use crate::allocator::{Allocator, ObjectId};
use crate::object::{Object, Slot};

pub(crate) struct HeapCore {
    slab: Allocator,
    graveyard: RefCell<Vec<Object>>,
    releasing: Cell<bool>,
}

impl HeapCore {
    fn retain(&self, id: ObjectId) {
        self.slab.with_entry(id, |e| {
            let count = e.ref_count();
            count.set(count.get().saturating_add(1));
        });
    }

    fn release(&self, id: ObjectId) {
        let dead = self
            .slab
            .with_entry(id, |e| {
                let count = e.ref_count();
                let n = count.get().saturating_sub(1);
                count.set(n);
                n == 0
            })
            .unwrap_or(false);
        if dead {
            self.bury(id);
        }
    }

    fn bury(&self, id: ObjectId) {
        if let Some(contents) = self.slab.free(id) {
            self.graveyard.borrow_mut().push(contents);
        }
        self.drain();
    }

    /// Drops buried contents until none are left. Re-entrant calls from the
    /// drops below only bury.
    fn drain(&self) {
        if self.releasing.replace(true) {
            return;
        }
        loop {
            let next = self.graveyard.borrow_mut().pop();
            match next {
                Some(contents) => drop(contents),
                None => break,
            }
        }
        self.releasing.set(false);
    }
}

/// The object heap: allocator plus counted handles.
///
/// Cloning a `Heap` shares the same storage.
#[derive(Clone)]
pub struct Heap {
    core: Rc<HeapCore>,
}

impl Heap {
    /// An empty heap.
    pub fn new() -> Self {
        Heap {
            core: Rc::new(HeapCore {
                slab: Allocator::new(),
                graveyard: RefCell::new(Vec::new()),
                releasing: Cell::new(false),
            }),
        }
    }

    /// Allocates an empty object with no parent.
    pub fn allocate(&self) -> ObjectPtr {
        let id = self.core.slab.allocate();
        self.core.slab.with_entry(id, |e| e.ref_count().set(1));
        ObjectPtr {
            id,
            heap: Rc::downgrade(&self.core),
        }
    }

    /// Allocates a new object whose `parent` is `proto` (delete-protected)
    /// and whose primitive is a copy of `proto`'s. Slots are not copied.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{Protection, Symbol};
    /// use memory_manager::{Heap, Prim};
    ///
    /// let heap = Heap::new();
    /// let base = heap.allocate();
    /// base.set_prim(Prim::Str("hi".to_string()));
    /// let child = heap.clone_object(&base);
    /// assert_eq!(child.get(Symbol::PARENT), Some(base.clone()));
    /// assert_eq!(child.prim(), Prim::Str("hi".to_string()));
    /// assert!(child.is_protected(Symbol::PARENT, Protection::DELETE));
    /// ```
    pub fn clone_object(&self, proto: &ObjectPtr) -> ObjectPtr {
        let obj = self.allocate();
        let prim = proto.prim();
        obj.with_mut(|o| {
            o.slots.insert(
                Symbol::PARENT,
                Slot {
                    value: Some(proto.clone()),
                    protection: Protection::DELETE,
                },
            );
            o.prim = prim;
        });
        obj
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.core.slab.live_count()
    }

    /// Ids of every live object.
    pub fn live_ids(&self) -> Vec<ObjectId> {
        self.core.slab.live_ids()
    }

    /// Returns `true` when `id` names a live object.
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.core.slab.is_live(id)
    }

    /// Current reference count of `id` (zero when stale).
    pub fn ref_count(&self, id: ObjectId) -> u32 {
        self.core
            .slab
            .with_entry(id, |e| e.ref_count().get())
            .unwrap_or(0)
    }

    /// Ids directly referenced by the object `id`: slot values plus anything
    /// its primitive reaches.
    pub fn edges(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.core.slab.with_entry(id, |e| e.object().edges(&mut out));
        out
    }

    /// Frees every live object whose id is not in `reached`, regardless of
    /// reference counts. Returns the number freed.
    pub fn sweep(&self, reached: &HashSet<ObjectId>) -> usize {
        let doomed: Vec<ObjectId> = self
            .live_ids()
            .into_iter()
            .filter(|id| !reached.contains(id))
            .collect();
        let was_releasing = self.core.releasing.replace(true);
        let mut freed = 0;
        for id in doomed {
            if let Some(contents) = self.core.slab.free(id) {
                self.core.graveyard.borrow_mut().push(contents);
                freed += 1;
            }
        }
        self.core.releasing.set(was_releasing);
        self.core.drain();
        trace!("sweep freed {} object(s)", freed);
        freed
    }

    /// Returns `true` when `ptr` was allocated by this heap.
    pub fn owns(&self, ptr: &ObjectPtr) -> bool {
        ptr.heap
            .upgrade()
            .map(|core| Rc::ptr_eq(&core, &self.core))
            .unwrap_or(false)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("allocator", &self.core.slab)
            .finish()
    }
}

/// A counted handle to a heap object.
pub struct ObjectPtr {
    id: ObjectId,
    heap: Weak<HeapCore>,
}

impl ObjectPtr {
    /// The allocator id behind this handle.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns `true` while the object has not been freed.
    pub fn is_live(&self) -> bool {
        self.heap
            .upgrade()
            .map(|core| core.slab.is_live(self.id))
            .unwrap_or(false)
    }

    /// Runs `f` on the object. A stale handle sees an empty object.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&Object) -> R) -> R {
        if let Some(core) = self.heap.upgrade() {
            if let Some(bucket) = core.slab.live_bucket(self.id) {
                if let Some(entry) = bucket.entry(self.id.slot()) {
                    return f(&entry.object());
                }
            }
        }
        warn!("access through stale object handle {}", self.id);
        f(&Object::default())
    }

    /// Runs `f` on the object mutably. Writes through a stale handle are lost.
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut Object) -> R) -> R {
        if let Some(core) = self.heap.upgrade() {
            if let Some(bucket) = core.slab.live_bucket(self.id) {
                if let Some(entry) = bucket.entry(self.id.slot()) {
                    return f(&mut entry.object_mut());
                }
            }
        }
        warn!("write through stale object handle {}", self.id);
        f(&mut Object::default())
    }
}

impl Clone for ObjectPtr {
    fn clone(&self) -> Self {
        if let Some(core) = self.heap.upgrade() {
            core.retain(self.id);
        }
        ObjectPtr {
            id: self.id,
            heap: self.heap.clone(),
        }
    }
}

impl Drop for ObjectPtr {
    fn drop(&mut self) {
        // A failed upgrade means the heap itself is being torn down.
        if let Some(core) = self.heap.upgrade() {
            core.release(self.id);
        }
    }
}

impl PartialEq for ObjectPtr {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.heap, &other.heap)
    }
}

impl Eq for ObjectPtr {}

impl Hash for ObjectPtr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ObjectPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectPtr({})", self.id)
    }
}
