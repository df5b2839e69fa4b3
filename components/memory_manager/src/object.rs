//! Prototype objects
//!
//! An object is a map from symbols to slots plus one primitive value.
//! Inheritance is the `parent` slot; parent chains may cycle, so every walk
//! over them keeps a visited set.

use std::collections::{BTreeSet, HashMap, HashSet};

use core_types::{Protection, ProtectionError, Symbol};

use crate::allocator::ObjectId;
use crate::heap::ObjectPtr;
use crate::prim::Prim;

/// A slot: an optional value and its protection bits.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    /// The stored object, if any
    pub value: Option<ObjectPtr>,
    /// Protection bits
    pub protection: Protection,
}

/// The contents of one heap entry.
#[derive(Debug, Default)]
pub struct Object {
    pub(crate) slots: HashMap<Symbol, Slot>,
    pub(crate) prim: Prim,
}

impl Object {
    /// Appends the ids this object references to `out`.
    pub(crate) fn edges(&self, out: &mut Vec<ObjectId>) {
        for slot in self.slots.values() {
            if let Some(value) = &slot.value {
                out.push(value.id());
            }
        }
        self.prim.visit(&mut |p| out.push(p.id()));
    }
}

impl ObjectPtr {
    /// Direct slot read.
    pub fn get(&self, sym: Symbol) -> Option<ObjectPtr> {
        self.with(|o| o.slots.get(&sym).and_then(|s| s.value.clone()))
    }

    /// Direct slot write. Replacing a value keeps the slot's protection.
    ///
    /// Fails when the slot is assign-protected.
    pub fn put(&self, sym: Symbol, value: ObjectPtr) -> Result<(), ProtectionError> {
        if self.is_protected(sym, Protection::ASSIGN) {
            return Err(ProtectionError::Assign(sym));
        }
        let old = self.with_mut(|o| o.slots.entry(sym).or_default().value.replace(value));
        drop(old);
        Ok(())
    }

    /// Removes a direct slot. Removing a missing slot does nothing.
    ///
    /// Fails when the slot is delete-protected.
    pub fn remove(&self, sym: Symbol) -> Result<(), ProtectionError> {
        if self.is_protected(sym, Protection::DELETE) {
            return Err(ProtectionError::Delete(sym));
        }
        let old = self.with_mut(|o| o.slots.remove(&sym));
        drop(old);
        Ok(())
    }

    /// The object's own keys, sorted.
    pub fn direct_keys(&self) -> Vec<Symbol> {
        let mut keys: Vec<Symbol> = self.with(|o| o.slots.keys().copied().collect());
        keys.sort();
        keys
    }

    /// Returns `true` when the direct slot `sym` carries every bit of `mask`.
    pub fn is_protected(&self, sym: Symbol, mask: Protection) -> bool {
        self.with(|o| {
            o.slots
                .get(&sym)
                .map(|s| s.protection.is_protected(mask))
                .unwrap_or(false)
        })
    }

    /// Returns `true` when the direct slot `sym` carries any protection.
    pub fn has_any_protection(&self, sym: Symbol) -> bool {
        self.with(|o| {
            o.slots
                .get(&sym)
                .map(|s| !s.protection.is_empty())
                .unwrap_or(false)
        })
    }

    /// Adds protection bits to an existing direct slot. Returns `false` when
    /// the slot does not exist.
    pub fn add_protection(&self, sym: Symbol, mask: Protection) -> bool {
        self.with_mut(|o| match o.slots.get_mut(&sym) {
            Some(slot) => {
                slot.protection |= mask;
                true
            }
            None => false,
        })
    }

    /// Writes a slot and protects it in one step, bypassing existing
    /// protection. Used when building bootstrap objects.
    pub fn put_protected(&self, sym: Symbol, value: ObjectPtr, mask: Protection) {
        let old = self.with_mut(|o| {
            let slot = o.slots.entry(sym).or_default();
            slot.protection |= mask;
            slot.value.replace(value)
        });
        drop(old);
    }

    /// A copy of the primitive value.
    pub fn prim(&self) -> Prim {
        self.with(|o| o.prim.clone())
    }

    /// Replaces the primitive value.
    pub fn set_prim(&self, prim: Prim) {
        let old = self.with_mut(|o| std::mem::replace(&mut o.prim, prim));
        drop(old);
    }

    /// Returns `true` when this object has a direct slot `sym` holding a value.
    pub fn has_direct(&self, sym: Symbol) -> bool {
        self.with(|o| o.slots.get(&sym).map(|s| s.value.is_some()).unwrap_or(false))
    }

    /// Replaces every slot and the primitive with copies of `other`'s,
    /// protection bits included.
    pub fn copy_from(&self, other: &ObjectPtr) {
        if self == other {
            return;
        }
        let (slots, prim) = other.with(|o| (o.slots.clone(), o.prim.clone()));
        let old = self.with_mut(|o| {
            (
                std::mem::replace(&mut o.slots, slots),
                std::mem::replace(&mut o.prim, prim),
            )
        });
        drop(old);
    }
}

/// `obj` followed by its ancestors through `parent`, each visited once.
pub fn hierarchy(obj: &ObjectPtr) -> Vec<ObjectPtr> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut curr = Some(obj.clone());
    while let Some(o) = curr {
        if !seen.insert(o.id()) {
            break;
        }
        curr = o.get(Symbol::PARENT);
        out.push(o);
    }
    out
}

/// The first object in `obj`'s hierarchy that holds `sym` directly.
pub fn origin(obj: &ObjectPtr, sym: Symbol) -> Option<ObjectPtr> {
    hierarchy(obj).into_iter().find(|o| o.has_direct(sym))
}

/// Inherited slot read.
///
/// # Examples
///
/// ```
/// use core_types::SymbolTable;
/// use memory_manager::{lookup, Heap};
///
/// let heap = Heap::new();
/// let mut symbols = SymbolTable::new();
/// let x = symbols.intern("x");
///
/// let base = heap.allocate();
/// let value = heap.allocate();
/// base.put(x, value.clone()).unwrap();
/// let child = heap.clone_object(&base);
///
/// assert_eq!(lookup(&child, x), Some(value));
/// ```
pub fn lookup(obj: &ObjectPtr, sym: Symbol) -> Option<ObjectPtr> {
    origin(obj, sym).and_then(|o| o.get(sym))
}

/// Every key visible on `obj`, inherited ones included.
pub fn keys(obj: &ObjectPtr) -> BTreeSet<Symbol> {
    hierarchy(obj)
        .iter()
        .flat_map(|o| o.direct_keys())
        .collect()
}
