//! Tests for counted handles interacting with the tracer

use std::collections::HashSet;

use core_types::{Symbol, SymbolTable};
use memory_manager::{collect, trace, Heap, BUCKET_CAPACITY};

#[test]
fn test_slot_overwrite_releases_old_value() {
    let heap = Heap::new();
    let mut symbols = SymbolTable::new();
    let x = symbols.intern("x");
    let holder = heap.allocate();
    holder.put(x, heap.allocate()).unwrap();
    assert_eq!(heap.live_count(), 2);
    holder.put(x, heap.allocate()).unwrap();
    assert_eq!(heap.live_count(), 2);
    holder.remove(x).unwrap();
    assert_eq!(heap.live_count(), 1);
}

#[test]
fn test_prim_replacement_keeps_object() {
    let heap = Heap::new();
    let o = heap.allocate();
    o.set_prim(memory_manager::Prim::Symbol(Symbol::SELF));
    o.set_prim(memory_manager::Prim::Nil);
    assert!(o.is_live());
}

#[test]
fn test_survivors_keep_counts_after_sweep() {
    let heap = Heap::new();
    let root = heap.allocate();
    let shared = heap.allocate();
    root.put(Symbol::SELF, shared.clone()).unwrap();
    {
        // garbage cycle that also points at `shared`
        let a = heap.allocate();
        let b = heap.clone_object(&a);
        a.put(Symbol::PARENT, b.clone()).unwrap();
        a.put(Symbol::SELF, shared.clone()).unwrap();
    }
    let before = heap.ref_count(shared.id());
    assert_eq!(collect(&heap, [&root]), 2);
    assert_eq!(heap.ref_count(shared.id()), before - 1);
    drop(shared);
    assert!(root.get(Symbol::SELF).is_some());
}

#[test]
fn test_many_cycles_across_buckets() {
    let heap = Heap::new();
    let root = heap.allocate();
    for _ in 0..BUCKET_CAPACITY {
        let a = heap.allocate();
        let b = heap.clone_object(&a);
        a.put(Symbol::PARENT, b).unwrap();
    }
    assert_eq!(heap.live_count(), 1 + 2 * BUCKET_CAPACITY);
    let reached = trace(&heap, [&root]);
    assert_eq!(reached.len(), 1);
    assert_eq!(heap.sweep(&reached), 2 * BUCKET_CAPACITY);
    assert_eq!(heap.sweep(&HashSet::from([root.id()])), 0);
}
