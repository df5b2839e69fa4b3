//! Contract tests verifying the memory_manager API other components build on.

use core_types::{Number, Protection, Symbol};
use memory_manager::{collect, keys, lookup, Collector, Heap, Prim, DEFAULT_COUNTDOWN, DEFAULT_LIMIT};

/// Contract: clone sets a delete-protected parent and copies the primitive
#[test]
fn contract_clone_object() {
    let heap = Heap::new();
    let proto = heap.allocate();
    proto.set_prim(Prim::Number(Number::Small(9)));
    proto.put(Symbol::MESSAGE, heap.allocate()).unwrap();
    let copy = heap.clone_object(&proto);
    assert_eq!(copy.get(Symbol::PARENT), Some(proto.clone()));
    assert!(copy.is_protected(Symbol::PARENT, Protection::DELETE));
    assert!(!copy.is_protected(Symbol::PARENT, Protection::ASSIGN));
    assert_eq!(copy.prim(), Prim::Number(Number::Small(9)));
    assert!(copy.get(Symbol::MESSAGE).is_none());
    assert!(lookup(&copy, Symbol::MESSAGE).is_some());
}

/// Contract: raw allocations have no parent
#[test]
fn contract_raw_allocation() {
    let heap = Heap::new();
    let o = heap.allocate();
    assert!(o.get(Symbol::PARENT).is_none());
    assert!(o.direct_keys().is_empty());
    assert!(o.prim().is_nil());
}

/// Contract: keys include inherited keys
#[test]
fn contract_transitive_keys() {
    let heap = Heap::new();
    let base = heap.allocate();
    base.put(Symbol::LINE, heap.allocate()).unwrap();
    let child = heap.clone_object(&base);
    child.put(Symbol::FILE, heap.allocate()).unwrap();
    let all = keys(&child);
    assert!(all.contains(&Symbol::LINE));
    assert!(all.contains(&Symbol::FILE));
    assert!(all.contains(&Symbol::PARENT));
}

/// Contract: pacing defaults
#[test]
fn contract_collector_defaults() {
    let c = Collector::new();
    assert_eq!(c.limit(), DEFAULT_LIMIT);
    assert_eq!(c.countdown(), DEFAULT_COUNTDOWN);
    assert_eq!(DEFAULT_LIMIT, 8192);
    assert_eq!(DEFAULT_COUNTDOWN, 65536);
}

/// Contract: collection with every object rooted frees nothing
#[test]
fn contract_collect_all_rooted() {
    let heap = Heap::new();
    let a = heap.allocate();
    let b = heap.allocate();
    assert_eq!(collect(&heap, [&a, &b]), 0);
    assert_eq!(heap.live_count(), 2);
}
