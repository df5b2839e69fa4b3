//! Memory Manager - object storage and garbage collection
//!
//! This component provides:
//! - A slab allocator with generation-checked entry ids
//! - Reference-counted object handles that free on the last drop
//! - The prototype object model (slots, protection, primitive values)
//! - A tracing collector that reclaims cycles, with countdown pacing
//!
//! # Example
//!
//! ```
//! use core_types::Symbol;
//! use memory_manager::{collect, Heap};
//!
//! let heap = Heap::new();
//! let root = heap.allocate();
//! {
//!     let a = heap.allocate();
//!     let b = heap.clone_object(&a);
//!     a.put(Symbol::PARENT, b).unwrap();
//! }
//! // The cycle keeps itself alive until a trace runs.
//! assert_eq!(heap.live_count(), 3);
//! assert_eq!(collect(&heap, [&root]), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocator;
pub mod gc;
pub mod heap;
pub mod object;
pub mod prim;

// Re-export main types
pub use allocator::{Allocator, ObjectId, BUCKET_CAPACITY};
pub use gc::{collect, trace, Collector, DEFAULT_COUNTDOWN, DEFAULT_LIMIT};
pub use heap::{Heap, ObjectPtr};
pub use object::{hierarchy, keys, lookup, origin, Object, Slot};
pub use prim::{Continuation, Prim};
