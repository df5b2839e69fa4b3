//! First-class continuations
//!
//! `CCALL` stores a [`Snapshot`] of the persistent registers as an object's
//! primitive. Because every persistent register is a [`PList`] or a cursor,
//! capturing is a handful of reference-count bumps and restoring never
//! disturbs any other snapshot.
//!
//! [`PList`]: crate::persistent::PList

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use memory_manager::{Continuation, ObjectPtr, Prim};

use crate::state::IntState;

/// An immutable copy of [`IntState`].
#[derive(Clone)]
pub struct Snapshot(IntState);

impl Snapshot {
    /// Captures `state`.
    pub fn capture(state: &IntState) -> Self {
        Snapshot(state.clone())
    }

    /// A fresh copy of the captured registers.
    pub fn restore(&self) -> IntState {
        self.0.clone()
    }

    /// The captured registers.
    pub fn state(&self) -> &IntState {
        &self.0
    }

    /// Wraps the snapshot as an object primitive.
    pub fn into_prim(self) -> Prim {
        Prim::Continuation(Rc::new(self))
    }

    /// The snapshot held by `obj`, if its primitive is one of ours.
    pub fn from_object(obj: &ObjectPtr) -> Option<Snapshot> {
        match obj.prim() {
            Prim::Continuation(cont) => cont.as_any().downcast_ref::<Snapshot>().cloned(),
            _ => None,
        }
    }
}

impl Continuation for Snapshot {
    fn visit(&self, f: &mut dyn FnMut(&ObjectPtr)) {
        self.0.visit(f);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("cont", &self.0.cont)
            .field("stack", &self.0.stack.len())
            .field("wind", &self.0.wind.len())
            .field("lex", &self.0.lex.len())
            .finish()
    }
}
