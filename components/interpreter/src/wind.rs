//! Dynamic wind
//!
//! `WND` conses a [`WindFrame`] onto the persistent wind list and `UNWND`
//! drops it again. Continuation jumps call [`resolve_thunks`] with the list
//! in effect before the jump and the one restored from the continuation;
//! it schedules the after-thunks of every frame being left and the
//! before-thunks of every frame being entered.

use std::rc::Rc;

use bytecode_system::{Method, TranslationUnit};
use core_types::TraceFrame;
use memory_manager::{Heap, ObjectPtr};

use crate::ground::Gtu;
use crate::persistent::PList;
use crate::state::IntState;

/// A method plus the scopes it was captured with.
#[derive(Debug, Clone)]
pub struct Thunk {
    /// Body to run
    pub method: Method,
    /// Lexical scope at capture time
    pub lex: ObjectPtr,
    /// Dynamic scope at capture time
    pub dyn_: ObjectPtr,
}

/// One `WND` bracket.
#[derive(Debug, Clone)]
pub struct WindFrame {
    /// Runs when control enters the bracket
    pub before: Thunk,
    /// Runs when control leaves the bracket
    pub after: Thunk,
}

impl WindFrame {
    /// Calls `f` on the four scope objects the frame holds.
    pub fn visit(&self, f: &mut dyn FnMut(&ObjectPtr)) {
        for thunk in [&self.before, &self.after] {
            f(&thunk.lex);
            f(&thunk.dyn_);
        }
    }
}

/// Schedules wind thunks for a jump from `old` to `new`.
///
/// Frames shared by both lists (their common outer suffix) are skipped.
/// What remains runs in this order, ahead of the current cursor:
///
/// 1. `STORED`, saving `%ret` on `%sto`;
/// 2. the after-thunk of each frame left, innermost first;
/// 3. the before-thunk of each frame entered, outermost first;
/// 4. `UNSTORED`, restoring `%ret`.
///
/// Each thunk runs as a full call frame: a clone of its lexical and dynamic
/// scope, a backtrace entry and a unit marker are pushed here, and the
/// thunk's closing `RET` pops them. Pushes happen in reverse run order so
/// every thunk finds its own frame on top.
pub fn resolve_thunks(
    state: &mut IntState,
    heap: &Heap,
    gtu: &Rc<TranslationUnit>,
    old: &PList<Rc<WindFrame>>,
    new: &PList<Rc<WindFrame>>,
) {
    // Both innermost first.
    let mut exits: Vec<&Rc<WindFrame>> = old.iter().collect();
    let mut enters: Vec<&Rc<WindFrame>> = new.iter().collect();
    while let (Some(a), Some(b)) = (exits.last(), enters.last()) {
        if !Rc::ptr_eq(a, b) {
            break;
        }
        exits.pop();
        enters.pop();
    }
    if exits.is_empty() && enters.is_empty() {
        return;
    }

    let cont = std::mem::replace(&mut state.cont, Gtu::Stored.seek(gtu));
    state.stack.push(cont);
    state.stack.push(Gtu::Unstored.seek(gtu));
    for frame in enters {
        push_thunk(state, heap, &frame.before);
    }
    for frame in exits.into_iter().rev() {
        push_thunk(state, heap, &frame.after);
    }
}

fn push_thunk(state: &mut IntState, heap: &Heap, thunk: &Thunk) {
    state.lex.push(heap.clone_object(&thunk.lex));
    state.dyn_.push(heap.clone_object(&thunk.dyn_));
    state
        .trace
        .push(TraceFrame::new(state.line, state.file.clone()));
    state.trns.push(Rc::clone(thunk.method.unit()));
    state.stack.push(thunk.method.seek());
}
