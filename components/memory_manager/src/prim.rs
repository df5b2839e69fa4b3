//! Primitive payloads carried by objects.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use bytecode_system::Method;
use core_types::{Number, ProcessPtr, StreamPtr, Symbol};

use crate::heap::ObjectPtr;

/// A captured continuation stored inside an object.
///
/// The concrete snapshot type lives with the execution engine; the heap only
/// needs to walk the objects it keeps alive.
pub trait Continuation: fmt::Debug {
    /// Calls `f` on every object the snapshot references.
    fn visit(&self, f: &mut dyn FnMut(&ObjectPtr));

    /// Downcast hook for the engine that created the snapshot.
    fn as_any(&self) -> &dyn Any;
}

/// The tagged primitive value of an object.
#[derive(Debug, Clone, Default)]
pub enum Prim {
    /// No primitive
    #[default]
    Nil,
    /// A number
    Number(Number),
    /// A string
    Str(String),
    /// A symbol
    Symbol(Symbol),
    /// A stream handle
    Stream(StreamPtr),
    /// A process handle
    Process(ProcessPtr),
    /// A method
    Method(Method),
    /// A continuation snapshot
    Continuation(Rc<dyn Continuation>),
}

impl Prim {
    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Prim::Nil => "nil",
            Prim::Number(_) => "number",
            Prim::Str(_) => "string",
            Prim::Symbol(_) => "symbol",
            Prim::Stream(_) => "stream",
            Prim::Process(_) => "process",
            Prim::Method(_) => "method",
            Prim::Continuation(_) => "continuation",
        }
    }

    /// Returns `true` for [`Prim::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Prim::Nil)
    }

    /// Calls `f` on every object this primitive keeps alive.
    pub fn visit(&self, f: &mut dyn FnMut(&ObjectPtr)) {
        if let Prim::Continuation(cont) = self {
            cont.visit(f);
        }
    }
}

impl PartialEq for Prim {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Prim::Nil, Prim::Nil) => true,
            (Prim::Number(a), Prim::Number(b)) => a == b,
            (Prim::Str(a), Prim::Str(b)) => a == b,
            (Prim::Symbol(a), Prim::Symbol(b)) => a == b,
            (Prim::Stream(a), Prim::Stream(b)) => Rc::ptr_eq(a, b),
            (Prim::Process(a), Prim::Process(b)) => Rc::ptr_eq(a, b),
            (Prim::Method(a), Prim::Method(b)) => a == b,
            (Prim::Continuation(a), Prim::Continuation(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
