//! Literal table and bootstrap object graph

use core_types::{ErrorKind, Number, Protection, Stream, Symbol, SymbolTable};
use memory_manager::{Heap, ObjectPtr, Prim};

/// Indices into the literal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lit {
    /// `Nil`
    Nil = 0,
    /// `False`
    False,
    /// `True`
    True,
    /// `Boolean`
    Bool,
    /// `String`
    String,
    /// `Number`
    Number,
    /// `Symbol`
    Symbol,
    /// `StackFrame`
    SFrame,
    /// `Method`
    Method,
    /// `FileHeader`
    FHead,
    /// The error prototype holder, `err`
    Err,
    /// `Array`
    Array,
    /// `Dict`
    Dict,
    /// The root object
    Object,
}

impl Lit {
    /// Every literal in table order.
    pub const ALL: [Lit; 14] = [
        Lit::Nil,
        Lit::False,
        Lit::True,
        Lit::Bool,
        Lit::String,
        Lit::Number,
        Lit::Symbol,
        Lit::SFrame,
        Lit::Method,
        Lit::FHead,
        Lit::Err,
        Lit::Array,
        Lit::Dict,
        Lit::Object,
    ];

    /// The table index.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What bootstrap hands to the engine.
pub(crate) struct Bootstrap {
    pub(crate) lit: Box<[ObjectPtr]>,
    pub(crate) global: ObjectPtr,
}

fn define(global: &ObjectPtr, symbols: &mut SymbolTable, name: &str, value: &ObjectPtr) {
    global.put_protected(symbols.intern(name), value.clone(), Protection::empty());
}

/// Builds the initial object graph.
///
/// `object` is the root: its own parent, with that slot delete-protected.
/// Everything else descends from it.
pub(crate) fn bootstrap(heap: &Heap, symbols: &mut SymbolTable) -> Bootstrap {
    let object = heap.allocate();
    object.put_protected(Symbol::PARENT, object.clone(), Protection::DELETE);

    let meta = heap.clone_object(&object);
    let global = heap.clone_object(&object);

    let proc_ = heap.clone_object(&object);
    let method = heap.clone_object(&proc_);
    let number = heap.clone_object(&object);
    let string = heap.clone_object(&object);
    let symbol = heap.clone_object(&object);
    let cont = heap.clone_object(&proc_);

    let err = heap.clone_object(&object);
    let process = heap.clone_object(&object);
    let stream = heap.clone_object(&object);
    let stdout = heap.clone_object(&stream);
    let stdin = heap.clone_object(&stream);
    let stderr = heap.clone_object(&stream);

    let array = heap.clone_object(&object);
    let dict = heap.clone_object(&object);
    let sys = heap.clone_object(&object);
    let stack_frame = heap.clone_object(&object);
    let file_header = heap.clone_object(&object);

    let nil = heap.clone_object(&object);
    let boolean = heap.clone_object(&object);
    let true_ = heap.clone_object(&boolean);
    let false_ = heap.clone_object(&boolean);

    // Error prototypes, each cloned from its parent kind.
    let mut kinds: Vec<(ErrorKind, ObjectPtr)> = Vec::with_capacity(ErrorKind::ALL.len());
    for kind in ErrorKind::ALL {
        let parent = kind
            .parent()
            .and_then(|p| kinds.iter().find(|(k, _)| *k == p))
            .map(|(_, o)| o.clone())
            .unwrap_or_else(|| object.clone());
        kinds.push((kind, heap.clone_object(&parent)));
    }
    for (kind, proto) in &kinds {
        define(&err, symbols, kind.name(), proto);
    }

    for (name, value) in [
        ("Object", &object),
        ("Proc", &proc_),
        ("Method", &method),
        ("Number", &number),
        ("String", &string),
        ("Symbol", &symbol),
        ("Stream", &stream),
        ("Process", &process),
        ("True", &true_),
        ("False", &false_),
        ("Nil", &nil),
        ("Boolean", &boolean),
        ("Cont", &cont),
        ("Array", &array),
        ("Dict", &dict),
        ("StackFrame", &stack_frame),
        ("FileHeader", &file_header),
        ("err", &err),
        ("stdin", &stdin),
        ("stdout", &stdout),
        ("stderr", &stderr),
        ("global", &global),
    ] {
        define(&global, symbols, name, value);
    }
    for (kind, proto) in &kinds {
        if matches!(kind, ErrorKind::Exception | ErrorKind::SystemError) {
            define(&global, symbols, kind.name(), proto);
        }
    }

    meta.put_protected(Symbol::META, meta.clone(), Protection::DELETE);
    object.put_protected(Symbol::META, meta.clone(), Protection::DELETE);
    meta.put_protected(
        symbols.intern("sys"),
        sys,
        Protection::DELETE | Protection::ASSIGN,
    );
    meta.put_protected(symbols.intern("operators"), dict.clone(), Protection::DELETE);

    number.set_prim(Prim::Number(Number::default()));
    string.set_prim(Prim::Str(String::new()));
    symbol.set_prim(Prim::Symbol(Symbol::EMPTY));
    stdout.set_prim(Prim::Stream(Stream::Stdout.shared()));
    stdin.set_prim(Prim::Stream(Stream::Stdin.shared()));
    stderr.set_prim(Prim::Stream(Stream::Stderr.shared()));

    // The backing store of dictionaries has no parent so that keys never
    // collide with inherited slots.
    let backing = heap.allocate();
    dict.put_protected(Symbol::IMPL, backing, Protection::empty());

    let lit: Box<[ObjectPtr]> = Box::new([
        nil,
        false_,
        true_,
        boolean,
        string,
        number,
        symbol,
        stack_frame,
        method,
        file_header,
        err,
        array,
        dict,
        object,
    ]);
    Bootstrap { lit, global }
}
