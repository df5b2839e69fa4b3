//! Interned symbols and the symbol table.
//!
//! A [`Symbol`] is an integer identifier. Equality and ordering are integer
//! comparisons, so slot maps never compare strings. Three kinds exist:
//!
//! - standard symbols, interned by name;
//! - generated symbols (gensyms), whose names start with `~` and which are
//!   never shared even when two of them print the same way;
//! - natural symbols, computed from a positive integer with no table lookup.
//!
//! The table is an ordinary value owned by whoever runs the VM; there is no
//! process-wide instance.

use std::collections::HashMap;
use std::fmt;

/// An interned symbol.
///
/// Non-negative indices name entries of a [`SymbolTable`]; negative indices
/// are natural symbols (`-n` stands for the natural number `n`).
///
/// # Examples
///
/// ```
/// use core_types::{Symbol, SymbolTable};
///
/// let mut table = SymbolTable::new();
/// let a = table.intern("foo");
/// let b = table.intern("foo");
/// assert_eq!(a, b);
/// assert_eq!(table.name(a), "foo");
///
/// let n = Symbol::natural(3);
/// assert_eq!(table.name(n), "~NAT3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(i64);

/// The three families of symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Interned by name; the same name always yields the same symbol.
    Standard,
    /// Produced by gensym; identity is the index alone.
    Generated,
    /// Derived arithmetically from a positive integer.
    Natural,
}

impl Symbol {
    /// The empty symbol `""`.
    pub const EMPTY: Symbol = Symbol(0);
    /// `parent`, the inheritance slot.
    pub const PARENT: Symbol = Symbol(1);
    /// `self`, bound in every method frame.
    pub const SELF: Symbol = Symbol(2);
    /// `again`, the method object being called.
    pub const AGAIN: Symbol = Symbol(3);
    /// `caller`, the caller's lexical scope.
    pub const CALLER: Symbol = Symbol(4);
    /// `closure`, the defining scope of a method object.
    pub const CLOSURE: Symbol = Symbol(5);
    /// `missing`, the first lookup fallback.
    pub const MISSING: Symbol = Symbol(6);
    /// `meta`, looked up on the lexical scope by the second fallback.
    pub const META: Symbol = Symbol(7);
    /// `missed`, looked up on `meta` by the second fallback.
    pub const MISSED: Symbol = Symbol(8);
    /// `message`, set on raised error objects.
    pub const MESSAGE: Symbol = Symbol(9);
    /// `stack`, the backtrace attached to raised error objects.
    pub const STACK: Symbol = Symbol(10);
    /// `line` on stack-frame objects.
    pub const LINE: Symbol = Symbol(11);
    /// `file` on stack-frame objects.
    pub const FILE: Symbol = Symbol(12);
    /// `lowerBound` on array literals.
    pub const LOWER_BOUND: Symbol = Symbol(13);
    /// `upperBound` on array literals.
    pub const UPPER_BOUND: Symbol = Symbol(14);
    /// `&impl`, the backing store of dictionary literals.
    pub const IMPL: Symbol = Symbol(15);

    /// Builds a symbol from a raw index (the `SYMN` operand).
    pub fn from_index(index: i64) -> Symbol {
        Symbol(index)
    }

    /// The raw index.
    pub fn index(self) -> i64 {
        self.0
    }

    /// The natural symbol for `n`.
    ///
    /// Non-positive inputs collapse to [`Symbol::EMPTY`].
    pub fn natural(n: i64) -> Symbol {
        if n <= 0 {
            Symbol::EMPTY
        } else {
            Symbol(-n)
        }
    }

    /// Returns `true` for natural symbols.
    pub fn is_natural(self) -> bool {
        self.0 < 0
    }
}

const WELL_KNOWN: [&str; 16] = [
    "", "parent", "self", "again", "caller", "closure", "missing", "meta", "missed", "message",
    "stack", "line", "file", "lowerBound", "upperBound", "&impl",
];

/// Bidirectional name/index map.
///
/// The well-known names are interned first so that the associated constants
/// on [`Symbol`] are valid for every table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    names: Vec<String>,
    indices: HashMap<String, i64>,
    gensym_counter: u64,
}

impl SymbolTable {
    /// Creates a table holding only the well-known symbols.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            names: Vec::with_capacity(256),
            indices: HashMap::with_capacity(256),
            gensym_counter: 100,
        };
        for name in WELL_KNOWN {
            table.intern(name);
        }
        table
    }

    /// Interns `name`.
    ///
    /// Names beginning with `~` are uninterned: every call allocates a fresh
    /// index.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if is_uninterned(name) {
            return self.push_name(name.to_string());
        }
        if let Some(&index) = self.indices.get(name) {
            return Symbol(index);
        }
        let sym = self.push_name(name.to_string());
        self.indices.insert(name.to_string(), sym.0);
        sym
    }

    /// Looks a name up without interning it.
    pub fn find(&self, name: &str) -> Option<Symbol> {
        self.indices.get(name).map(|&index| Symbol(index))
    }

    /// Allocates a fresh generated symbol with the default `G` prefix.
    pub fn gensym(&mut self) -> Symbol {
        self.gensym_with_prefix("G")
    }

    /// Allocates a fresh generated symbol named `~<prefix><n>`.
    pub fn gensym_with_prefix(&mut self, prefix: &str) -> Symbol {
        self.gensym_counter += 1;
        let name = format!("~{}{}", prefix, self.gensym_counter);
        self.push_name(name)
    }

    /// The printable name of `sym`.
    ///
    /// Natural symbols print as `~NAT<n>`; unknown indices print as `""`.
    pub fn name(&self, sym: Symbol) -> String {
        if sym.is_natural() {
            return format!("~NAT{}", -sym.0);
        }
        usize::try_from(sym.0)
            .ok()
            .and_then(|i| self.names.get(i))
            .cloned()
            .unwrap_or_default()
    }

    /// Classifies `sym`.
    pub fn kind(&self, sym: Symbol) -> SymbolKind {
        if sym.is_natural() {
            SymbolKind::Natural
        } else if is_uninterned(&self.name(sym)) {
            SymbolKind::Generated
        } else {
            SymbolKind::Standard
        }
    }

    /// The argument symbol `$n` used when binding call arguments.
    pub fn argument(&mut self, n: usize) -> Symbol {
        self.intern(&format!("${}", n))
    }

    /// Number of table entries (natural symbols are not stored).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false` in practice; the well-known names are preloaded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn push_name(&mut self, name: String) -> Symbol {
        let index = self.names.len() as i64;
        self.names.push(name);
        Symbol(index)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_natural() {
            write!(f, "~NAT{}", -self.0)
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

fn is_uninterned(name: &str) -> bool {
    name.starts_with('~')
}
