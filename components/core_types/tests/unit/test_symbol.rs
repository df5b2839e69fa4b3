//! Unit tests for Symbol and SymbolTable

use core_types::{Symbol, SymbolKind, SymbolTable};

#[cfg(test)]
mod symbol_table_tests {
    use super::*;

    #[test]
    fn test_interning_same_name_returns_same_symbol() {
        let mut table = SymbolTable::new();
        let a = table.intern("counter");
        assert_eq!(table.intern("counter"), a);
        assert_eq!(table.name(a), "counter");
    }

    #[test]
    fn test_find_does_not_intern() {
        let mut table = SymbolTable::new();
        let before = table.len();
        assert_eq!(table.find("nowhere"), None);
        assert_eq!(table.len(), before);
        table.intern("nowhere");
        assert!(table.find("nowhere").is_some());
    }

    #[test]
    fn test_gensym_names_are_tilde_prefixed() {
        let mut table = SymbolTable::new();
        let g = table.gensym();
        assert!(table.name(g).starts_with("~G"));
        let h = table.gensym_with_prefix("tmp");
        assert!(table.name(h).starts_with("~tmp"));
        assert_ne!(g, h);
    }

    #[test]
    fn test_natural_symbols_need_no_table() {
        let a = Symbol::natural(7);
        let b = Symbol::natural(7);
        assert_eq!(a, b);
        assert_ne!(a, Symbol::natural(8));
        assert_eq!(a.to_string(), "~NAT7");
    }

    #[test]
    fn test_symbol_kinds() {
        let mut table = SymbolTable::new();
        let s = table.intern("plain");
        let g = table.gensym();
        assert_eq!(table.kind(s), SymbolKind::Standard);
        assert_eq!(table.kind(g), SymbolKind::Generated);
        assert_eq!(table.kind(Symbol::natural(1)), SymbolKind::Natural);
    }

    #[test]
    fn test_from_index_round_trips() {
        let sym = Symbol::from_index(13);
        assert_eq!(sym, Symbol::LOWER_BOUND);
        assert_eq!(sym.index(), 13);
    }
}
