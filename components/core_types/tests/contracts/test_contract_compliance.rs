//! Contract compliance tests for core_types
//!
//! These tests pin the public surface other components rely on.

use core_types::{Protection, Stream, Symbol, SymbolTable, TraceFrame};

#[cfg(test)]
mod symbol_contract_tests {
    use super::*;

    /// Contract: well-known symbols are valid in every fresh table
    #[test]
    fn test_well_known_symbols_are_preinterned() {
        let table = SymbolTable::new();
        for (sym, name) in [
            (Symbol::PARENT, "parent"),
            (Symbol::SELF, "self"),
            (Symbol::AGAIN, "again"),
            (Symbol::CALLER, "caller"),
            (Symbol::MISSING, "missing"),
            (Symbol::META, "meta"),
            (Symbol::MISSED, "missed"),
            (Symbol::MESSAGE, "message"),
            (Symbol::STACK, "stack"),
            (Symbol::UPPER_BOUND, "upperBound"),
        ] {
            assert_eq!(table.name(sym), name);
        }
    }

    /// Contract: symbols order by index
    #[test]
    fn test_symbols_are_ordered() {
        assert!(Symbol::PARENT < Symbol::SELF);
        assert!(Symbol::natural(1) < Symbol::EMPTY);
    }
}

#[cfg(test)]
mod protection_contract_tests {
    use super::*;

    /// Contract: bit values are fixed
    #[test]
    fn test_protection_bits() {
        assert_eq!(Protection::ASSIGN.bits(), 1);
        assert_eq!(Protection::DELETE.bits(), 2);
    }
}

#[cfg(test)]
mod handle_contract_tests {
    use super::*;

    #[test]
    fn test_buffer_stream_captures_output() {
        let s = Stream::buffer().shared();
        s.borrow_mut().write_str("x\n").unwrap();
        assert_eq!(s.borrow().contents().as_deref(), Some("x\n"));
    }

    #[test]
    fn test_trace_frame_sentinel() {
        assert!(TraceFrame::sentinel().is_sentinel());
        assert!(!TraceFrame::new(1, "").is_sentinel());
    }
}
