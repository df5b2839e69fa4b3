//! Unit tests for ErrorKind, ProtectionError and NumberError

use core_types::{ErrorKind, NumberError, ProtectionError, Symbol};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_all_kinds_have_names() {
        let names: Vec<&str> = ErrorKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec![
                "Exception",
                "SystemError",
                "TypeError",
                "ProtectedError",
                "ArgError",
                "InputError",
                "SlotError"
            ]
        );
    }

    #[test]
    fn test_every_kind_reaches_exception() {
        for kind in ErrorKind::ALL {
            let mut k = kind;
            while let Some(p) = k.parent() {
                k = p;
            }
            assert_eq!(k, ErrorKind::Exception);
        }
    }
}

#[cfg(test)]
mod error_display_tests {
    use super::*;

    #[test]
    fn test_protection_error_display() {
        let e = ProtectionError::Assign(Symbol::SELF);
        assert_eq!(e.message(), "Assign-protected variable");
        assert!(e.to_string().contains("assign-protected"));
    }

    #[test]
    fn test_number_error_display() {
        assert_eq!(
            NumberError::DivisionByZero.to_string(),
            "integer division by zero"
        );
    }
}
