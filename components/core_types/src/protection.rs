//! Slot protection bits.

use bitflags::bitflags;

bitflags! {
    /// Per-slot protection mask.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Protection;
    ///
    /// let both = Protection::ASSIGN | Protection::DELETE;
    /// assert!(both.is_protected(Protection::DELETE));
    /// assert!(!Protection::ASSIGN.is_protected(both));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Protection: u8 {
        /// Writes to the slot are rejected
        const ASSIGN = 0b01;
        /// Removal of the slot is rejected
        const DELETE = 0b10;
    }
}

impl Protection {
    /// Returns `true` when every bit of `mask` is set.
    pub fn is_protected(self, mask: Protection) -> bool {
        self.contains(mask)
    }
}
