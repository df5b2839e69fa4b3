//! Persistent singly linked lists
//!
//! Every register that survives continuation capture is one of these.
//! Cloning a list is O(1) and shares the whole spine; `push` and `pop` only
//! ever replace the head of *this* list, so a clone held by a captured
//! continuation never observes the change.

use std::fmt;
use std::rc::Rc;

struct Node<T> {
    value: T,
    next: Option<Rc<Node<T>>>,
}

/// An immutable cons list with a mutable head pointer.
pub struct PList<T> {
    head: Option<Rc<Node<T>>>,
    len: usize,
}

impl<T> PList<T> {
    /// An empty list.
    pub fn new() -> Self {
        PList { head: None, len: 0 }
    }

    /// Returns `true` when the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// The first element.
    pub fn peek(&self) -> Option<&T> {
        self.head.as_deref().map(|n| &n.value)
    }

    /// Conses `value` onto the front.
    pub fn push(&mut self, value: T) {
        let next = self.head.take();
        self.head = Some(Rc::new(Node { value, next }));
        self.len += 1;
    }

    /// Iterates from the front (most recently pushed) to the back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Returns `true` when both lists start at the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Clone> PList<T> {
    /// Removes and returns the first element. The node is moved out when
    /// this list is its only owner and copied otherwise.
    pub fn pop(&mut self) -> Option<T> {
        let node = self.head.take()?;
        self.len -= 1;
        match Rc::try_unwrap(node) {
            Ok(node) => {
                self.head = node.next;
                Some(node.value)
            }
            Err(shared) => {
                self.head = shared.next.clone();
                Some(shared.value.clone())
            }
        }
    }
}

impl<T> Clone for PList<T> {
    fn clone(&self) -> Self {
        PList {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for PList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for PList<T> {
    // Unlinks uniquely owned nodes one at a time so a long spine never
    // recurses.
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(node) = cur {
            match Rc::try_unwrap(node) {
                Ok(mut node) => cur = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for PList<T> {
    /// Pushes each item in turn, so the last item ends up on top.
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut list = PList::new();
        for item in items {
            list.push(item);
        }
        list
    }
}

/// Front-to-back iterator over a [`PList`].
pub struct Iter<'a, T> {
    next: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.value)
    }
}
