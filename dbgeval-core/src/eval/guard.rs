//! Scoped array dereference
//!
//! An array may reach the evaluator either as a reference or as the object
//! itself. [`ArrayObject`] gives every operation an object handle and hands a
//! freshly dereferenced one back to the debuggee when it goes out of scope.

use std::ops::Deref;

use log::trace;

use crate::debuggee::DebuggeeValue;

enum Held<'a, V> {
    /// Acquired by this guard; released on drop
    Owned(V),
    /// Belongs to the caller; never released here
    Borrowed(&'a V),
}

/// Array object handle valid for the guard's scope
pub struct ArrayObject<'a, V: DebuggeeValue> {
    held: Option<Held<'a, V>>,
}

impl<'a, V: DebuggeeValue> ArrayObject<'a, V> {
    /// Dereference `value` if it is a reference, otherwise borrow it
    ///
    /// `value` must not be a null reference. Returns `None` if the debuggee
    /// refuses the dereference.
    pub fn acquire(value: &'a V) -> Option<Self> {
        debug_assert!(!value.is_null_reference());
        let held = if value.is_reference() {
            let object = value.dereference()?;
            trace!("dereferenced {} for scoped access", value.value_type());
            Held::Owned(object)
        } else {
            Held::Borrowed(value)
        };
        let guard = Self { held: Some(held) };
        debug_assert!(guard.value_type().is_array());
        Some(guard)
    }

    /// Whether dropping the guard will release the handle
    pub fn owns_value(&self) -> bool {
        matches!(self.held, Some(Held::Owned(_)))
    }
}

impl<V: DebuggeeValue> Deref for ArrayObject<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        match &self.held {
            Some(Held::Owned(value)) => value,
            Some(Held::Borrowed(value)) => value,
            None => unreachable!("array object used after release"),
        }
    }
}

impl<V: DebuggeeValue> Drop for ArrayObject<'_, V> {
    fn drop(&mut self) {
        if let Some(Held::Owned(value)) = self.held.take() {
            trace!("releasing scoped {}", value.value_type());
            value.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuggee::{DbgType, Heap, PrimitiveType, Slot};
    use crate::eval::Value;

    fn heap_with_array() -> (Heap, usize) {
        let heap = Heap::new();
        let id = heap.alloc_array(
            DbgType::sz_array(DbgType::Primitive(PrimitiveType::I32)),
            vec![Slot::Primitive(Value::I32(5))],
        );
        (heap, id)
    }

    #[test]
    fn test_reference_is_owned_and_released() {
        let (heap, id) = heap_with_array();
        let reference = heap.reference(id);
        heap.reset_stats();

        {
            let object = ArrayObject::acquire(&reference).unwrap();
            assert!(object.owns_value());
            assert!(!object.is_reference());
            assert_eq!(object.array_count(), Some(1));
        }

        let stats = heap.stats();
        assert_eq!(stats.dereferences, 1);
        assert_eq!(stats.released, 1);
    }

    #[test]
    fn test_object_is_borrowed() {
        let (heap, id) = heap_with_array();
        let object = heap.object(id);
        heap.forbid_release(true);

        {
            let guard = ArrayObject::acquire(&object).unwrap();
            assert!(!guard.owns_value());
            assert_eq!(guard.array_count(), Some(1));
        }

        assert_eq!(heap.stats().dereferences, 0);
        assert_eq!(heap.stats().released, 0);
    }

    #[test]
    fn test_failed_dereference_releases_nothing() {
        let (heap, id) = heap_with_array();
        let reference = heap.reference(id);
        heap.set_dereference_fails(true);
        heap.reset_stats();

        assert!(ArrayObject::acquire(&reference).is_none());
        assert_eq!(heap.stats().released, 0);
    }
}
