//! Array values
//!
//! [`ArrayIlValue`] is how the IL interpreter sees an array living in the
//! debuggee. Element access goes through a scoped dereference so reference
//! handles are followed and released within each operation, and the array
//! length is queried at most once.

use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use super::address::ArrayElementAddress;
use super::call::{CallOutcome, SpecialMethodKind};
use super::guard::ArrayObject;
use super::runtime::DebuggerRuntime;
use crate::debuggee::{DbgType, DebuggeeValue};

/// Largest index an array element operation accepts
pub const MAX_ARRAY_INDEX: i64 = u32::MAX as i64;

/// Map an interpreter index onto the addressable element window
pub fn array_index(index: i64) -> Option<u32> {
    u32::try_from(index).ok()
}

/// Memoized result of the length query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthCache {
    Uninitialized,
    Known(u32),
    /// The query failed; never retried
    Error,
}

/// Interpreter value wrapping a debuggee array
pub struct ArrayIlValue<R: DebuggerRuntime> {
    runtime: Rc<R>,
    array_value: R::Value,
    is_sz_array: bool,
    cached_length: Cell<LengthCache>,
}

impl<R: DebuggerRuntime> ArrayIlValue<R> {
    /// `array_value` is a non-null array reference or array object
    pub fn new(runtime: Rc<R>, array_value: R::Value) -> Self {
        debug_assert!(!array_value.is_null_reference());
        let ty = array_value.value_type().without_by_ref();
        debug_assert!(ty.is_array());
        let is_sz_array = ty.is_sz_array();
        Self {
            runtime,
            array_value,
            is_sz_array,
            cached_length: Cell::new(LengthCache::Uninitialized),
        }
    }

    /// The wrapped debuggee value
    pub fn value(&self) -> &R::Value {
        &self.array_value
    }

    /// Declared type of the wrapped value
    pub fn value_type(&self) -> &DbgType {
        self.array_value.value_type()
    }

    pub fn is_sz_array(&self) -> bool {
        self.is_sz_array
    }

    pub fn length_cache(&self) -> LengthCache {
        self.cached_length.get()
    }

    /// Hand the wrapped value back to its owner
    pub fn into_value(self) -> R::Value {
        self.array_value
    }

    /// Offer a method call to the array
    ///
    /// Accessors of multi-dimensional arrays are recognised but not
    /// evaluated here.
    pub fn call(&self, declaring_type: &DbgType, method_name: &str) -> CallOutcome {
        match SpecialMethodKind::of(declaring_type, method_name) {
            Some(kind) => CallOutcome::Unsupported(kind),
            None => CallOutcome::NotHandled,
        }
    }

    /// Read an element of any array shape, keeping it alive for the
    /// rest of the evaluation
    pub fn read_array_element(&self, index: i64) -> Option<R::Value> {
        let index = array_index(index)?;
        let object = ArrayObject::acquire(&self.array_value)?;
        let element = object.array_element_at(index)?;
        Some(self.runtime.record_value(element))
    }

    pub fn write_array_element(&self, index: u32, value: &R::IlValue) -> bool {
        self.runtime.set_array_element_at(&self.array_value, index, value)
    }

    /// `ldelem`: load an element of a single-dimension zero-based array
    pub fn load_sz_array_element(&self, index: i64, _element_type: &DbgType) -> Option<R::IlValue> {
        if !self.is_sz_array {
            return None;
        }
        let index = array_index(index)?;
        let object = ArrayObject::acquire(&self.array_value)?;
        let element = object.array_element_at(index)?;
        Some(self.runtime.create_il_value(element))
    }

    /// `stelem`: store an element of a single-dimension zero-based array
    ///
    /// Returns `false` only when the array shape or index rule out the store.
    pub fn store_sz_array_element(&self, index: i64, value: &R::IlValue, _element_type: &DbgType) -> bool {
        if !self.is_sz_array {
            return false;
        }
        let Some(index) = array_index(index) else {
            return false;
        };
        if !self.write_array_element(index, value) {
            debug!("runtime refused store to {}[{}]", self.value_type(), index);
        }
        true
    }

    /// `ldelema`: address of an element, resolved when it is used
    pub fn load_sz_array_element_address(
        self: &Rc<Self>,
        index: i64,
        _element_type: &DbgType,
    ) -> Option<ArrayElementAddress<R>> {
        if !self.is_sz_array {
            return None;
        }
        array_index(index)?;
        Some(ArrayElementAddress::new(Rc::clone(self), index))
    }

    /// `ldlen`: element count of a single-dimension zero-based array
    pub fn sz_array_length(&self) -> Option<i64> {
        let state = match self.cached_length.get() {
            LengthCache::Uninitialized => {
                let state = self.query_length();
                debug!("length of {} settled as {:?}", self.value_type(), state);
                self.cached_length.set(state);
                state
            }
            state => state,
        };
        match state {
            LengthCache::Known(length) => Some(i64::from(length)),
            _ => None,
        }
    }

    fn query_length(&self) -> LengthCache {
        if !self.is_sz_array {
            return LengthCache::Error;
        }
        let Some(object) = ArrayObject::acquire(&self.array_value) else {
            return LengthCache::Error;
        };
        if !object.value_type().is_sz_array() {
            return LengthCache::Error;
        }
        match object.array_count() {
            Some(count) => LengthCache::Known(count),
            None => LengthCache::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuggee::{Heap, ObjectId, PrimitiveType, Slot, SnapshotValue};
    use crate::eval::{SnapshotRuntime, Value};

    type Adapter = ArrayIlValue<SnapshotRuntime>;

    fn int_type() -> DbgType {
        DbgType::Primitive(PrimitiveType::I32)
    }

    fn int_array(heap: &Heap, values: &[i32]) -> ObjectId {
        let elements = values.iter().map(|v| Slot::Primitive(Value::I32(*v))).collect();
        heap.alloc_array(DbgType::sz_array(int_type()), elements)
    }

    fn matrix(heap: &Heap) -> ObjectId {
        let elements = (0..4).map(|v| Slot::Primitive(Value::I32(v))).collect();
        heap.alloc_array(DbgType::md_array(int_type(), 2), elements)
    }

    fn adapter(value: SnapshotValue) -> (Rc<SnapshotRuntime>, Adapter) {
        let runtime = Rc::new(SnapshotRuntime::new());
        let adapter = ArrayIlValue::new(Rc::clone(&runtime), value);
        (runtime, adapter)
    }

    #[test]
    fn test_read_element_is_recorded() {
        let heap = Heap::new();
        let id = int_array(&heap, &[10, 20, 30]);
        let (runtime, array) = adapter(heap.reference(id));

        let element = array.read_array_element(1).unwrap();
        assert_eq!(element.scalar(), Some(&Value::I32(20)));
        assert_eq!(runtime.recorded_len(), 1);
        assert!(array.read_array_element(3).is_none());
    }

    #[test]
    fn test_store_then_load() {
        let heap = Heap::new();
        let id = int_array(&heap, &[10, 20, 30]);
        let (_runtime, array) = adapter(heap.reference(id));

        assert!(array.store_sz_array_element(1, &Value::I32(99), &int_type()));
        assert_eq!(array.load_sz_array_element(1, &int_type()), Some(Value::I32(99)));
        assert_eq!(array.load_sz_array_element(0, &int_type()), Some(Value::I32(10)));
    }

    #[test]
    fn test_refused_store_still_reports_delegated() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1]);
        let (_runtime, array) = adapter(heap.object(id));

        assert!(array.store_sz_array_element(0, &Value::Bool(true), &int_type()));
        assert_eq!(heap.element(id, 0), Some(Slot::Primitive(Value::I32(1))));
    }

    #[test]
    fn test_length_is_memoized() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1, 2, 3]);
        let (_runtime, array) = adapter(heap.reference(id));

        assert_eq!(array.length_cache(), LengthCache::Uninitialized);
        assert_eq!(array.sz_array_length(), Some(3));

        heap.resize(id, 10);
        assert_eq!(array.sz_array_length(), Some(3));
        heap.retype(id, DbgType::md_array(int_type(), 2));
        assert_eq!(array.sz_array_length(), Some(3));

        assert_eq!(array.length_cache(), LengthCache::Known(3));
        assert_eq!(heap.stats().length_queries, 1);
    }

    #[test]
    fn test_length_of_md_array_never_queries() {
        let heap = Heap::new();
        let id = matrix(&heap);
        let (_runtime, array) = adapter(heap.reference(id));
        heap.reset_stats();

        for _ in 0..5 {
            assert_eq!(array.sz_array_length(), None);
        }
        assert_eq!(array.length_cache(), LengthCache::Error);
        let stats = heap.stats();
        assert_eq!(stats.length_queries, 0);
        assert_eq!(stats.dereferences, 0);
    }

    #[test]
    fn test_length_error_is_sticky() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1, 2]);
        let (_runtime, array) = adapter(heap.reference(id));

        // runtime shape no longer matches the declared one
        heap.retype(id, DbgType::md_array(int_type(), 1));
        assert_eq!(array.sz_array_length(), None);

        heap.retype(id, DbgType::sz_array(int_type()));
        assert_eq!(array.sz_array_length(), None);
        assert_eq!(heap.stats().dereferences, 1);
    }

    #[test]
    fn test_failed_dereference_fixes_error() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1]);
        let (_runtime, array) = adapter(heap.reference(id));

        heap.set_dereference_fails(true);
        assert_eq!(array.sz_array_length(), None);
        heap.set_dereference_fails(false);
        assert_eq!(array.sz_array_length(), None);
        assert_eq!(array.length_cache(), LengthCache::Error);
    }

    #[test]
    fn test_by_ref_declared_type_is_unwrapped() {
        let heap = Heap::new();
        let id = int_array(&heap, &[4, 5]);
        let declared = DbgType::by_ref(DbgType::sz_array(int_type()));
        let (_runtime, array) = adapter(heap.reference_as(id, declared));

        assert!(array.is_sz_array());
        assert_eq!(array.sz_array_length(), Some(2));
    }

    #[test]
    fn test_indices_outside_window() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1, 2, 3]);
        let (runtime, array) = adapter(heap.reference(id));
        let array = Rc::new(array);
        heap.reset_stats();

        for index in [-1, i64::MIN, MAX_ARRAY_INDEX + 1, i64::MAX] {
            assert!(array.read_array_element(index).is_none());
            assert!(array.load_sz_array_element(index, &int_type()).is_none());
            assert!(!array.store_sz_array_element(index, &Value::I32(0), &int_type()));
            assert!(array.load_sz_array_element_address(index, &int_type()).is_none());
        }

        let stats = heap.stats();
        assert_eq!(stats.dereferences, 0);
        assert_eq!(stats.length_queries, 0);
        assert_eq!(runtime.recorded_len(), 0);
        assert_eq!(array.length_cache(), LengthCache::Uninitialized);
    }

    #[test]
    fn test_largest_index_is_accepted() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1]);
        let (_runtime, array) = adapter(heap.reference(id));
        heap.reset_stats();

        // in the window, but past the end of this array
        assert!(array.load_sz_array_element(MAX_ARRAY_INDEX, &int_type()).is_none());
        let stats = heap.stats();
        assert_eq!(stats.dereferences, 1);
        assert_eq!(stats.element_reads, 1);
    }

    #[test]
    fn test_md_array_element_ops_are_unsupported() {
        let heap = Heap::new();
        let id = matrix(&heap);
        let (_runtime, array) = adapter(heap.reference(id));
        let array = Rc::new(array);
        heap.reset_stats();

        assert!(array.load_sz_array_element(0, &int_type()).is_none());
        assert!(!array.store_sz_array_element(0, &Value::I32(1), &int_type()));
        assert!(array.load_sz_array_element_address(0, &int_type()).is_none());
        assert_eq!(heap.stats().dereferences, 0);

        // the shape-agnostic read still works
        let element = array.read_array_element(3).unwrap();
        assert_eq!(element.scalar(), Some(&Value::I32(3)));
    }

    #[test]
    fn test_reference_is_dereferenced_once_per_operation() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1, 2, 3]);
        let (runtime, array) = adapter(heap.reference(id));
        heap.reset_stats();

        let tracked = array.read_array_element(0).unwrap();
        assert_eq!(heap.stats().dereferences, 1);
        // scoped object released; element + tracked copy stay live
        assert_eq!(heap.stats().released, 1);

        assert!(array.read_array_element(7).is_none());
        assert_eq!(heap.stats().dereferences, 2);
        assert_eq!(heap.stats().released, 2);

        assert!(array.load_sz_array_element(2, &int_type()).is_some());
        assert!(array.load_sz_array_element(5, &int_type()).is_none());
        assert!(array.sz_array_length().is_some());

        let stats = heap.stats();
        assert_eq!(stats.dereferences, 5);

        tracked.release();
        runtime.clear_recorded();
        assert_eq!(heap.stats().live(), 0);
    }

    #[test]
    fn test_borrowed_object_is_never_released() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1, 2, 3]);
        let (_runtime, array) = adapter(heap.object(id));
        let array = Rc::new(array);

        heap.forbid_release(true);
        assert!(array.read_array_element(0).is_some());
        assert!(array.read_array_element(9).is_none());
        assert_eq!(array.sz_array_length(), Some(3));
        assert!(array.store_sz_array_element(1, &Value::I32(8), &int_type()));
        let address = array.load_sz_array_element_address(1, &int_type()).unwrap();
        assert!(address.read().is_some());
        assert!(array.load_sz_array_element(9, &int_type()).is_none());

        assert_eq!(heap.stats().dereferences, 0);
    }

    #[test]
    fn test_special_calls() {
        let heap = Heap::new();
        let id = matrix(&heap);
        let (_runtime, array) = adapter(heap.reference(id));
        let ty = array.value_type().clone();

        assert_eq!(
            array.call(&ty, "Get"),
            CallOutcome::Unsupported(SpecialMethodKind::ArrayGet)
        );
        assert_eq!(
            array.call(&ty, "Set"),
            CallOutcome::Unsupported(SpecialMethodKind::ArraySet)
        );
        assert_eq!(array.call(&ty, "GetLength"), CallOutcome::NotHandled);
    }

    #[test]
    fn test_into_value_returns_handle() {
        let heap = Heap::new();
        let id = int_array(&heap, &[1]);
        let (_runtime, array) = adapter(heap.reference(id));
        assert_eq!(array.sz_array_length(), Some(1));

        array.into_value().release();
        assert_eq!(heap.stats().live(), 0);
    }
}
