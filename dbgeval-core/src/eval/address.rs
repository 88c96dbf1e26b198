//! Array element addresses
//!
//! `ldelema` yields an address the interpreter may only use several
//! instructions later. The address keeps the array and index and touches the
//! debuggee only when it is loaded from or stored through.

use std::rc::Rc;

use super::array::{array_index, ArrayIlValue};
use super::runtime::DebuggerRuntime;
use crate::debuggee::DbgType;

/// Address of one element of a debuggee array
pub struct ArrayElementAddress<R: DebuggerRuntime> {
    array: Rc<ArrayIlValue<R>>,
    index: i64,
}

impl<R: DebuggerRuntime> ArrayElementAddress<R> {
    pub(crate) fn new(array: Rc<ArrayIlValue<R>>, index: i64) -> Self {
        Self { array, index }
    }

    pub fn array(&self) -> &Rc<ArrayIlValue<R>> {
        &self.array
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    /// Load through the address as an interpreter value
    pub fn load(&self, element_type: &DbgType) -> Option<R::IlValue> {
        self.array.load_sz_array_element(self.index, element_type)
    }

    /// Load through the address, keeping the raw element alive
    pub fn read(&self) -> Option<R::Value> {
        if !self.array.is_sz_array() {
            return None;
        }
        self.array.read_array_element(self.index)
    }

    /// Store through the address
    pub fn store(&self, value: &R::IlValue, _element_type: &DbgType) -> bool {
        if !self.array.is_sz_array() {
            return false;
        }
        match array_index(self.index) {
            Some(index) => self.array.write_array_element(index, value),
            None => false,
        }
    }
}
