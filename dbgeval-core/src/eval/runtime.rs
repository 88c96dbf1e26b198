//! Debugger runtime
//!
//! The host side of an evaluation: keeps element handles alive, turns them
//! into interpreter values, and writes into debuggee arrays.

use std::cell::RefCell;

use log::debug;

use super::guard::ArrayObject;
use super::value::Value;
use crate::debuggee::{DebuggeeValue, Slot, SnapshotValue};

/// Operations the array adapter needs from the evaluation host
pub trait DebuggerRuntime {
    type Value: DebuggeeValue;
    type IlValue;

    /// Keep `raw` alive until the evaluation ends and return a handle to it
    fn record_value(&self, raw: Self::Value) -> Self::Value;

    /// Turn a raw debuggee value into something the interpreter can hold
    fn create_il_value(&self, raw: Self::Value) -> Self::IlValue;

    /// Write `value` at `index` of `array`
    ///
    /// `array` may be a reference or an object; the runtime dereferences it
    /// itself. Returns whether the write was accepted.
    fn set_array_element_at(&self, array: &Self::Value, index: u32, value: &Self::IlValue) -> bool;
}

/// Runtime over a [`Heap`]
#[derive(Debug, Default)]
pub struct SnapshotRuntime {
    recorded: RefCell<Vec<SnapshotValue>>,
}

impl SnapshotRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles kept alive by [`DebuggerRuntime::record_value`]
    pub fn recorded_len(&self) -> usize {
        self.recorded.borrow().len()
    }

    /// End of evaluation: release every recorded handle
    pub fn clear_recorded(&self) {
        for value in self.recorded.borrow_mut().drain(..) {
            value.release();
        }
    }
}

impl DebuggerRuntime for SnapshotRuntime {
    type Value = SnapshotValue;
    type IlValue = Value;

    fn record_value(&self, raw: SnapshotValue) -> SnapshotValue {
        let tracked = raw.duplicate();
        self.recorded.borrow_mut().push(raw);
        tracked
    }

    fn create_il_value(&self, raw: SnapshotValue) -> Value {
        let value = raw.to_value();
        raw.release();
        value
    }

    fn set_array_element_at(&self, array: &SnapshotValue, index: u32, value: &Value) -> bool {
        let Some(object) = ArrayObject::acquire(array) else {
            return false;
        };
        let Some(id) = object.object_id() else {
            return false;
        };
        let Some(element_type) = object.value_type().element_type().and_then(|ty| ty.primitive()) else {
            debug!("cannot store into {} elements", object.value_type());
            return false;
        };

        let slot = if value.is_null() {
            Slot::Null
        } else {
            match value.coerce_to(element_type) {
                Some(coerced) => Slot::Primitive(coerced),
                None => {
                    debug!("{} does not fit a {} element", value, element_type.name());
                    return false;
                }
            }
        };
        object.heap().set_element(id, index as usize, slot)
    }
}
