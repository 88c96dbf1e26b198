//! Debuggee value model
//!
//! Handles to data living in the target process, as seen by the evaluator.

pub mod snapshot;
pub mod types;

pub use snapshot::{ArraySnapshot, HandleStats, Heap, ObjectId, Slot, SnapshotError, SnapshotValue};
pub use types::{DbgType, PrimitiveType};

/// Handle to a value in the debuggee
///
/// Handles are affine: whoever acquired one must hand it back through
/// [`DebuggeeValue::release`] exactly once. Borrowing a handle never
/// transfers that obligation.
pub trait DebuggeeValue: Sized {
    /// Declared type of the value
    fn value_type(&self) -> &DbgType;

    /// The value is a reference that must be dereferenced to reach the object
    fn is_reference(&self) -> bool;

    fn is_null_reference(&self) -> bool;

    fn is_array(&self) -> bool {
        self.value_type().is_array()
    }

    /// Follow a reference to the object it points to
    ///
    /// The returned handle is a new acquisition. Returns `None` when the value
    /// is not a reference or the debuggee can no longer resolve it.
    fn dereference(&self) -> Option<Self>;

    /// Read one element of an array object
    fn array_element_at(&self, index: u32) -> Option<Self>;

    /// Number of elements of an array object
    fn array_count(&self) -> Option<u32>;

    /// Give the handle back to the debuggee
    fn release(self);
}
