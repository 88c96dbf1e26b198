//! IL evaluation over debuggee values
//!
//! Interpreter-facing wrappers around arrays living in the target process.

pub mod address;
pub mod array;
pub mod call;
pub mod error;
pub mod guard;
pub mod runtime;
pub mod value;

pub use address::ArrayElementAddress;
pub use array::{array_index, ArrayIlValue, LengthCache, MAX_ARRAY_INDEX};
pub use call::{CallOutcome, SpecialMethodKind};
pub use error::EvalError;
pub use guard::ArrayObject;
pub use runtime::{DebuggerRuntime, SnapshotRuntime};
pub use value::Value;
