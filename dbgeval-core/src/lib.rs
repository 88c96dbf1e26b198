//! dbgeval Core Library
//!
//! Array support for IL evaluation against a live debuggee:
//! - Debuggee value handles and array type shapes
//! - Scoped dereference of array references
//! - Interpreter-facing array values with memoized length
//! - Snapshot debuggee and JSON-RPC protocol for the server

pub mod debuggee;
pub mod eval;
pub mod protocol;

pub use debuggee::{DbgType, DebuggeeValue, Heap, PrimitiveType};
pub use eval::{ArrayIlValue, DebuggerRuntime, EvalError, SnapshotRuntime, Value};
pub use protocol::{Request, Response};
