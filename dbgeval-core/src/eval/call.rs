//! Array method calls
//!
//! Multi-dimensional arrays expose their accessors as runtime-provided
//! methods (`Get`, `Set`, `Address`). The array adapter recognises them but
//! does not evaluate them.

use crate::debuggee::DbgType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialMethodKind {
    ArrayGet,
    ArraySet,
    ArrayAddress,
}

impl SpecialMethodKind {
    /// Classify a method by its declaring type and name
    pub fn of(declaring_type: &DbgType, name: &str) -> Option<Self> {
        if !declaring_type.is_array() {
            return None;
        }
        match name {
            "Get" => Some(SpecialMethodKind::ArrayGet),
            "Set" => Some(SpecialMethodKind::ArraySet),
            "Address" => Some(SpecialMethodKind::ArrayAddress),
            _ => None,
        }
    }
}

/// Outcome of offering a call to an interpreter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Recognised, but this value cannot evaluate it
    Unsupported(SpecialMethodKind),
    /// Not a method this value knows; use the generic call path
    NotHandled,
}
