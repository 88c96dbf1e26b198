//! Interpreter values
//!
//! What the IL interpreter holds on its evaluation stack once a debuggee
//! element has been read into the debugger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::debuggee::PrimitiveType;

/// Runtime value with strict element typing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    // Signed integers
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),

    // Unsigned integers
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),

    // Floating point
    F32(f32),
    F64(f64),

    // Other primitives
    Bool(bool),
    Char(char),
    String(String),

    // Object living in the debuggee (address 0 is a null reference)
    Ref {
        address: u64,
        type_name: String,
    },
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &str {
        match self {
            Value::Ref { type_name, .. } => type_name.as_str(),
            other => other
                .primitive_type()
                .map(|ty| ty.name())
                .unwrap_or("object"),
        }
    }

    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        let ty = match self {
            Value::I8(_) => PrimitiveType::I8,
            Value::I16(_) => PrimitiveType::I16,
            Value::I32(_) => PrimitiveType::I32,
            Value::I64(_) => PrimitiveType::I64,
            Value::U8(_) => PrimitiveType::U8,
            Value::U16(_) => PrimitiveType::U16,
            Value::U32(_) => PrimitiveType::U32,
            Value::U64(_) => PrimitiveType::U64,
            Value::F32(_) => PrimitiveType::F32,
            Value::F64(_) => PrimitiveType::F64,
            Value::Bool(_) => PrimitiveType::Bool,
            Value::Char(_) => PrimitiveType::Char,
            Value::String(_) => PrimitiveType::String,
            Value::Ref { .. } => return None,
        };
        Some(ty)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Ref { address: 0, .. })
    }

    /// Convert to i128 if integer
    pub fn to_i128(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(*v as i128),
            Value::I16(v) => Some(*v as i128),
            Value::I32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::U8(v) => Some(*v as i128),
            Value::U16(v) => Some(*v as i128),
            Value::U32(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Convert to f64 if numeric
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            other => other.to_i128().map(|v| v as f64),
        }
    }

    /// Convert this value to the given element type
    ///
    /// Integers must fit the target range; floats only widen from integers or
    /// the other float width. Returns `None` when the value cannot be stored
    /// in an element of type `ty`.
    pub fn coerce_to(&self, ty: PrimitiveType) -> Option<Value> {
        if self.primitive_type() == Some(ty) {
            return Some(self.clone());
        }
        match ty {
            PrimitiveType::I8 => self.to_i128().and_then(|v| i8::try_from(v).ok()).map(Value::I8),
            PrimitiveType::I16 => self.to_i128().and_then(|v| i16::try_from(v).ok()).map(Value::I16),
            PrimitiveType::I32 => self.to_i128().and_then(|v| i32::try_from(v).ok()).map(Value::I32),
            PrimitiveType::I64 => self.to_i128().and_then(|v| i64::try_from(v).ok()).map(Value::I64),
            PrimitiveType::U8 => self.to_i128().and_then(|v| u8::try_from(v).ok()).map(Value::U8),
            PrimitiveType::U16 => self.to_i128().and_then(|v| u16::try_from(v).ok()).map(Value::U16),
            PrimitiveType::U32 => self.to_i128().and_then(|v| u32::try_from(v).ok()).map(Value::U32),
            PrimitiveType::U64 => self.to_i128().and_then(|v| u64::try_from(v).ok()).map(Value::U64),
            // a finite double outside the f32 range must not turn into infinity
            PrimitiveType::F32 => self.to_f64().and_then(|v| {
                let narrowed = v as f32;
                (narrowed.is_finite() || !v.is_finite()).then_some(Value::F32(narrowed))
            }),
            PrimitiveType::F64 => self.to_f64().map(Value::F64),
            PrimitiveType::Char => match self {
                Value::String(s) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(Value::Char(c)),
                        _ => None,
                    }
                }
                _ => None,
            },
            PrimitiveType::Bool | PrimitiveType::String => None,
        }
    }

    /// Build a value of type `ty` from its JSON form
    pub fn from_json(json: &serde_json::Value, ty: PrimitiveType) -> Option<Value> {
        let raw = match json {
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Value::I64(v)
                } else if let Some(v) = n.as_u64() {
                    Value::U64(v)
                } else {
                    Value::F64(n.as_f64()?)
                }
            }
            _ => return None,
        };
        raw.coerce_to(ty)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Ref { address: 0, .. } => write!(f, "null"),
            Value::Ref { type_name, address } => write!(f, "{{{}}} @ 0x{:x}", type_name, address),
        }
    }
}
