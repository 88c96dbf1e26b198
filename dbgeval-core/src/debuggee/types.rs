//! Debuggee type descriptors
//!
//! Just enough of the target's type system to tell array shapes apart and to
//! name element types in a C#-like notation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
}

impl PrimitiveType {
    /// Resolve a type name as written by a debugger front-end
    ///
    /// Accepts the C# keyword (`int`), the runtime name (`System.Int32`,
    /// `Int32`) and the short form (`i32`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.strip_prefix("System.").unwrap_or(name);
        let ty = match name {
            "bool" | "Boolean" => PrimitiveType::Bool,
            "char" | "Char" => PrimitiveType::Char,
            "sbyte" | "SByte" | "i8" => PrimitiveType::I8,
            "byte" | "Byte" | "u8" => PrimitiveType::U8,
            "short" | "Int16" | "i16" => PrimitiveType::I16,
            "ushort" | "UInt16" | "u16" => PrimitiveType::U16,
            "int" | "Int32" | "int32" | "i32" => PrimitiveType::I32,
            "uint" | "UInt32" | "uint32" | "u32" => PrimitiveType::U32,
            "long" | "Int64" | "int64" | "i64" => PrimitiveType::I64,
            "ulong" | "UInt64" | "uint64" | "u64" => PrimitiveType::U64,
            "float" | "Single" | "f32" => PrimitiveType::F32,
            "double" | "Double" | "f64" => PrimitiveType::F64,
            "string" | "String" => PrimitiveType::String,
            _ => return None,
        };
        Some(ty)
    }

    /// C# keyword for this type
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::I8 => "sbyte",
            PrimitiveType::U8 => "byte",
            PrimitiveType::I16 => "short",
            PrimitiveType::U16 => "ushort",
            PrimitiveType::I32 => "int",
            PrimitiveType::U32 => "uint",
            PrimitiveType::I64 => "long",
            PrimitiveType::U64 => "ulong",
            PrimitiveType::F32 => "float",
            PrimitiveType::F64 => "double",
            PrimitiveType::String => "string",
        }
    }
}

/// Declared or runtime type of a debuggee value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbgType {
    Primitive(PrimitiveType),
    /// Single-dimension, zero-based array (`T[]`)
    SzArray(Box<DbgType>),
    /// Any other array shape, including rank-1 arrays with a non-zero lower
    /// bound (`T[*]`)
    MdArray { element: Box<DbgType>, rank: u32 },
    /// Managed pointer (`T&`)
    ByRef(Box<DbgType>),
    Class(String),
}

impl DbgType {
    pub fn sz_array(element: DbgType) -> Self {
        DbgType::SzArray(Box::new(element))
    }

    pub fn md_array(element: DbgType, rank: u32) -> Self {
        DbgType::MdArray {
            element: Box::new(element),
            rank,
        }
    }

    pub fn by_ref(inner: DbgType) -> Self {
        DbgType::ByRef(Box::new(inner))
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self, DbgType::ByRef(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DbgType::SzArray(_) | DbgType::MdArray { .. })
    }

    pub fn is_sz_array(&self) -> bool {
        matches!(self, DbgType::SzArray(_))
    }

    /// Element type of an array, or the target of a managed pointer
    pub fn element_type(&self) -> Option<&DbgType> {
        match self {
            DbgType::SzArray(element) | DbgType::ByRef(element) => Some(&**element),
            DbgType::MdArray { element, .. } => Some(&**element),
            _ => None,
        }
    }

    pub fn rank(&self) -> Option<u32> {
        match self {
            DbgType::SzArray(_) => Some(1),
            DbgType::MdArray { rank, .. } => Some(*rank),
            _ => None,
        }
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            DbgType::Primitive(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Strip one level of managed pointer, if any
    pub fn without_by_ref(&self) -> &DbgType {
        match self {
            DbgType::ByRef(inner) => &**inner,
            other => other,
        }
    }
}

impl fmt::Display for DbgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbgType::Primitive(ty) => write!(f, "{}", ty.name()),
            DbgType::SzArray(element) => write!(f, "{}[]", element),
            DbgType::MdArray { element, rank } if *rank <= 1 => write!(f, "{}[*]", element),
            DbgType::MdArray { element, rank } => {
                write!(f, "{}[{}]", element, ",".repeat(*rank as usize - 1))
            }
            DbgType::ByRef(inner) => write!(f, "{}&", inner),
            DbgType::Class(name) => write!(f, "{}", name),
        }
    }
}
