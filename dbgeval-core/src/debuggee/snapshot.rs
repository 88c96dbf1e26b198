//! In-process snapshot debuggee
//!
//! A heap of array objects captured from (or scripted to look like) a target
//! process. Every handle handed out is counted so callers can check that
//! dereferences and releases stay balanced.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{DbgType, PrimitiveType};
use super::DebuggeeValue;
use crate::eval::Value;

/// Base of the synthetic addresses given to heap objects
const OBJECT_BASE_ADDRESS: u64 = 0x1000;
const OBJECT_ADDRESS_STRIDE: u64 = 0x10;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Unknown element type: '{0}'")]
    UnknownElementType(String),

    #[error("Element {index} of '{array}' is not a valid {expected}: {found}")]
    ElementMismatch {
        array: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid rank {rank} for array '{array}'")]
    InvalidRank { array: String, rank: u32 },

    #[error("{len} elements do not fill a rank-{rank} array '{array}'")]
    ShapeMismatch { array: String, len: usize, rank: u32 },
}

pub type ObjectId = usize;

/// Contents of one array element
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Primitive(Value),
    Object(ObjectId),
    Null,
}

/// Array description as sent by a debugger front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySnapshot {
    pub name: String,
    pub element_type: String,
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
    /// Wrap the array in a reference handle rather than the object itself
    #[serde(default)]
    pub by_reference: Option<bool>,
    #[serde(default = "default_rank")]
    pub rank: u32,
}

fn default_rank() -> u32 {
    1
}

/// Handle accounting
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleStats {
    /// Handles created, by any means
    pub issued: usize,
    pub released: usize,
    pub dereferences: usize,
    pub element_reads: usize,
    pub length_queries: usize,
}

impl HandleStats {
    pub fn live(&self) -> usize {
        self.issued.saturating_sub(self.released)
    }
}

#[derive(Debug)]
struct HeapObject {
    ty: DbgType,
    elements: Vec<Slot>,
}

#[derive(Debug, Default)]
struct HeapState {
    objects: Vec<HeapObject>,
    stats: HandleStats,
    dereference_fails: bool,
    release_forbidden: bool,
}

/// Shared snapshot heap
#[derive(Debug, Clone, Default)]
pub struct Heap {
    state: Rc<RefCell<HeapState>>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an array object
    pub fn alloc_array(&self, ty: DbgType, elements: Vec<Slot>) -> ObjectId {
        debug_assert!(ty.is_array());
        let mut state = self.state.borrow_mut();
        state.objects.push(HeapObject { ty, elements });
        state.objects.len() - 1
    }

    /// Allocate an array described by a front-end snapshot
    pub fn load(&self, snapshot: &ArraySnapshot) -> Result<ObjectId, SnapshotError> {
        let element = PrimitiveType::from_name(&snapshot.element_type)
            .ok_or_else(|| SnapshotError::UnknownElementType(snapshot.element_type.clone()))?;

        let ty = match snapshot.rank {
            0 => {
                return Err(SnapshotError::InvalidRank {
                    array: snapshot.name.clone(),
                    rank: 0,
                })
            }
            1 => DbgType::sz_array(DbgType::Primitive(element)),
            rank if snapshot.elements.len() % rank as usize != 0 => {
                return Err(SnapshotError::ShapeMismatch {
                    array: snapshot.name.clone(),
                    len: snapshot.elements.len(),
                    rank,
                })
            }
            rank => DbgType::md_array(DbgType::Primitive(element), rank),
        };

        let elements = snapshot
            .elements
            .iter()
            .enumerate()
            .map(|(index, json)| {
                if json.is_null() {
                    return Ok(Slot::Null);
                }
                Value::from_json(json, element)
                    .map(Slot::Primitive)
                    .ok_or_else(|| SnapshotError::ElementMismatch {
                        array: snapshot.name.clone(),
                        index,
                        expected: element.name().to_string(),
                        found: json.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.alloc_array(ty, elements))
    }

    /// New reference handle to an object, typed as the object's runtime type
    pub fn reference(&self, id: ObjectId) -> SnapshotValue {
        let ty = self.object_type(id);
        self.issue(HandleKind::Reference(id), ty)
    }

    /// New reference handle with an explicit declared type (e.g. `int[]&`)
    pub fn reference_as(&self, id: ObjectId, declared: DbgType) -> SnapshotValue {
        self.issue(HandleKind::Reference(id), declared)
    }

    /// New handle to the object itself (already dereferenced)
    pub fn object(&self, id: ObjectId) -> SnapshotValue {
        let ty = self.object_type(id);
        self.issue(HandleKind::Object(id), ty)
    }

    pub fn null_reference(&self, declared: DbgType) -> SnapshotValue {
        self.issue(HandleKind::Null, declared)
    }

    pub fn stats(&self) -> HandleStats {
        self.state.borrow().stats
    }

    pub fn reset_stats(&self) {
        self.state.borrow_mut().stats = HandleStats::default();
    }

    /// Make every subsequent dereference fail, as if the target had moved on
    pub fn set_dereference_fails(&self, fails: bool) {
        self.state.borrow_mut().dereference_fails = fails;
    }

    /// Panic on any release; for checking that borrowed handles are left alone
    pub fn forbid_release(&self, forbidden: bool) {
        self.state.borrow_mut().release_forbidden = forbidden;
    }

    pub fn element(&self, id: ObjectId, index: usize) -> Option<Slot> {
        let state = self.state.borrow();
        state.objects.get(id)?.elements.get(index).cloned()
    }

    /// Overwrite one element; returns `false` when the index is out of bounds
    pub fn set_element(&self, id: ObjectId, index: usize, slot: Slot) -> bool {
        let mut state = self.state.borrow_mut();
        match state.objects.get_mut(id).and_then(|obj| obj.elements.get_mut(index)) {
            Some(target) => {
                *target = slot;
                true
            }
            None => false,
        }
    }

    /// Change an object's length behind any handle's back
    pub fn resize(&self, id: ObjectId, len: usize) {
        if let Some(obj) = self.state.borrow_mut().objects.get_mut(id) {
            obj.elements.resize(len, Slot::Null);
        }
    }

    /// Change an object's runtime type behind any handle's back
    pub fn retype(&self, id: ObjectId, ty: DbgType) {
        if let Some(obj) = self.state.borrow_mut().objects.get_mut(id) {
            obj.ty = ty;
        }
    }

    pub fn object_type(&self, id: ObjectId) -> DbgType {
        self.state
            .borrow()
            .objects
            .get(id)
            .map(|obj| obj.ty.clone())
            .unwrap_or_else(|| DbgType::Class("<invalid>".to_string()))
    }

    pub fn address_of(id: ObjectId) -> u64 {
        OBJECT_BASE_ADDRESS + id as u64 * OBJECT_ADDRESS_STRIDE
    }

    fn issue(&self, kind: HandleKind, ty: DbgType) -> SnapshotValue {
        self.state.borrow_mut().stats.issued += 1;
        SnapshotValue {
            heap: self.clone(),
            kind,
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum HandleKind {
    Reference(ObjectId),
    Object(ObjectId),
    Null,
    Scalar(Value),
}

/// Handle into a [`Heap`]
#[derive(Debug)]
pub struct SnapshotValue {
    heap: Heap,
    kind: HandleKind,
    ty: DbgType,
}

impl SnapshotValue {
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Object this handle refers to or is, if any
    pub fn object_id(&self) -> Option<ObjectId> {
        match self.kind {
            HandleKind::Reference(id) | HandleKind::Object(id) => Some(id),
            _ => None,
        }
    }

    /// Scalar payload of an element handle
    pub fn scalar(&self) -> Option<&Value> {
        match &self.kind {
            HandleKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// A second, independently released handle to the same data
    pub fn duplicate(&self) -> SnapshotValue {
        self.heap.issue(self.kind.clone(), self.ty.clone())
    }

    /// Interpreter view of the data behind this handle
    pub fn to_value(&self) -> Value {
        match &self.kind {
            HandleKind::Scalar(value) => value.clone(),
            HandleKind::Reference(id) | HandleKind::Object(id) => Value::Ref {
                address: Heap::address_of(*id),
                type_name: self.ty.to_string(),
            },
            HandleKind::Null => Value::Ref {
                address: 0,
                type_name: self.ty.to_string(),
            },
        }
    }
}

impl DebuggeeValue for SnapshotValue {
    fn value_type(&self) -> &DbgType {
        &self.ty
    }

    fn is_reference(&self) -> bool {
        matches!(self.kind, HandleKind::Reference(_) | HandleKind::Null)
    }

    fn is_null_reference(&self) -> bool {
        self.kind == HandleKind::Null
    }

    fn dereference(&self) -> Option<Self> {
        let HandleKind::Reference(id) = self.kind else {
            return None;
        };
        {
            let mut state = self.heap.state.borrow_mut();
            if state.dereference_fails || id >= state.objects.len() {
                return None;
            }
            state.stats.dereferences += 1;
        }
        Some(self.heap.object(id))
    }

    fn array_element_at(&self, index: u32) -> Option<Self> {
        let HandleKind::Object(id) = self.kind else {
            return None;
        };
        let element_type = self.ty.element_type().cloned()?;
        let slot = {
            let mut state = self.heap.state.borrow_mut();
            state.stats.element_reads += 1;
            state.objects.get(id)?.elements.get(index as usize)?.clone()
        };
        let value = match slot {
            Slot::Primitive(value) => self.heap.issue(HandleKind::Scalar(value), element_type),
            Slot::Object(child) => self.heap.reference(child),
            Slot::Null => self.heap.null_reference(element_type),
        };
        Some(value)
    }

    fn array_count(&self) -> Option<u32> {
        let HandleKind::Object(id) = self.kind else {
            return None;
        };
        let mut state = self.heap.state.borrow_mut();
        state.stats.length_queries += 1;
        let len = state.objects.get(id)?.elements.len();
        u32::try_from(len).ok()
    }

    fn release(self) {
        let mut state = self.heap.state.borrow_mut();
        if state.release_forbidden {
            panic!("release of {} handle while releases are forbidden", self.ty);
        }
        state.stats.released += 1;
    }
}
