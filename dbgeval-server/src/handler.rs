//! Request handler for dbgeval-server

use std::collections::HashMap;
use std::rc::Rc;

use dbgeval_core::debuggee::{ArraySnapshot, DbgType, DebuggeeValue, Heap};
use dbgeval_core::eval::{array_index, ArrayIlValue, EvalError, SnapshotRuntime, Value};
use dbgeval_core::{Request, Response};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

type ArrayValue = ArrayIlValue<SnapshotRuntime>;

/// Arrays loaded by one `initialize`
struct Session {
    heap: Heap,
    runtime: Rc<SnapshotRuntime>,
    arrays: HashMap<String, ArrayValue>,
}

impl Session {
    fn new() -> Self {
        Self {
            heap: Heap::new(),
            runtime: Rc::new(SnapshotRuntime::new()),
            arrays: HashMap::new(),
        }
    }

    fn load(&mut self, snapshot: &ArraySnapshot, default_by_reference: bool) -> Result<(), EvalError> {
        let id = self.heap.load(snapshot)?;
        let value = if snapshot.by_reference.unwrap_or(default_by_reference) {
            self.heap.reference(id)
        } else {
            self.heap.object(id)
        };
        debug!("Loaded '{}' as {}", snapshot.name, value.value_type());

        let array = ArrayIlValue::new(Rc::clone(&self.runtime), value);
        if let Some(previous) = self.arrays.insert(snapshot.name.clone(), array) {
            warn!("Array '{}' loaded twice; keeping the last one", snapshot.name);
            previous.into_value().release();
        }
        Ok(())
    }

    fn array(&self, name: &str) -> Result<&ArrayValue, EvalError> {
        self.arrays
            .get(name)
            .ok_or_else(|| EvalError::unknown_array(name))
    }

    /// Give every handle back to the heap
    fn close(self) {
        for (_, array) in self.arrays {
            array.into_value().release();
        }
        self.runtime.clear_recorded();
        let stats = self.heap.stats();
        if stats.live() != 0 {
            warn!("{} debuggee handles still live at session close", stats.live());
        }
    }
}

fn element_type(array: &ArrayValue) -> DbgType {
    array
        .value_type()
        .without_by_ref()
        .element_type()
        .cloned()
        .unwrap_or_else(|| DbgType::Class("object".to_string()))
}

pub struct Handler {
    config: ServerConfig,
    session: Option<Session>,
}

impl Handler {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        let result = match request {
            Request::Initialize { arrays } => {
                self.handle_initialize(arrays)
            }
            Request::Length { name } => {
                self.handle_length(name)
            }
            Request::Element { name, index } => {
                self.handle_element(name, *index)
            }
            Request::Store { name, index, value } => {
                self.handle_store(name, *index, value)
            }
            Request::Stats => {
                self.session().map(|s| Response::Stats { stats: s.heap.stats() })
            }
            Request::Shutdown => {
                info!("Shutdown requested");
                if let Some(session) = self.session.take() {
                    session.close();
                }
                Ok(Response::success())
            }
        };
        result.unwrap_or_else(|e| Response::error(e.to_string()))
    }

    fn session(&self) -> Result<&Session, EvalError> {
        self.session.as_ref().ok_or(EvalError::NotInitialized)
    }

    fn handle_initialize(&mut self, arrays: &[ArraySnapshot]) -> Result<Response, EvalError> {
        info!("Initializing with {} arrays", arrays.len());

        if let Some(previous) = self.session.take() {
            previous.close();
        }

        let mut session = Session::new();
        for snapshot in arrays {
            if let Err(e) = session.load(snapshot, self.config.by_reference) {
                warn!("Failed to load '{}': {}", snapshot.name, e);
                session.close();
                return Err(e);
            }
        }

        self.session = Some(session);
        Ok(Response::success())
    }

    fn handle_length(&self, name: &str) -> Result<Response, EvalError> {
        debug!("Length request: name={}", name);
        let array = self.session()?.array(name)?;
        Ok(Response::length(array.sz_array_length()))
    }

    fn handle_element(&self, name: &str, index: i64) -> Result<Response, EvalError> {
        debug!("Element request: name={}, index={}", name, index);
        let array = self.session()?.array(name)?;

        match array.load_sz_array_element(index, &element_type(array)) {
            Some(value) => Ok(Response::eval_result(value.to_string(), value.type_name())),
            None if !array.is_sz_array() => {
                Err(EvalError::unsupported_shape(name, array.value_type().to_string()))
            }
            None => Err(EvalError::element_not_found(name, index)),
        }
    }

    fn handle_store(&self, name: &str, index: i64, json: &serde_json::Value) -> Result<Response, EvalError> {
        debug!("Store request: name={}, index={}, value={}", name, index, json);
        let array = self.session()?.array(name)?;

        let element_type = element_type(array);
        let Some(primitive) = element_type.primitive() else {
            return Err(EvalError::unsupported_shape(name, array.value_type().to_string()));
        };
        let value = Value::from_json(json, primitive)
            .ok_or_else(|| EvalError::type_mismatch(primitive.name(), json.to_string()))?;

        // report what the debuggee did, not just whether the store was attempted
        let accepted = match array_index(index) {
            Some(index) if array.is_sz_array() => array.write_array_element(index, &value),
            _ => false,
        };
        Ok(Response::Store { accepted })
    }
}
