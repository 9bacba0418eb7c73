use std::collections::HashMap;
use std::fmt;

use crate::runtime::error::RuntimeError;

/// Identity of a runtime object. Disjoint from AST node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Host-side payload of the primitive modules. Which variant an instance may
/// carry is determined by its module: `wollok.lang.Number` wraps a number,
/// `wollok.lang.String` a string, `wollok.lang.List`/`Set` a collection of
/// object ids. Booleans have no payload; they exist only as the two
/// sentinels.
#[derive(Debug, Clone, PartialEq)]
pub enum InnerValue {
    Number(f64),
    String(String),
    Collection(Vec<ObjectId>),
}

impl InnerValue {
    fn describe(&self) -> &'static str {
        match self {
            InnerValue::Number(_) => "a number",
            InnerValue::String(_) => "a string",
            InnerValue::Collection(_) => "a collection",
        }
    }
}

/// A language-level object: identity, module, named attributes referring to
/// other objects by id, and an optional primitive payload.
#[derive(Debug, Clone)]
pub struct RuntimeObject {
    id: ObjectId,
    module_fqn: String,
    attributes: HashMap<String, ObjectId>,
    inner: Option<InnerValue>,
}

impl RuntimeObject {
    pub(crate) fn new(id: ObjectId, module_fqn: String, inner: Option<InnerValue>) -> Self {
        Self {
            id,
            module_fqn,
            attributes: HashMap::new(),
            inner,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn module_fqn(&self) -> &str {
        &self.module_fqn
    }

    pub fn inner(&self) -> Option<&InnerValue> {
        self.inner.as_ref()
    }

    pub fn get(&self, attribute: &str) -> Option<ObjectId> {
        self.attributes.get(attribute).copied()
    }

    pub fn set(&mut self, attribute: &str, value: ObjectId) {
        self.attributes.insert(attribute.to_string(), value);
    }

    pub fn assert_is_number(&self) -> Result<f64, RuntimeError> {
        match &self.inner {
            Some(InnerValue::Number(value)) => Ok(*value),
            other => Err(self.mismatch("a number", other)),
        }
    }

    pub fn assert_is_string(&self) -> Result<&str, RuntimeError> {
        match &self.inner {
            Some(InnerValue::String(value)) => Ok(value),
            other => Err(self.mismatch("a string", other)),
        }
    }

    pub fn assert_is_collection(&self) -> Result<&[ObjectId], RuntimeError> {
        match &self.inner {
            Some(InnerValue::Collection(elements)) => Ok(elements),
            other => Err(self.mismatch("a collection", other)),
        }
    }

    pub fn assert_is_collection_mut(&mut self) -> Result<&mut Vec<ObjectId>, RuntimeError> {
        match &mut self.inner {
            Some(InnerValue::Collection(elements)) => Ok(elements),
            other => {
                let found = match other {
                    Some(inner) => inner.describe(),
                    None => "no inner value",
                };
                Err(RuntimeError::InnerValueMismatch {
                    expected: "a collection",
                    found,
                    module: self.module_fqn.clone(),
                })
            }
        }
    }

    fn mismatch(&self, expected: &'static str, found: &Option<InnerValue>) -> RuntimeError {
        RuntimeError::InnerValueMismatch {
            expected,
            found: match found {
                Some(inner) => inner.describe(),
                None => "no inner value",
            },
            module: self.module_fqn.clone(),
        }
    }
}
