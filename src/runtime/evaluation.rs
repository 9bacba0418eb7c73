use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::environment::Environment;
use crate::runtime::error::RuntimeError;
use crate::runtime::fqn;
use crate::runtime::object::{InnerValue, ObjectId, RuntimeObject};

/// Seam to the external evaluation loop.
///
/// `send` must drive the message to completion synchronously and leave
/// exactly one result on the current frame's operand stack. Natives re-enter
/// the loop through this trait; re-entrance is permitted, one outstanding
/// send at a time.
pub trait Interpreter {
    fn send(
        &self,
        evaluation: &mut Evaluation,
        selector: &str,
        receiver: ObjectId,
        args: &[ObjectId],
    ) -> Result<(), RuntimeError>;
}

/// One activation record. Returning a value means pushing onto its operand
/// stack; returning nothing means pushing the void sentinel.
#[derive(Debug, Default)]
pub struct Frame {
    operands: Vec<ObjectId>,
}

impl Frame {
    pub fn push(&mut self, id: ObjectId) {
        self.operands.push(id);
    }

    pub fn pop(&mut self) -> Option<ObjectId> {
        self.operands.pop()
    }

    pub fn depth(&self) -> usize {
        self.operands.len()
    }
}

/// All mutable state of one evaluation: the instance table, the singleton
/// registry, the frame stack, and the sentinels. Sentinels are created at
/// startup and are the sole instances of their types; they belong to this
/// evaluation, so separate evaluations never share object ids.
pub struct Evaluation {
    environment: Rc<Environment>,
    instances: HashMap<ObjectId, RuntimeObject>,
    singletons: HashMap<String, ObjectId>,
    frames: Vec<Frame>,
    interpreter: Option<Rc<dyn Interpreter>>,
    next_id: u64,
    true_id: ObjectId,
    false_id: ObjectId,
    null_id: ObjectId,
    void_id: ObjectId,
}

impl Evaluation {
    pub fn new(environment: Rc<Environment>) -> Self {
        let placeholder = ObjectId::new(0);
        let mut evaluation = Self {
            environment,
            instances: HashMap::new(),
            singletons: HashMap::new(),
            frames: vec![Frame::default()],
            interpreter: None,
            next_id: 0,
            true_id: placeholder,
            false_id: placeholder,
            null_id: placeholder,
            void_id: placeholder,
        };
        evaluation.true_id = evaluation.create_instance(fqn::BOOLEAN, None);
        evaluation.false_id = evaluation.create_instance(fqn::BOOLEAN, None);
        evaluation.null_id = evaluation.create_instance(fqn::OBJECT, None);
        evaluation.void_id = evaluation.create_instance(fqn::OBJECT, None);
        evaluation
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_interpreter(&mut self, interpreter: Rc<dyn Interpreter>) {
        self.interpreter = Some(interpreter);
    }

    /// Allocate a fresh instance and register it in the instance table.
    pub fn create_instance(&mut self, module_fqn: &str, inner: Option<InnerValue>) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        self.instances
            .insert(id, RuntimeObject::new(id, module_fqn.to_string(), inner));
        id
    }

    /// Allocate an instance and register it as the singleton of its module.
    pub fn create_singleton(&mut self, module_fqn: &str) -> ObjectId {
        let id = self.create_instance(module_fqn, None);
        self.singletons.insert(module_fqn.to_string(), id);
        id
    }

    pub fn register_singleton(&mut self, module_fqn: &str, id: ObjectId) {
        self.singletons.insert(module_fqn.to_string(), id);
    }

    pub fn singleton(&self, module_fqn: &str) -> Result<ObjectId, RuntimeError> {
        self.singletons
            .get(module_fqn)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownSingleton {
                fqn: module_fqn.to_string(),
            })
    }

    pub fn instance(&self, id: ObjectId) -> Result<&RuntimeObject, RuntimeError> {
        self.instances
            .get(&id)
            .ok_or(RuntimeError::UnknownInstance(id))
    }

    pub fn instance_mut(&mut self, id: ObjectId) -> Result<&mut RuntimeObject, RuntimeError> {
        self.instances
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownInstance(id))
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) -> Result<Frame, RuntimeError> {
        if self.frames.len() == 1 {
            return Err(RuntimeError::BaseFramePop);
        }
        Ok(self.frames.pop().expect("frame count checked above"))
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("at least the base frame")
    }

    pub fn push_operand(&mut self, id: ObjectId) {
        self.current_frame_mut().push(id);
    }

    pub fn pop_operand(&mut self) -> Result<ObjectId, RuntimeError> {
        self.current_frame_mut()
            .pop()
            .ok_or(RuntimeError::OperandStackUnderflow)
    }

    /// Depth of the current frame's operand stack.
    pub fn operand_depth(&self) -> usize {
        self.frames.last().expect("at least the base frame").depth()
    }

    /// Synchronously drive a message send through the installed interpreter,
    /// leaving its result on the current operand stack.
    pub fn send_message(
        &mut self,
        selector: &str,
        receiver: ObjectId,
        args: &[ObjectId],
    ) -> Result<(), RuntimeError> {
        let interpreter = self.interpreter.clone().ok_or(RuntimeError::NoInterpreter)?;
        interpreter.send(self, selector, receiver, args)
    }

    pub fn true_id(&self) -> ObjectId {
        self.true_id
    }

    pub fn false_id(&self) -> ObjectId {
        self.false_id
    }

    pub fn null_id(&self) -> ObjectId {
        self.null_id
    }

    pub fn void_id(&self) -> ObjectId {
        self.void_id
    }

    pub fn boolean(&self, value: bool) -> ObjectId {
        if value { self.true_id } else { self.false_id }
    }
}
