use std::collections::HashMap;

use tracing::trace;

use super::value::{Value, VariableKind};
use crate::error::{GenError, GenResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    kind: VariableKind,
    value: Value,
}

impl Variable {
    fn new(name: &str, kind: VariableKind, value: Value) -> GenResult<Self> {
        check_kind(name, kind, &value)?;
        Ok(Self {
            name: name.to_string(),
            kind,
            value,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn store(&mut self, value: Value) -> GenResult<()> {
        check_kind(&self.name, self.kind, &value)?;
        self.value = value;
        Ok(())
    }
}

fn check_kind(name: &str, kind: VariableKind, value: &Value) -> GenResult<()> {
    if value.kind() == Some(kind) {
        Ok(())
    } else {
        Err(GenError::KindMismatch {
            name: name.to_string(),
            expected: kind.name(),
            found: value.type_name(),
        })
    }
}

#[derive(Debug, Default)]
struct Frame {
    entries: HashMap<String, Variable>,
}

impl Frame {
    fn set(&mut self, name: &str, kind: VariableKind, value: Value) -> GenResult<()> {
        match self.entries.get_mut(name) {
            // The kind of an existing slot is never re-derived
            Some(var) => var.store(value),
            None => {
                let var = Variable::new(name, kind, value)?;
                self.entries.insert(name.to_string(), var);
                Ok(())
            }
        }
    }
}

/// Global frame plus a stack of local frames.
///
/// `frames[0]` is the global frame and is never popped. Before any push
/// the current frame is the global frame itself.
///
/// Scoped reads and kind-less writes search the stack from the innermost
/// frame outwards, ending at the global frame. Declarations always land
/// in the innermost frame. Global operations only ever see `frames[0]`.
#[derive(Debug)]
pub struct VariableStore {
    frames: Vec<Frame>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Number of frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn create_stack_frame(&mut self) {
        self.frames.push(Frame::default());
        trace!(depth = self.frames.len(), "pushed stack frame");
    }

    pub fn destroy_stack_frame(&mut self) -> GenResult<()> {
        if self.frames.len() <= 1 {
            return Err(GenError::ScopeUnderflow);
        }
        self.frames.pop();
        trace!(depth = self.frames.len(), "popped stack frame");
        Ok(())
    }

    fn current(&mut self) -> &mut Frame {
        // frames is never empty
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn global(&mut self) -> &mut Frame {
        &mut self.frames[0]
    }

    /// Create `name` in the current frame, or overwrite its value if the
    /// current frame already has it.
    pub fn set_variable(&mut self, name: &str, kind: VariableKind, value: Value) -> GenResult<()> {
        self.current().set(name, kind, value)
    }

    pub fn set_global_variable(
        &mut self,
        name: &str,
        kind: VariableKind,
        value: Value,
    ) -> GenResult<()> {
        self.global().set(name, kind, value)
    }

    /// Overwrite an existing variable. Never creates one.
    pub fn assign_variable(&mut self, name: &str, value: Value) -> GenResult<()> {
        let var = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.entries.get_mut(name))
            .ok_or_else(|| GenError::UnknownVariable(name.to_string()))?;
        var.store(value)
    }

    pub fn assign_global_variable(&mut self, name: &str, value: Value) -> GenResult<()> {
        self.global()
            .entries
            .get_mut(name)
            .ok_or_else(|| GenError::UnknownVariable(name.to_string()))?
            .store(value)
    }

    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.entries.get(name))
    }

    pub fn get_variable_value(&self, name: &str) -> Option<&Value> {
        self.get_variable(name).map(Variable::value)
    }

    pub fn get_global_variable(&self, name: &str) -> Option<&Variable> {
        self.frames[0].entries.get(name)
    }

    pub fn get_global_value(&self, name: &str) -> Option<&Value> {
        self.get_global_variable(name).map(Variable::value)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.get_variable(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_locals_do_not_leak_after_pop() -> GenResult<()> {
        let mut store = VariableStore::new();
        store.create_stack_frame();
        store.set_variable("z", "int".parse()?, Value::Int(1))?;
        assert_eq!(store.get_variable_value("z"), Some(&Value::Int(1)));
        store.destroy_stack_frame()?;

        assert_eq!(store.get_variable_value("z"), None);
        assert!(!store.has_variable("z"));
        Ok(())
    }

    #[test]
    fn assign_requires_existing_variable() {
        let mut store = VariableStore::new();
        let err = store.assign_variable("y", Value::Int(5)).unwrap_err();
        assert!(matches!(err, GenError::UnknownVariable(name) if name == "y"));

        let err = store.assign_global_variable("y", Value::Int(5)).unwrap_err();
        assert!(matches!(err, GenError::UnknownVariable(_)));
    }

    #[test]
    fn global_frame_cannot_be_destroyed() {
        let mut store = VariableStore::new();
        assert!(matches!(
            store.destroy_stack_frame(),
            Err(GenError::ScopeUnderflow)
        ));

        store.create_stack_frame();
        assert!(store.destroy_stack_frame().is_ok());
        assert!(store.destroy_stack_frame().is_err());
        assert_eq!(store.depth(), 1);
    }

    #[test]
    fn kind_is_fixed_at_creation() -> GenResult<()> {
        let mut store = VariableStore::new();
        store.set_variable("count", VariableKind::Int, Value::Int(0))?;
        store.set_variable("count", VariableKind::Int, Value::Int(4))?;
        assert_eq!(store.get_variable_value("count"), Some(&Value::Int(4)));

        let err = store
            .set_variable("count", VariableKind::String, Value::from("four"))
            .unwrap_err();
        assert!(matches!(err, GenError::KindMismatch { expected: "int", .. }));

        let err = store.assign_variable("count", Value::Bool(true)).unwrap_err();
        assert!(matches!(err, GenError::KindMismatch { found: "bool", .. }));
        assert_eq!(store.get_variable("count").map(Variable::kind), Some(VariableKind::Int));
        Ok(())
    }

    #[test]
    fn scoped_lookup_falls_back_to_outer_frames() -> GenResult<()> {
        let mut store = VariableStore::new();
        store.set_global_variable("TableName", VariableKind::String, "Orders".into())?;
        store.create_stack_frame();
        store.set_variable("ColumnName", VariableKind::String, "Id".into())?;
        store.create_stack_frame();

        assert!(store.has_variable("TableName"));
        assert_eq!(store.get_variable_value("ColumnName"), Some(&Value::from("Id")));

        // writes reach the frame that owns the variable
        store.assign_variable("TableName", "Customers".into())?;
        assert_eq!(store.get_global_value("TableName"), Some(&Value::from("Customers")));

        // global reads never see locals
        assert_eq!(store.get_global_value("ColumnName"), None);
        Ok(())
    }

    #[test]
    fn inner_declaration_shadows_outer() -> GenResult<()> {
        let mut store = VariableStore::new();
        store.set_variable("i", VariableKind::Int, Value::Int(1))?;
        store.create_stack_frame();
        store.set_variable("i", VariableKind::Int, Value::Int(2))?;
        assert_eq!(store.get_variable_value("i"), Some(&Value::Int(2)));
        assert_eq!(store.get_global_value("i"), Some(&Value::Int(1)));
        store.destroy_stack_frame()?;
        assert_eq!(store.get_variable_value("i"), Some(&Value::Int(1)));
        Ok(())
    }
}
