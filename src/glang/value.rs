use std::fmt;
use std::str::FromStr;

use crate::error::{GenError, GenResult};
use crate::glang::scope::VariableStore;

/// Kind of a variable slot. Fixed when the slot is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Int,
    String,
    Bool,
}

impl VariableKind {
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Int => "int",
            VariableKind::String => "string",
            VariableKind::Bool => "bool",
        }
    }

    pub fn zero(self) -> Value {
        match self {
            VariableKind::Int => Value::Int(0),
            VariableKind::String => Value::Str(String::new()),
            VariableKind::Bool => Value::Bool(false),
        }
    }
}

impl FromStr for VariableKind {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" => Ok(VariableKind::Int),
            "string" => Ok(VariableKind::String),
            "bool" => Ok(VariableKind::Bool),
            _ => Err(GenError::UnknownKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// The slot kind able to hold this value. Doubles have none.
    pub fn kind(&self) -> Option<VariableKind> {
        match self {
            Value::Int(_) => Some(VariableKind::Int),
            Value::Bool(_) => Some(VariableKind::Bool),
            Value::Str(_) => Some(VariableKind::String),
            Value::Double(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(val) => write!(f, "{}", val),
            Value::Double(val) => write!(f, "{}", val),
            Value::Bool(val) => write!(f, "{}", val),
            Value::Str(val) => f.write_str(val),
        }
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::Int(val)
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::Str(val.to_string())
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::Str(val)
    }
}

/* ==================================== */

/// A parsed command argument: either a literal or the name of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandParameter {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    VarRef(String),
}

impl CommandParameter {
    /// Literal value, or for a variable reference the name itself (not
    /// dereferenced).
    pub fn result(&self) -> Value {
        match self {
            CommandParameter::Int(val) => Value::Int(*val),
            CommandParameter::Double(val) => Value::Double(*val),
            CommandParameter::Bool(val) => Value::Bool(*val),
            CommandParameter::Str(val) => Value::Str(val.clone()),
            CommandParameter::VarRef(name) => Value::Str(name.clone()),
        }
    }

    pub fn var_name(&self) -> Option<&str> {
        match self {
            CommandParameter::VarRef(name) => Some(name),
            _ => None,
        }
    }

    /// Like `result`, but looks variable references up in `store`.
    pub fn resolve(&self, store: &VariableStore) -> GenResult<Value> {
        match self {
            CommandParameter::VarRef(name) => store
                .get_variable_value(name)
                .cloned()
                .ok_or_else(|| GenError::UnknownVariable(name.clone())),
            _ => Ok(self.result()),
        }
    }
}
