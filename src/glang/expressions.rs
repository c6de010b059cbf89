//! Commands evaluated inside `!@ ... @!` spans.

use super::command::{Command, CommandChain, CommandSyntax, Context};
use super::parsers::{
    FirstOf, IdentifierParser, InfixParser, PostfixParser, PrefixParser, StringLiteralParser,
    VerbatimParser,
};
use super::value::{CommandParameter, Value, VariableKind};
use crate::error::{GenError, GenResult};

fn boxed<C: Command + 'static>(command: C) -> Box<dyn Command> {
    Box::new(command)
}

/// `int x`, `bool flag = true`, `string name = TableName`
#[derive(Debug, Clone, PartialEq)]
pub struct Declare {
    kind: VariableKind,
    name: String,
    init: Option<CommandParameter>,
}

impl Declare {
    fn syntax(kind: VariableKind) -> CommandSyntax<Box<dyn Command>> {
        let token = match kind {
            VariableKind::Int => "int ",
            VariableKind::Bool => "bool ",
            VariableKind::String => "string ",
        };
        let body = FirstOf::new()
            .or(IdentifierParser)
            .or(InfixParser::new("=", FirstOf::values()));

        CommandSyntax::new("declare", PrefixParser::new(token, body), move |params| {
            Ok(Self::assign_parameters(kind, params).map(boxed))
        })
    }

    fn assign_parameters(kind: VariableKind, parameters: Vec<CommandParameter>) -> Option<Self> {
        let mut params = parameters.into_iter();
        let name = params.next()?.var_name()?.to_string();
        let init = params.next();
        if params.next().is_some() {
            return None;
        }
        Some(Self { kind, name, init })
    }
}

impl Command for Declare {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let value = match &self.init {
            Some(init) => init.resolve(ctx.store)?,
            None => self.kind.zero(),
        };
        ctx.store.set_variable(&self.name, self.kind, value)?;
        Ok(String::new())
    }
}

/// `x = 5`, `x = other`. The target must already exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    name: String,
    value: CommandParameter,
}

impl Assign {
    fn syntax() -> CommandSyntax<Box<dyn Command>> {
        CommandSyntax::new(
            "assign",
            InfixParser::new("=", FirstOf::values()),
            |params| Ok(Self::assign_parameters(params).map(boxed)),
        )
    }

    fn assign_parameters(parameters: Vec<CommandParameter>) -> Option<Self> {
        match <[CommandParameter; 2]>::try_from(parameters) {
            Ok([CommandParameter::VarRef(name), value]) => Some(Self { name, value }),
            _ => None,
        }
    }
}

impl Command for Assign {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let value = self.value.resolve(ctx.store)?;
        ctx.store.assign_variable(&self.name, value)?;
        Ok(String::new())
    }
}

/// `i++` / `i--`
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    name: String,
    delta: i64,
}

impl Step {
    fn syntax(token: &'static str, delta: i64) -> CommandSyntax<Box<dyn Command>> {
        CommandSyntax::new(
            "step",
            PostfixParser::new(token, IdentifierParser),
            move |params| {
                Ok(params
                    .first()
                    .and_then(CommandParameter::var_name)
                    .map(|name| {
                        boxed(Self {
                            name: name.to_string(),
                            delta,
                        })
                    }))
            },
        )
    }
}

impl Command for Step {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let current = match ctx.store.get_variable_value(&self.name) {
            Some(Value::Int(val)) => *val,
            Some(other) => {
                return Err(GenError::KindMismatch {
                    name: self.name.clone(),
                    expected: other.type_name(),
                    found: "int",
                })
            }
            None => return Err(GenError::UnknownVariable(self.name.clone())),
        };
        let next = current
            .checked_add(self.delta)
            .ok_or_else(|| GenError::Overflow(self.name.clone()))?;
        ctx.store.assign_variable(&self.name, Value::Int(next))?;
        Ok(String::new())
    }
}

/// A literal, rendered as written. Quoted strings lose their quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    text: String,
}

impl Echo {
    fn syntax() -> CommandSyntax<Box<dyn Command>> {
        let parser = FirstOf::new()
            .or(StringLiteralParser)
            .or(VerbatimParser::new(FirstOf::literals()));

        CommandSyntax::new("literal", parser, |params| match params.first() {
            Some(CommandParameter::Str(text)) => Ok(Some(boxed(Self { text: text.clone() }))),
            _ => Ok(None),
        })
    }
}

impl Command for Echo {
    fn execute(&self, _ctx: &mut Context<'_>) -> GenResult<String> {
        Ok(self.text.clone())
    }
}

/// A bare variable name, rendered as its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Read {
    name: String,
}

impl Read {
    fn syntax() -> CommandSyntax<Box<dyn Command>> {
        CommandSyntax::new("read", IdentifierParser, |params| {
            Ok(params
                .first()
                .and_then(CommandParameter::var_name)
                .map(|name| {
                    boxed(Self {
                        name: name.to_string(),
                    })
                }))
        })
    }
}

impl Command for Read {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        ctx.store
            .get_variable_value(&self.name)
            .map(ToString::to_string)
            .ok_or_else(|| GenError::UnknownVariable(self.name.clone()))
    }
}

pub fn expression_chain() -> CommandChain<Box<dyn Command>> {
    CommandChain::new()
        .with(Declare::syntax(VariableKind::Int))
        .with(Declare::syntax(VariableKind::Bool))
        .with(Declare::syntax(VariableKind::String))
        .with(Assign::syntax())
        .with(Step::syntax("++", 1))
        .with(Step::syntax("--", -1))
        .with(Echo::syntax())
        .with(Read::syntax())
}
