//! Template-level commands, one per source line.

use std::rc::Rc;

use tracing::debug;

use super::command::{Command, CommandChain, CommandSyntax, Context};
use super::parsers::{
    is_identifier, FallbackParser, IdentifierParser, NullParser, SurroundParser, TextParser,
};
use super::template::TemplateLine;
use super::value::{CommandParameter, Value, VariableKind};
use crate::error::{GenError, GenResult};
use crate::items::ColumnDefinition;

#[derive(Debug)]
pub enum Statement {
    Command(Box<dyn Command>),
    Open(Block),
    Close(BlockKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    ForEach,
    If,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::ForEach => "foreach",
            BlockKind::If => "if",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("foreach") {
            Some(BlockKind::ForEach)
        } else if keyword.eq_ignore_ascii_case("if") {
            Some(BlockKind::If)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    ForEachColumn,
    If { name: String, negate: bool },
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::ForEachColumn => BlockKind::ForEach,
            Block::If { .. } => BlockKind::If,
        }
    }

    fn into_command(self, body: Vec<Box<dyn Command>>) -> Box<dyn Command> {
        match self {
            Block::ForEachColumn => Box::new(ForEachColumn { body }),
            Block::If { name, negate } => Box::new(If { name, negate, body }),
        }
    }
}

/* ==================================== */

#[derive(Debug)]
struct BlankLine;

impl Command for BlankLine {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        ctx.file.push_text("\n")?;
        Ok(String::new())
    }
}

#[derive(Debug)]
struct EmitLine {
    line: TemplateLine,
}

impl Command for EmitLine {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let rendered = self.line.render(ctx)?;
        ctx.file.push_text(&rendered)?;
        Ok(String::new())
    }
}

fn run_body(body: &[Box<dyn Command>], ctx: &mut Context<'_>) -> GenResult<()> {
    for command in body.iter() {
        command.execute(ctx)?;
    }
    Ok(())
}

fn bind_column(
    ctx: &mut Context<'_>,
    index: usize,
    count: usize,
    column: &ColumnDefinition,
) -> GenResult<()> {
    let store = &mut *ctx.store;
    store.set_variable("ColumnName", VariableKind::String, column.name.as_str().into())?;
    store.set_variable("ColumnType", VariableKind::String, column.data_type.as_str().into())?;
    store.set_variable("IsNullable", VariableKind::Bool, column.nullable.into())?;
    store.set_variable("IsPrimaryKey", VariableKind::Bool, column.primary_key.into())?;
    store.set_variable("ColumnIndex", VariableKind::Int, Value::Int(index as i64))?;
    store.set_variable("IsLastColumn", VariableKind::Bool, (index + 1 == count).into())?;
    Ok(())
}

/// Runs its body once per column of the current table, each time in a
/// fresh stack frame.
#[derive(Debug)]
struct ForEachColumn {
    body: Vec<Box<dyn Command>>,
}

impl Command for ForEachColumn {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let table = ctx.table;
        let count = table.columns.len();

        for (index, column) in table.columns.iter().enumerate() {
            ctx.store.create_stack_frame();
            let result =
                bind_column(ctx, index, count, column).and_then(|_| run_body(&self.body, ctx));
            ctx.store.destroy_stack_frame()?;
            result?;
        }

        Ok(String::new())
    }
}

#[derive(Debug)]
struct If {
    name: String,
    negate: bool,
    body: Vec<Box<dyn Command>>,
}

impl Command for If {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let condition = match ctx.store.get_variable_value(&self.name) {
            Some(Value::Bool(val)) => *val,
            Some(other) => {
                return Err(GenError::KindMismatch {
                    name: self.name.clone(),
                    expected: "bool",
                    found: other.type_name(),
                })
            }
            None => return Err(GenError::UnknownVariable(self.name.clone())),
        };

        if condition != self.negate {
            ctx.store.create_stack_frame();
            let result = run_body(&self.body, ctx);
            ctx.store.destroy_stack_frame()?;
            result?;
        }

        Ok(String::new())
    }
}

/// Attaches the template location to errors raised by `command`.
#[derive(Debug)]
struct Located {
    template: Rc<str>,
    line: usize,
    command: Box<dyn Command>,
}

impl Command for Located {
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        self.command
            .execute(ctx)
            .map_err(|err| err.at_line(&self.template, self.line))
    }
}

/* ==================================== */

fn first_text(params: &[CommandParameter]) -> Option<&str> {
    match params.first() {
        Some(CommandParameter::Str(text)) => Some(text),
        _ => None,
    }
}

pub fn statement_chain(expressions: Rc<CommandChain<Box<dyn Command>>>) -> CommandChain<Statement> {
    CommandChain::new()
        .with(CommandSyntax::new("blank", NullParser, |_| {
            Ok(Some(Statement::Command(Box::new(BlankLine))))
        }))
        .with(CommandSyntax::new(
            "foreach",
            SurroundParser::new("!@foreach ", "@!", IdentifierParser),
            |params| {
                let target = params.first().and_then(CommandParameter::var_name);
                Ok(target
                    .filter(|name| {
                        name.eq_ignore_ascii_case("column") || name.eq_ignore_ascii_case("columns")
                    })
                    .map(|_| Statement::Open(Block::ForEachColumn)))
            },
        ))
        .with(CommandSyntax::new(
            "if",
            SurroundParser::new("!@if ", "@!", TextParser),
            |params| {
                let Some(text) = first_text(&params) else {
                    return Ok(None);
                };
                let (negate, name) = match text.strip_prefix('!') {
                    Some(name) => (true, name.trim()),
                    None => (false, text),
                };
                Ok(is_identifier(name).then(|| {
                    Statement::Open(Block::If {
                        name: name.to_string(),
                        negate,
                    })
                }))
            },
        ))
        .with(CommandSyntax::new(
            "end",
            SurroundParser::new("!@end ", "@!", IdentifierParser),
            |params| {
                Ok(params
                    .first()
                    .and_then(CommandParameter::var_name)
                    .and_then(BlockKind::from_keyword)
                    .map(Statement::Close))
            },
        ))
        .with(CommandSyntax::new(
            "line",
            FallbackParser::new(TextParser),
            move |params| {
                let Some(text) = first_text(&params) else {
                    return Ok(None);
                };
                let line = TemplateLine::compile(text, &expressions)?;
                Ok(Some(Statement::Command(Box::new(EmitLine { line }))))
            },
        ))
}

struct OpenBlock {
    block: Block,
    line: usize,
    body: Vec<Box<dyn Command>>,
}

/// Parses every line of a template into a command list, folding block
/// bodies into their block commands.
pub fn compile_statements(
    template: &str,
    lines: &[String],
    chain: &CommandChain<Statement>,
) -> GenResult<Vec<Box<dyn Command>>> {
    let template: Rc<str> = Rc::from(template);
    let mut root: Vec<Box<dyn Command>> = vec![];
    let mut open: Vec<OpenBlock> = vec![];

    for (index, source) in lines.iter().enumerate() {
        let line = index + 1;
        let located = |command| -> Box<dyn Command> {
            Box::new(Located {
                template: template.clone(),
                line,
                command,
            })
        };

        let statement = chain
            .parse(source)
            .map_err(|err| err.at_line(&template, line))?;

        match statement {
            Statement::Command(command) => {
                let body = open.last_mut().map_or(&mut root, |block| &mut block.body);
                body.push(located(command));
            }
            Statement::Open(block) => {
                debug!(line, block = block.kind().keyword(), "opening block");
                open.push(OpenBlock {
                    block,
                    line,
                    body: vec![],
                });
            }
            Statement::Close(kind) => {
                let closed = open.pop().ok_or_else(|| {
                    GenError::UnbalancedBlock(format!("`end {}` without an open block", kind.keyword()))
                        .at_line(&template, line)
                })?;

                if closed.block.kind() != kind {
                    return Err(GenError::UnbalancedBlock(format!(
                        "`end {}` closes the `{}` block opened on line {}",
                        kind.keyword(),
                        closed.block.kind().keyword(),
                        closed.line
                    ))
                    .at_line(&template, line));
                }

                let command = closed.block.into_command(closed.body);
                let body = open.last_mut().map_or(&mut root, |block| &mut block.body);
                body.push(located(command));
            }
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(GenError::UnbalancedBlock(format!(
            "`{}` block is never closed",
            unclosed.block.kind().keyword()
        ))
        .at_line(&template, unclosed.line));
    }

    Ok(root)
}
