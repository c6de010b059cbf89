use std::fmt;

use tracing::debug;

use super::emit::CodeFile;
use super::parsers::LineParser;
use super::scope::VariableStore;
use super::value::CommandParameter;
use crate::error::{GenError, GenResult};
use crate::items::TableDefinition;

/// Everything a command may touch while it runs.
pub struct Context<'a> {
    pub store: &'a mut VariableStore,
    pub table: &'a TableDefinition,
    pub file: &'a mut CodeFile,
}

pub trait Command: fmt::Debug {
    /// Runs the command and returns the text it renders in place.
    ///
    /// Statements write to `ctx.file` themselves and render nothing;
    /// commands inside a dynamic span render their result.
    fn execute(&self, ctx: &mut Context<'_>) -> GenResult<String>;
}

type AssignFn<T> = Box<dyn Fn(Vec<CommandParameter>) -> GenResult<Option<T>>>;

/// One command type: the parser that recognises it plus the hook binding
/// parsed parameters into a command value.
pub struct CommandSyntax<T> {
    name: &'static str,
    parser: Box<dyn LineParser>,
    assign: AssignFn<T>,
}

impl<T> fmt::Debug for CommandSyntax<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSyntax")
            .field("name", &self.name)
            .field("parser", &self.parser)
            .finish()
    }
}

impl<T> CommandSyntax<T> {
    /// `assign` returning `Ok(None)` means the parameters do not fit this
    /// command, which is treated the same as the parser not matching.
    pub fn new<P, F>(name: &'static str, parser: P, assign: F) -> Self
    where
        P: LineParser + 'static,
        F: Fn(Vec<CommandParameter>) -> GenResult<Option<T>> + 'static,
    {
        Self {
            name,
            parser: Box::new(parser),
            assign: Box::new(assign),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn can_parse(&self, line: &str) -> bool {
        self.parser.can_parse(line)
    }

    pub fn parse(&self, line: &str) -> GenResult<T> {
        self.try_parse(line)?.ok_or_else(|| GenError::ParseMismatch {
            parser: self.name,
            line: line.to_string(),
        })
    }

    fn try_parse(&self, line: &str) -> GenResult<Option<T>> {
        if !self.parser.can_parse(line) {
            return Ok(None);
        }
        let params = self.parser.parse(line)?;
        (self.assign)(params)
    }
}

/// Ordered command types, first match wins.
#[derive(Debug)]
pub struct CommandChain<T> {
    syntaxes: Vec<CommandSyntax<T>>,
}

impl<T> Default for CommandChain<T> {
    fn default() -> Self {
        Self { syntaxes: vec![] }
    }
}

impl<T> CommandChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, syntax: CommandSyntax<T>) -> Self {
        self.syntaxes.push(syntax);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.syntaxes.iter().map(CommandSyntax::name)
    }

    pub fn parse(&self, line: &str) -> GenResult<T> {
        for syntax in self.syntaxes.iter() {
            if let Some(command) = syntax.try_parse(line)? {
                debug!(command = syntax.name, line, "parsed command");
                return Ok(command);
            }
        }
        Err(GenError::UnknownCommand(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glang::parsers::{IdentifierParser, IntegerParser, PrefixParser};

    fn chain() -> CommandChain<String> {
        CommandChain::new()
            .with(CommandSyntax::new(
                "pick",
                PrefixParser::new("pick ", IdentifierParser),
                |params| Ok(params[0].var_name().map(|name| format!("pick:{}", name))),
            ))
            .with(CommandSyntax::new("odd", IntegerParser, |params| {
                Ok(match params[0] {
                    CommandParameter::Int(val) if val % 2 == 1 => Some(format!("odd:{}", val)),
                    _ => None,
                })
            }))
    }

    #[test]
    fn first_matching_syntax_wins() -> GenResult<()> {
        let chain = chain();
        assert_eq!(chain.parse("pick x")?, "pick:x");
        assert_eq!(chain.parse("7")?, "odd:7");
        assert_eq!(chain.names().collect::<Vec<_>>(), vec!["pick", "odd"]);
        Ok(())
    }

    #[test]
    fn declined_parameters_fall_through_to_unknown_command() {
        let err = chain().parse(" 8 ").unwrap_err();
        assert!(matches!(err, GenError::UnknownCommand(line) if line == "8"));
    }

    #[test]
    fn syntax_parse_without_match_is_a_mismatch() {
        let syntax = CommandSyntax::new("int", IntegerParser, |_| Ok(Some(())));
        assert!(!syntax.can_parse("x"));
        assert!(matches!(
            syntax.parse("x"),
            Err(GenError::ParseMismatch { parser: "int", .. })
        ));
    }
}
