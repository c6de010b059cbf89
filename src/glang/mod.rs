//! The template language: markers, expressions, statements and the driver
//! that renders a template once per table.

pub mod command;
pub mod emit;
pub mod expressions;
pub mod indent;
pub mod interpreter;
pub mod matching;
pub mod parsers;
pub mod scope;
pub mod statements;
pub mod template;
pub mod value;

pub use command::{Command, CommandChain, CommandSyntax, Context};
pub use emit::CodeFile;
pub use indent::{IndentAction, IndentRule, Indenter};
pub use interpreter::{CompiledTemplate, FileFactory, Interpreter, RenderedFile};
pub use matching::{MatchKind, StringMatchRule};
pub use parsers::LineParser;
pub use scope::{Variable, VariableStore};
pub use template::{tokenize_line, LinePart, Template, TemplateLine};
pub use value::{CommandParameter, Value, VariableKind};
