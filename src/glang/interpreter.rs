use std::rc::Rc;

use tracing::{debug, info};

use super::command::{Command, CommandChain, Context};
use super::emit::CodeFile;
use super::expressions::expression_chain;
use super::scope::VariableStore;
use super::statements::{compile_statements, statement_chain, Statement};
use super::template::Template;
use super::value::{Value, VariableKind};
use crate::error::GenResult;
use crate::items::TableDefinition;

/// Global variable holding the name of the table being rendered.
pub const TABLE_NAME: &str = "TableName";
/// Global variable holding the column count of the table being rendered.
pub const COLUMN_COUNT: &str = "ColumnCount";

/// Resolves a template's declared file type to a fresh output file.
pub trait FileFactory {
    fn create_file(&self, file_type: &str) -> GenResult<CodeFile>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub template: String,
    // None for static templates, which are rendered once
    pub table: Option<String>,
    pub file_type: String,
    pub contents: String,
}

/// A template parsed into its command list. Static templates carry no
/// commands.
#[derive(Debug)]
pub struct CompiledTemplate<'t> {
    template: &'t Template,
    commands: Option<Vec<Box<dyn Command>>>,
}

impl<'t> CompiledTemplate<'t> {
    pub fn template(&self) -> &Template {
        self.template
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        self.commands.as_deref().unwrap_or_default()
    }

    pub fn is_static(&self) -> bool {
        self.commands.is_none()
    }
}

/// Renders templates against tables. One instance owns one variable store;
/// use separate instances to render independently.
#[derive(Debug)]
pub struct Interpreter {
    store: VariableStore,
    statements: CommandChain<Statement>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_store(VariableStore::new())
    }

    pub fn with_store(store: VariableStore) -> Self {
        Self {
            store,
            statements: statement_chain(Rc::new(expression_chain())),
        }
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn compile<'t>(&self, template: &'t Template) -> GenResult<CompiledTemplate<'t>> {
        if !template.has_dynamic_content() {
            debug!(template = %template.name, "static template, skipping parse");
            return Ok(CompiledTemplate {
                template,
                commands: None,
            });
        }

        let commands = compile_statements(&template.name, &template.lines, &self.statements)?;
        debug!(template = %template.name, commands = commands.len(), "compiled template");
        Ok(CompiledTemplate {
            template,
            commands: Some(commands),
        })
    }

    /// Parses `template` once, then renders it for every table in order.
    pub fn render(
        &mut self,
        template: &Template,
        tables: &[TableDefinition],
        files: &dyn FileFactory,
    ) -> GenResult<Vec<RenderedFile>> {
        let compiled = self.compile(template)?;

        if compiled.is_static() {
            return Ok(vec![copy_static(template)]);
        }

        let mut rendered = Vec::with_capacity(tables.len());
        for table in tables.iter() {
            let mut file = files.create_file(&template.file_type)?;
            self.render_table(&compiled, table, &mut file)?;

            info!(template = %template.name, table = %table.name, lines = file.lines().len(), "rendered");
            rendered.push(RenderedFile {
                template: template.name.clone(),
                table: Some(table.name.clone()),
                file_type: template.file_type.clone(),
                contents: file.contents(),
            });
        }

        Ok(rendered)
    }

    pub fn render_table(
        &mut self,
        compiled: &CompiledTemplate<'_>,
        table: &TableDefinition,
        file: &mut CodeFile,
    ) -> GenResult<()> {
        self.store
            .set_global_variable(TABLE_NAME, VariableKind::String, table.name.as_str().into())?;
        self.store.set_global_variable(
            COLUMN_COUNT,
            VariableKind::Int,
            Value::Int(table.columns.len() as i64),
        )?;

        let mut ctx = Context {
            store: &mut self.store,
            table,
            file,
        };
        for command in compiled.commands() {
            command.execute(&mut ctx)?;
        }
        ctx.file.finish()?;

        debug_assert_eq!(self.store.depth(), 1, "stack frame leaked past a table");
        Ok(())
    }
}

fn copy_static(template: &Template) -> RenderedFile {
    let mut contents = String::new();
    for line in template.lines.iter() {
        contents.push_str(line);
        contents.push('\n');
    }

    RenderedFile {
        template: template.name.clone(),
        table: None,
        file_type: template.file_type.clone(),
        contents,
    }
}
