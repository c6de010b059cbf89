use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{GenError, GenResult};
use crate::glang::interpreter::{Interpreter, RenderedFile};
use crate::glang::template::Template;
use crate::items::TableDefinition;
use crate::output::{OutputFile, OutputSink};

const FILE_NAME_TEMPLATE: &str = "file_name";

#[derive(Serialize)]
struct FileNameContext<'a> {
    table: &'a str,
    template: &'a str,
    extension: &'a str,
    file_type: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub skipped: usize,
}

/// Renders templates with the file types and naming scheme of a config.
pub struct Generator<'c> {
    config: &'c Config,
    names: TinyTemplate<'c>,
}

impl<'c> Generator<'c> {
    pub fn new(config: &'c Config) -> GenResult<Self> {
        let mut names = TinyTemplate::new();
        names.set_default_formatter(&format_unescaped);
        names
            .add_template(FILE_NAME_TEMPLATE, &config.output.file_name)
            .map_err(|err| GenError::FileName(err.to_string()))?;

        Ok(Self { config, names })
    }

    /// Parses `template` without rendering it. Returns the number of
    /// top-level commands.
    pub fn check(&self, template: &Template) -> GenResult<usize> {
        self.config.file_type(&template.file_type)?;
        let compiled = Interpreter::new().compile(template)?;
        Ok(compiled.commands().len())
    }

    pub fn file_name(&self, rendered: &RenderedFile) -> GenResult<String> {
        let context = FileNameContext {
            table: rendered.table.as_deref().unwrap_or(&rendered.template),
            template: &rendered.template,
            extension: self.config.extension(&rendered.file_type)?,
            file_type: &rendered.file_type,
        };

        self.names
            .render(FILE_NAME_TEMPLATE, &context)
            .map_err(|err| GenError::FileName(err.to_string()))
    }

    /// Renders one template for every table, each into its own file. Every
    /// template gets a fresh variable store.
    pub fn generate(
        &self,
        template: &Template,
        tables: &[TableDefinition],
    ) -> GenResult<Vec<OutputFile>> {
        let mut interpreter = Interpreter::new();
        let rendered = interpreter.render(template, tables, self.config)?;

        rendered
            .into_iter()
            .map(|file| Ok(OutputFile::new(self.file_name(&file)?, file.contents)))
            .collect()
    }

    pub fn run(
        &self,
        templates: &[Template],
        tables: &[TableDefinition],
        sink: &mut dyn OutputSink,
    ) -> GenResult<Summary> {
        let mut summary = Summary::default();

        for template in templates.iter() {
            debug!(template = %template.name, file_type = %template.file_type, "generating");
            for file in self.generate(template, tables)? {
                if sink.write(&file)? {
                    summary.written += 1;
                } else {
                    summary.skipped += 1;
                }
            }
        }

        info!(written = summary.written, skipped = summary.skipped, "done");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use similar_asserts::assert_eq;

    const ENTITY: &str = "\
#filetype cs
public class !@TableName@! {
!@foreach column@!
!@if IsNullable@!
public !@ColumnType@!? !@ColumnName@! { get; set; }
!@end if@!
!@if !IsNullable@!
public !@ColumnType@! !@ColumnName@! { get; set; }
!@end if@!
!@end foreach@!
}
";

    fn tables() -> Vec<TableDefinition> {
        vec![
            TableDefinition::new("Orders")
                .primary_key("Id", "int")
                .column("ShippedAt", "DateTime", true),
            TableDefinition::new("Customers").primary_key("Id", "int"),
        ]
    }

    #[test]
    fn renders_one_file_per_table() -> GenResult<()> {
        let config = Config::parse("")?;
        let generator = Generator::new(&config)?;
        let template = Template::from_source("Entity", ENTITY, None)?;

        let mut sink = MemorySink::new();
        let summary = generator.run(&[template], &tables(), &mut sink)?;
        assert_eq!(summary, Summary { written: 2, skipped: 0 });

        assert_eq!(
            sink.get("Orders.cs"),
            Some(
                "public class Orders {\n    public int Id { get; set; }\n    public DateTime? ShippedAt { get; set; }\n}\n"
            )
        );
        assert_eq!(
            sink.get("Customers.cs"),
            Some("public class Customers {\n    public int Id { get; set; }\n}\n")
        );
        Ok(())
    }

    #[test]
    fn names_files_from_config_pattern() -> GenResult<()> {
        let config = Config::parse(
            "[output]\nfile_name = \"{template}/{table}.g.{extension}\"\n\n[file_types.ts]\nextension = \"tsx\"\n",
        )?;
        let generator = Generator::new(&config)?;
        let template = Template::from_source("Model", "// !@TableName@! model", Some("ts"))?;

        let names = generator
            .generate(&template, &tables())?
            .into_iter()
            .map(|file| file.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Model/Orders.g.tsx", "Model/Customers.g.tsx"]);
        Ok(())
    }

    #[test]
    fn static_templates_are_named_after_themselves() -> GenResult<()> {
        let config = Config::parse("")?;
        let generator = Generator::new(&config)?;
        let template = Template::from_source("Shared", "namespace Db;\n", Some("cs"))?;

        let files = generator.generate(&template, &tables())?;
        assert_eq!(files, vec![OutputFile::new("Shared.cs", "namespace Db;\n")]);
        Ok(())
    }

    #[test]
    fn check_reports_unknown_file_types_and_bad_lines() -> GenResult<()> {
        let config = Config::parse("")?;
        let generator = Generator::new(&config)?;

        let template = Template::from_source("Entity", ENTITY, None)?;
        assert_eq!(generator.check(&template)?, 3);

        let template = Template::from_source("Entity", "x !@TableName@!", Some("cobol"))?;
        assert!(matches!(generator.check(&template), Err(GenError::UnknownFileType(_))));

        let template = Template::from_source("Entity", "a\n!@1 + 1@!", Some("cs"))?;
        assert!(matches!(
            generator.check(&template),
            Err(GenError::Template { line: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn bad_file_name_pattern_is_reported() {
        let config = Config::parse("[output]\nfile_name = \"{table\"").unwrap();
        assert!(matches!(Generator::new(&config), Err(GenError::FileName(_))));
    }
}
