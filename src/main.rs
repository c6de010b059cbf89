mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use tablegen::codegen::Generator;
use tablegen::config::Config;
use tablegen::error::GenResult;
use tablegen::glang::Template;
use tablegen::output::{ConsoleSink, DirectorySink, OutputSink};
use tablegen::source::load_schema;

#[derive(Parser)]
#[command(name = "tablegen")]
#[command(version, about = "Generates source files from table definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./tablegen.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every template for every table
    Render {
        /// JSON document with the table definitions
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory, overriding the config
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print files to stdout instead of writing them
        #[arg(long, conflicts_with = "out")]
        stdout: bool,

        #[arg(required = true)]
        templates: Vec<PathBuf>,
    },

    /// Parse templates and report errors without rendering
    Check {
        #[arg(required = true)]
        templates: Vec<PathBuf>,
    },
}

fn load_templates(paths: &[PathBuf]) -> GenResult<Vec<Template>> {
    paths.iter().map(Template::load).collect()
}

fn run(cli: Cli, config: Config) -> GenResult<()> {
    let generator = Generator::new(&config)?;

    match cli.command {
        Commands::Render {
            data,
            out,
            stdout,
            templates,
        } => {
            let schema = load_schema(&data)?;
            let templates = load_templates(&templates)?;

            let mut sink: Box<dyn OutputSink> = if stdout {
                Box::new(ConsoleSink::stdout())
            } else {
                let dir = out.unwrap_or_else(|| config.output.directory.clone());
                debug!(dir = %dir.display(), "writing to directory");
                Box::new(DirectorySink::new(dir, config.output.overwrite))
            };

            let summary = generator.run(&templates, &schema.tables, sink.as_mut())?;
            if !stdout {
                eprintln!(
                    "{} file(s) written, {} skipped",
                    summary.written, summary.skipped
                );
            }
        }
        Commands::Check { templates } => {
            for path in templates.iter() {
                let template = Template::load(path)?;
                let commands = generator.check(&template)?;
                println!(
                    "{}: ok ({} `{}`, {} commands)",
                    path.display(),
                    template.name,
                    template.file_type,
                    commands
                );
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };
    logging::init(&config.logging, cli.verbose);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
