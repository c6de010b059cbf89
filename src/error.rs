use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("parser `{parser}` cannot parse `{line}`")]
    ParseMismatch { parser: &'static str, line: String },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("variable `{name}` holds {expected} values, cannot store {found}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown variable kind `{0}`")]
    UnknownKind(String),

    #[error("cannot destroy the global stack frame")]
    ScopeUnderflow,

    #[error("unterminated marker in `{0}`")]
    UnterminatedMarker(String),

    #[error("marker opened inside another marker in `{0}`")]
    NestedMarker(String),

    #[error("indent level would drop below zero at `{0}`")]
    IndentUnderflow(String),

    #[error("integer overflow stepping `{0}`")]
    Overflow(String),

    #[error("no command matches `{0}`")]
    UnknownCommand(String),

    #[error("unbalanced block: {0}")]
    UnbalancedBlock(String),

    #[error("unknown file type `{0}`")]
    UnknownFileType(String),

    #[error("{template}:{line}: {source}")]
    Template {
        template: String,
        line: usize,
        #[source]
        source: Box<GenError>,
    },

    #[error("failed to parse config file: {0}")]
    Config(String),

    #[error("failed to load data source `{path}`: {reason}")]
    DataSource { path: String, reason: String },

    #[error("failed to render output file name: {0}")]
    FileName(String),

    #[error("output file `{0}` already exists")]
    OutputExists(PathBuf),
}

impl GenError {
    pub(crate) fn at_line(self, template: &str, line: usize) -> Self {
        match self {
            // keep the innermost location
            err @ GenError::Template { .. } => err,
            err => GenError::Template {
                template: template.to_string(),
                line,
                source: Box::new(err),
            },
        }
    }
}

pub type GenResult<T> = Result<T, GenError>;
