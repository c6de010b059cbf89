use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{GenError, GenResult};
use crate::glang::emit::CodeFile;
use crate::glang::indent::{IndentAction, IndentRule};
use crate::glang::interpreter::FileFactory;
use crate::glang::matching::{MatchKind, StringMatchRule};
use crate::output::OverwritePolicy;

pub const DEFAULT_CONFIG_FILE: &str = "tablegen.toml";
pub const DEFAULT_FILE_NAME: &str = "{table}.{extension}";

const DEFAULT_INDENT_UNIT: usize = 4;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub file_types: BTreeMap<String, FileTypeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub overwrite: OverwritePolicy,
    // tinytemplate pattern; fields: table, template, extension, file_type
    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            overwrite: OverwritePolicy::default(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleConfig {
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub text: String,
    pub action: IndentAction,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl RuleConfig {
    fn new(kind: MatchKind, text: &str, action: IndentAction) -> Self {
        Self {
            kind,
            text: text.to_string(),
            action,
            case_sensitive: false,
        }
    }

    pub fn to_rule(&self) -> IndentRule {
        IndentRule::new(
            StringMatchRule::new(self.kind, self.text.as_str()).case_sensitive(self.case_sensitive),
            self.action,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileTypeConfig {
    // Defaults to the file type's own name
    pub extension: Option<String>,
    #[serde(default = "default_indent_unit")]
    pub indent_unit: usize,
    // Brace rules when absent; an empty list disables indentation
    pub rules: Option<Vec<RuleConfig>>,
}

fn default_indent_unit() -> usize {
    DEFAULT_INDENT_UNIT
}

impl FileTypeConfig {
    fn braces() -> Self {
        Self {
            extension: None,
            indent_unit: DEFAULT_INDENT_UNIT,
            rules: None,
        }
    }
}

/// Indent rules for brace-delimited languages, in match order.
pub fn brace_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::new(MatchKind::Prefix, "} else", IndentAction::TemporaryDeIndent),
        RuleConfig::new(MatchKind::Postfix, "{", IndentAction::PostIndent),
        RuleConfig::new(MatchKind::Prefix, "};", IndentAction::PreDeIndent),
        RuleConfig::new(MatchKind::Prefix, "}", IndentAction::PreDeIndent),
    ]
}

fn builtin_file_types() -> BTreeMap<String, FileTypeConfig> {
    ["cs", "ts"]
        .into_iter()
        .map(|name| (name.to_string(), FileTypeConfig::braces()))
        .collect()
}

impl Config {
    /// Parses a config document. File types it declares are added to, or
    /// replace, the built-in `cs` and `ts` types.
    pub fn parse(text: &str) -> GenResult<Self> {
        let mut config: Config =
            toml::from_str(text).map_err(|err| GenError::Config(err.to_string()))?;

        let declared = std::mem::take(&mut config.file_types);
        config.file_types = builtin_file_types();
        config.file_types.extend(declared);

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> GenResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| GenError::Config(format!("{}: {}", path.display(), err)))?;

        debug!(path = %path.display(), "loading config");
        Self::parse(&text)
    }

    /// Loads `path` if given, else `tablegen.toml` in the working directory
    /// if present, else the defaults.
    pub fn discover(path: Option<&Path>) -> GenResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Self::parse(""),
        }
    }

    pub fn file_type(&self, name: &str) -> GenResult<&FileTypeConfig> {
        self.file_types
            .get(name)
            .ok_or_else(|| GenError::UnknownFileType(name.to_string()))
    }

    pub fn extension<'a>(&'a self, file_type: &'a str) -> GenResult<&'a str> {
        let config = self.file_type(file_type)?;
        Ok(config.extension.as_deref().unwrap_or(file_type))
    }

    pub fn indent_rules(&self, file_type: &str) -> GenResult<Vec<IndentRule>> {
        let config = self.file_type(file_type)?;
        let rules = match &config.rules {
            Some(rules) => rules.iter().map(RuleConfig::to_rule).collect(),
            None => brace_rules().iter().map(RuleConfig::to_rule).collect(),
        };
        Ok(rules)
    }
}

impl FileFactory for Config {
    fn create_file(&self, file_type: &str) -> GenResult<CodeFile> {
        let unit = self.file_type(file_type)?.indent_unit;
        let rules: Rc<[IndentRule]> = Rc::from(self.indent_rules(file_type)?);
        Ok(CodeFile::new(file_type, unit, rules))
    }
}
