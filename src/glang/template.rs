use std::fs;
use std::path::Path;

use super::command::{Command, CommandChain, Context};
use crate::error::{GenError, GenResult};

pub const OPEN_MARKER: &str = "!@";
pub const CLOSE_MARKER: &str = "@!";

const FILETYPE_HEADER: &str = "#filetype";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePart<'t> {
    Static(&'t str),
    Dynamic(&'t str),
}

/// Splits a raw template line into static text and marker-delimited
/// expressions.
///
/// Leading whitespace of the line and trailing whitespace of the line are
/// dropped (the indent engine owns indentation). Static text between or
/// around markers is not trimmed, so `class !@TableName@! {` keeps the
/// spaces on both sides of the marker.
pub fn tokenize_line(line: &str) -> GenResult<Vec<LinePart<'_>>> {
    let mut parts = vec![];
    let mut rest = line.trim_start();

    loop {
        let open = rest.find(OPEN_MARKER);
        let close = rest.find(CLOSE_MARKER);

        let start = match (open, close) {
            (None, None) => {
                let tail = rest.trim_end();
                if !tail.is_empty() {
                    parts.push(LinePart::Static(tail));
                }
                break;
            }
            // a close marker with nothing open
            (None, Some(_)) => return Err(GenError::UnterminatedMarker(line.to_string())),
            (Some(start), Some(end)) if end < start => {
                return Err(GenError::UnterminatedMarker(line.to_string()))
            }
            (Some(start), _) => start,
        };

        let body = &rest[start + OPEN_MARKER.len()..];
        let end = body
            .find(CLOSE_MARKER)
            .ok_or_else(|| GenError::UnterminatedMarker(line.to_string()))?;

        let expr = &body[..end];
        if expr.contains(OPEN_MARKER) {
            return Err(GenError::NestedMarker(line.to_string()));
        }

        if start > 0 {
            parts.push(LinePart::Static(&rest[..start]));
        }
        parts.push(LinePart::Dynamic(expr.trim()));

        rest = &body[end + CLOSE_MARKER.len()..];
    }

    Ok(parts)
}

pub fn has_markers(line: &str) -> bool {
    line.contains(OPEN_MARKER)
}

/* ==================================== */

#[derive(Debug)]
enum Part {
    Static(String),
    Dynamic(Box<dyn Command>),
}

/// One template line, compiled: static text plus pre-parsed expression
/// commands.
#[derive(Debug)]
pub struct TemplateLine {
    raw: String,
    parts: Vec<Part>,
}

impl TemplateLine {
    pub fn compile(raw: &str, expressions: &CommandChain<Box<dyn Command>>) -> GenResult<Self> {
        let mut parts = vec![];
        for part in tokenize_line(raw)? {
            parts.push(match part {
                LinePart::Static(text) => Part::Static(text.to_string()),
                LinePart::Dynamic(expr) => Part::Dynamic(expressions.parse(expr)?),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn ends_with_dynamic(&self) -> bool {
        matches!(self.parts.last(), Some(Part::Dynamic(_)))
    }

    /// Renders every part in order. A newline is appended unless the last
    /// part is dynamic, which lets the value run into the next line.
    pub fn render(&self, ctx: &mut Context<'_>) -> GenResult<String> {
        let mut rendered = String::new();
        for part in self.parts.iter() {
            match part {
                Part::Static(text) => rendered.push_str(text),
                Part::Dynamic(command) => rendered.push_str(&command.execute(ctx)?),
            }
        }

        if !self.ends_with_dynamic() {
            rendered.push('\n');
        }
        Ok(rendered)
    }
}

/* ==================================== */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub file_type: String,
    pub lines: Vec<String>,
}

impl Template {
    pub fn new(name: impl Into<String>, file_type: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            file_type: file_type.into(),
            lines,
        }
    }

    /// Builds a template from its source text. A first line of the form
    /// `#filetype <name>` declares the file type and is dropped from the
    /// body; otherwise `file_type` is used.
    pub fn from_source(name: &str, source: &str, file_type: Option<&str>) -> GenResult<Self> {
        let mut lines = source.lines().map(str::to_string).collect::<Vec<_>>();

        let header = lines
            .first()
            .and_then(|line| line.trim().strip_prefix(FILETYPE_HEADER))
            .map(|rest| rest.trim().to_string());

        let file_type = match header {
            Some(declared) if !declared.is_empty() => {
                lines.remove(0);
                declared
            }
            _ => file_type
                .map(str::to_string)
                .ok_or_else(|| GenError::UnknownFileType(format!("<undeclared in {}>", name)))?,
        };

        Ok(Self::new(name, file_type, lines))
    }

    /// Loads `Entity.cs.tmpl` as template `Entity` of file type `cs`, unless
    /// the file declares its own type.
    pub fn load<P: AsRef<Path>>(path: P) -> GenResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;

        let stem = Path::new(path.file_stem().unwrap_or_default());
        let name = stem
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let file_type = stem.extension().map(|ext| ext.to_string_lossy().to_string());

        Self::from_source(&name, &source, file_type.as_deref())
    }

    pub fn has_dynamic_content(&self) -> bool {
        self.lines.iter().any(|line| has_markers(line))
    }
}
