//! Line parsers.
//!
//! Every parser answers `can_parse` and, only when that answered `true`,
//! `parse`. Structural parsers (prefix, postfix, infix, surround, fallback)
//! strip their markers and hand the rest to an inner parser chosen by the
//! command that owns them. Detector parsers (integer, double, bool, string,
//! identifier) turn a whole fragment into one parameter.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use super::value::CommandParameter;
use crate::error::{GenError, GenResult};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub trait LineParser: fmt::Debug {
    fn name(&self) -> &'static str;

    fn can_parse(&self, line: &str) -> bool;

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>>;
}

fn mismatch(parser: &dyn LineParser, line: &str) -> GenError {
    GenError::ParseMismatch {
        parser: parser.name(),
        line: line.to_string(),
    }
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

// Tokens match ASCII case-insensitively; the returned slice is cut from the
// same bytes that were compared.
fn strip_token_prefix<'l>(line: &'l str, token: &str) -> Option<&'l str> {
    let head = line.get(..token.len())?;
    head.eq_ignore_ascii_case(token)
        .then(|| line.get(token.len()..))
        .flatten()
}

fn strip_token_suffix<'l>(line: &'l str, token: &str) -> Option<&'l str> {
    let split = line.len().checked_sub(token.len())?;
    let tail = line.get(split..)?;
    tail.eq_ignore_ascii_case(token)
        .then(|| line.get(..split))
        .flatten()
}

/* ==================================== */
/* ==================================== */

/// Accepts only empty or whitespace lines.
#[derive(Debug, Default)]
pub struct NullParser;

impl LineParser for NullParser {
    fn name(&self) -> &'static str {
        "null"
    }

    fn can_parse(&self, line: &str) -> bool {
        line.trim().is_empty()
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        if !self.can_parse(line) {
            return Err(mismatch(self, line));
        }
        Ok(vec![])
    }
}

#[derive(Debug)]
pub struct PrefixParser {
    token: String,
    inner: Box<dyn LineParser>,
}

impl PrefixParser {
    pub fn new(token: &str, inner: impl LineParser + 'static) -> Self {
        Self {
            token: token.to_string(),
            inner: Box::new(inner),
        }
    }

    fn remainder<'l>(&self, line: &'l str) -> Option<&'l str> {
        strip_token_prefix(line.trim(), &self.token).map(str::trim)
    }
}

impl LineParser for PrefixParser {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn can_parse(&self, line: &str) -> bool {
        self.remainder(line)
            .is_some_and(|rest| self.inner.can_parse(rest))
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        match self.remainder(line) {
            Some(rest) if self.inner.can_parse(rest) => self.inner.parse(rest),
            _ => Err(mismatch(self, line)),
        }
    }
}

#[derive(Debug)]
pub struct PostfixParser {
    token: String,
    inner: Box<dyn LineParser>,
}

impl PostfixParser {
    pub fn new(token: &str, inner: impl LineParser + 'static) -> Self {
        Self {
            token: token.to_string(),
            inner: Box::new(inner),
        }
    }

    fn remainder<'l>(&self, line: &'l str) -> Option<&'l str> {
        strip_token_suffix(line.trim(), &self.token).map(str::trim)
    }
}

impl LineParser for PostfixParser {
    fn name(&self) -> &'static str {
        "postfix"
    }

    fn can_parse(&self, line: &str) -> bool {
        self.remainder(line)
            .is_some_and(|rest| self.inner.can_parse(rest))
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        match self.remainder(line) {
            Some(rest) if self.inner.can_parse(rest) => self.inner.parse(rest),
            _ => Err(mismatch(self, line)),
        }
    }
}

/// Splits on `token`, dropping empty fragments, and parses every fragment
/// with the inner parser.
#[derive(Debug)]
pub struct InfixParser {
    token: String,
    inner: Box<dyn LineParser>,
}

impl InfixParser {
    pub fn new(token: &str, inner: impl LineParser + 'static) -> Self {
        Self {
            token: token.to_string(),
            inner: Box::new(inner),
        }
    }

    fn parts<'l>(&self, line: &'l str) -> Vec<&'l str> {
        line.split(self.token.as_str())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }
}

impl LineParser for InfixParser {
    fn name(&self) -> &'static str {
        "infix"
    }

    fn can_parse(&self, line: &str) -> bool {
        if self.token.is_empty() || !line.contains(self.token.as_str()) {
            return false;
        }
        let parts = self.parts(line);
        !parts.is_empty() && parts.iter().all(|part| self.inner.can_parse(part))
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        if !self.can_parse(line) {
            return Err(mismatch(self, line));
        }

        let mut params = vec![];
        for part in self.parts(line) {
            params.extend(self.inner.parse(part)?);
        }
        Ok(params)
    }
}

/// Accepts trimmed lines bracketed by `prefix` and `suffix` with some
/// non-blank content in between.
#[derive(Debug)]
pub struct SurroundParser {
    prefix: String,
    suffix: String,
    inner: Box<dyn LineParser>,
}

impl SurroundParser {
    pub fn new(prefix: &str, suffix: &str, inner: impl LineParser + 'static) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            inner: Box::new(inner),
        }
    }

    fn content<'l>(&self, line: &'l str) -> Option<&'l str> {
        // the suffix is looked for after the prefix, so overlapping markers
        // such as "!@!" never match
        let rest = strip_token_prefix(line.trim(), &self.prefix)?;
        let content = strip_token_suffix(rest, &self.suffix)?.trim();
        (!content.is_empty()).then_some(content)
    }
}

impl LineParser for SurroundParser {
    fn name(&self) -> &'static str {
        "surround"
    }

    fn can_parse(&self, line: &str) -> bool {
        self.content(line)
            .is_some_and(|content| self.inner.can_parse(content))
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        match self.content(line) {
            Some(content) if self.inner.can_parse(content) => self.inner.parse(content),
            _ => Err(mismatch(self, line)),
        }
    }
}

/// Last resort: any non-blank line, trimmed, goes to the inner parser.
#[derive(Debug)]
pub struct FallbackParser {
    inner: Box<dyn LineParser>,
}

impl FallbackParser {
    pub fn new(inner: impl LineParser + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl LineParser for FallbackParser {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn can_parse(&self, line: &str) -> bool {
        let line = line.trim();
        !line.is_empty() && self.inner.can_parse(line)
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        if !self.can_parse(line) {
            return Err(mismatch(self, line));
        }
        self.inner.parse(line.trim())
    }
}

/* ==================================== */
/* ==================================== */

#[derive(Debug, Default)]
pub struct IntegerParser;

impl LineParser for IntegerParser {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn can_parse(&self, line: &str) -> bool {
        let line = line.trim();
        !line.contains('.') && line.parse::<i64>().is_ok()
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        let val = (!line.contains('.'))
            .then(|| line.trim().parse::<i64>().ok())
            .flatten()
            .ok_or_else(|| mismatch(self, line))?;
        Ok(vec![CommandParameter::Int(val)])
    }
}

#[derive(Debug, Default)]
pub struct DoubleParser;

impl LineParser for DoubleParser {
    fn name(&self) -> &'static str {
        "double"
    }

    fn can_parse(&self, line: &str) -> bool {
        let line = line.trim();
        line.contains('.') && line.parse::<f64>().is_ok()
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        if !self.can_parse(line) {
            return Err(mismatch(self, line));
        }
        let val = line.trim().parse::<f64>().map_err(|_| mismatch(self, line))?;
        Ok(vec![CommandParameter::Double(val)])
    }
}

#[derive(Debug, Default)]
pub struct BoolParser;

impl BoolParser {
    fn value(line: &str) -> Option<bool> {
        let line = line.trim();
        if line.eq_ignore_ascii_case("true") {
            Some(true)
        } else if line.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl LineParser for BoolParser {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn can_parse(&self, line: &str) -> bool {
        Self::value(line).is_some()
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        let val = Self::value(line).ok_or_else(|| mismatch(self, line))?;
        Ok(vec![CommandParameter::Bool(val)])
    }
}

/// A double-quoted string literal. No escapes; `""` is the empty string.
#[derive(Debug, Default)]
pub struct StringLiteralParser;

impl StringLiteralParser {
    fn content(line: &str) -> Option<&str> {
        line.trim()
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
    }
}

impl LineParser for StringLiteralParser {
    fn name(&self) -> &'static str {
        "string"
    }

    fn can_parse(&self, line: &str) -> bool {
        Self::content(line).is_some()
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        let content = Self::content(line).ok_or_else(|| mismatch(self, line))?;
        Ok(vec![CommandParameter::Str(content.to_string())])
    }
}

#[derive(Debug, Default)]
pub struct IdentifierParser;

impl LineParser for IdentifierParser {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn can_parse(&self, line: &str) -> bool {
        is_identifier(line.trim())
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        if !self.can_parse(line) {
            return Err(mismatch(self, line));
        }
        Ok(vec![CommandParameter::VarRef(line.trim().to_string())])
    }
}

/// Wraps the whole fragment, untouched, as a string parameter.
#[derive(Debug, Default)]
pub struct TextParser;

impl LineParser for TextParser {
    fn name(&self) -> &'static str {
        "text"
    }

    fn can_parse(&self, _line: &str) -> bool {
        true
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        Ok(vec![CommandParameter::Str(line.to_string())])
    }
}

/// Accepts what `inner` accepts, but yields the trimmed fragment itself as
/// a string parameter, keeping literals exactly as written.
#[derive(Debug)]
pub struct VerbatimParser {
    inner: Box<dyn LineParser>,
}

impl VerbatimParser {
    pub fn new(inner: impl LineParser + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl LineParser for VerbatimParser {
    fn name(&self) -> &'static str {
        "verbatim"
    }

    fn can_parse(&self, line: &str) -> bool {
        self.inner.can_parse(line)
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        if !self.can_parse(line) {
            return Err(mismatch(self, line));
        }
        Ok(vec![CommandParameter::Str(line.trim().to_string())])
    }
}

/* ==================================== */

/// Ordered alternatives, first match wins.
#[derive(Debug, Default)]
pub struct FirstOf {
    parsers: Vec<Box<dyn LineParser>>,
}

impl FirstOf {
    pub fn new() -> Self {
        Self { parsers: vec![] }
    }

    pub fn or(mut self, parser: impl LineParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Literal detectors, most specific first.
    pub fn literals() -> Self {
        Self::new()
            .or(IntegerParser)
            .or(DoubleParser)
            .or(BoolParser)
            .or(StringLiteralParser)
    }

    /// Literals, then a bare identifier as a variable reference.
    pub fn values() -> Self {
        Self::literals().or(IdentifierParser)
    }

    fn find(&self, line: &str) -> Option<&dyn LineParser> {
        self.parsers
            .iter()
            .map(Box::as_ref)
            .find(|parser| parser.can_parse(line))
    }
}

impl LineParser for FirstOf {
    fn name(&self) -> &'static str {
        "first-of"
    }

    fn can_parse(&self, line: &str) -> bool {
        self.find(line).is_some()
    }

    fn parse(&self, line: &str) -> GenResult<Vec<CommandParameter>> {
        match self.find(line) {
            Some(parser) => parser.parse(line),
            None => Err(mismatch(self, line)),
        }
    }
}
