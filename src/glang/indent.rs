use serde::Deserialize;
use tracing::trace;

use super::matching::StringMatchRule;
use crate::error::{GenError, GenResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentAction {
    PreIndent,
    PostIndent,
    PreDeIndent,
    PostDeIndent,
    TemporaryIndent,
    TemporaryDeIndent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentRule {
    pub matcher: StringMatchRule,
    pub action: IndentAction,
}

impl IndentRule {
    pub fn new(matcher: StringMatchRule, action: IndentAction) -> Self {
        Self { matcher, action }
    }
}

/// Running indent level for one output file.
#[derive(Debug, Clone)]
pub struct Indenter {
    level: usize,
    unit: usize,
}

impl Indenter {
    pub fn new(unit: usize) -> Self {
        Self { level: 0, unit }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    fn increment(&mut self) {
        self.level += 1;
    }

    fn decrement(&mut self, text: &str) -> GenResult<()> {
        self.level = self
            .level
            .checked_sub(1)
            .ok_or_else(|| GenError::IndentUnderflow(text.to_string()))?;
        Ok(())
    }

    fn write(&self, text: &str) -> String {
        let mut line = String::with_capacity(self.level * self.unit + text.len());
        do_indent(&mut line, self.level * self.unit);
        line.push_str(text);
        line
    }

    /// Applies the first rule matching `text` and returns the indented line.
    /// Blank lines skip the rules and come back untouched.
    pub fn indent_line(&mut self, rules: &[IndentRule], text: &str) -> GenResult<String> {
        let candidate = text.trim();
        if candidate.is_empty() {
            return Ok(text.to_string());
        }

        let action = rules
            .iter()
            .find(|rule| rule.matcher.is_match(candidate))
            .map(|rule| rule.action);

        trace!(level = self.level, ?action, line = candidate, "indenting line");

        let line = match action {
            None => self.write(text),
            Some(IndentAction::PreIndent) => {
                self.increment();
                self.write(text)
            }
            Some(IndentAction::PostIndent) => {
                let line = self.write(text);
                self.increment();
                line
            }
            Some(IndentAction::PreDeIndent) => {
                self.decrement(candidate)?;
                self.write(text)
            }
            Some(IndentAction::PostDeIndent) => {
                let line = self.write(text);
                self.decrement(candidate)?;
                line
            }
            Some(IndentAction::TemporaryIndent) => {
                self.increment();
                let line = self.write(text);
                self.decrement(candidate)?;
                line
            }
            Some(IndentAction::TemporaryDeIndent) => {
                self.decrement(candidate)?;
                let line = self.write(text);
                self.increment();
                line
            }
        };

        Ok(line)
    }
}

pub fn do_indent(dest: &mut String, size: usize) {
    dest.extend(std::iter::repeat(' ').take(size));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn brace_rules() -> Vec<IndentRule> {
        vec![
            IndentRule::new(StringMatchRule::postfix("{"), IndentAction::PostIndent),
            IndentRule::new(StringMatchRule::equals("}"), IndentAction::PreDeIndent),
        ]
    }

    #[test]
    fn braces_indent_their_bodies() -> GenResult<()> {
        let rules = brace_rules();
        let mut indenter = Indenter::new(4);

        let lines = ["class Orders {", "public void Foo() {", "}", "}"]
            .iter()
            .map(|line| indenter.indent_line(&rules, line))
            .collect::<GenResult<Vec<_>>>()?;

        assert_eq!(
            lines,
            vec!["class Orders {", "    public void Foo() {", "    }", "}"]
        );
        assert_eq!(indenter.level(), 0);
        Ok(())
    }

    #[test]
    fn extra_close_is_an_underflow() -> GenResult<()> {
        let rules = brace_rules();
        let mut indenter = Indenter::new(4);
        indenter.indent_line(&rules, "class Orders {")?;
        indenter.indent_line(&rules, "}")?;

        let err = indenter.indent_line(&rules, "}").unwrap_err();
        assert!(matches!(err, GenError::IndentUnderflow(line) if line == "}"));
        Ok(())
    }

    #[rstest]
    #[case::pre_indent(IndentAction::PreIndent, "  x", 1)]
    #[case::post_indent(IndentAction::PostIndent, "x", 1)]
    #[case::temporary_indent(IndentAction::TemporaryIndent, "  x", 0)]
    fn indenting_actions(
        #[case] action: IndentAction,
        #[case] expected_line: &str,
        #[case] expected_level: usize,
    ) -> GenResult<()> {
        let rules = vec![IndentRule::new(StringMatchRule::equals("x"), action)];
        let mut indenter = Indenter::new(2);
        assert_eq!(indenter.indent_line(&rules, "x")?, expected_line);
        assert_eq!(indenter.level(), expected_level);
        Ok(())
    }

    #[rstest]
    #[case::pre_de_indent(IndentAction::PreDeIndent, "x", 0)]
    #[case::post_de_indent(IndentAction::PostDeIndent, "  x", 0)]
    #[case::temporary_de_indent(IndentAction::TemporaryDeIndent, "x", 1)]
    fn de_indenting_actions(
        #[case] action: IndentAction,
        #[case] expected_line: &str,
        #[case] expected_level: usize,
    ) -> GenResult<()> {
        let rules = vec![
            IndentRule::new(StringMatchRule::equals("open"), IndentAction::PostIndent),
            IndentRule::new(StringMatchRule::equals("x"), action),
        ];
        let mut indenter = Indenter::new(2);
        indenter.indent_line(&rules, "open")?;
        assert_eq!(indenter.indent_line(&rules, "x")?, expected_line);
        assert_eq!(indenter.level(), expected_level);
        Ok(())
    }

    #[test]
    fn balanced_pairs_restore_the_level() -> GenResult<()> {
        let rules = vec![
            IndentRule::new(StringMatchRule::prefix("begin"), IndentAction::PreIndent),
            IndentRule::new(StringMatchRule::prefix("end"), IndentAction::PostDeIndent),
            IndentRule::new(StringMatchRule::prefix("open"), IndentAction::PostIndent),
            IndentRule::new(StringMatchRule::prefix("close"), IndentAction::PreDeIndent),
        ];
        let mut indenter = Indenter::new(4);
        for line in ["open", "begin", "body", "open", "close", "end", "close"] {
            indenter.indent_line(&rules, line)?;
        }
        assert_eq!(indenter.level(), 0);
        Ok(())
    }

    #[test]
    fn blank_lines_bypass_rules() -> GenResult<()> {
        let rules = vec![IndentRule::new(StringMatchRule::infix(""), IndentAction::PreDeIndent)];
        let mut indenter = Indenter::new(4);
        assert_eq!(indenter.indent_line(&rules, "")?, "");
        assert_eq!(indenter.indent_line(&rules, "   ")?, "   ");
        assert_eq!(indenter.level(), 0);
        Ok(())
    }

    #[test]
    fn unmatched_lines_keep_the_level() -> GenResult<()> {
        let mut indenter = Indenter::new(3);
        indenter.indent_line(&brace_rules(), "if (x) {")?;
        assert_eq!(indenter.indent_line(&brace_rules(), "y();")?, "   y();");
        assert_eq!(indenter.level(), 1);
        Ok(())
    }
}
