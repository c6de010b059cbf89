use std::rc::Rc;

use super::indent::{IndentRule, Indenter};
use crate::error::GenResult;

/// Line buffer for one rendered output file.
///
/// Rendered text is pushed in pieces; a piece ending in `\n` completes a
/// line, which is indented and appended. Anything after the last newline
/// stays pending and is joined with the next piece.
#[derive(Debug, Clone)]
pub struct CodeFile {
    file_type: String,
    rules: Rc<[IndentRule]>,
    indenter: Indenter,
    lines: Vec<String>,
    pending: String,
}

impl CodeFile {
    pub fn new(file_type: impl Into<String>, indent_unit: usize, rules: Rc<[IndentRule]>) -> Self {
        Self {
            file_type: file_type.into(),
            rules,
            indenter: Indenter::new(indent_unit),
            lines: vec![],
            pending: String::new(),
        }
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn indent_level(&self) -> usize {
        self.indenter.level()
    }

    /// Appends one complete line, prefixed by any pending text.
    pub fn add_line(&mut self, text: &str) -> GenResult<()> {
        let line = if self.pending.is_empty() {
            self.indenter.indent_line(&self.rules, text)?
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.push_str(text);
            self.indenter.indent_line(&self.rules, &joined)?
        };
        self.lines.push(line);
        Ok(())
    }

    pub fn push_text(&mut self, text: &str) -> GenResult<()> {
        for piece in text.split_inclusive('\n') {
            match piece.strip_suffix('\n') {
                Some(line) => self.add_line(line)?,
                None => self.pending.push_str(piece),
            }
        }
        Ok(())
    }

    /// Emits pending text, if any, as a last line.
    pub fn finish(&mut self) -> GenResult<()> {
        if !self.pending.is_empty() {
            self.add_line("")?;
        }
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contents(&self) -> String {
        let mut contents = String::new();
        for line in self.lines.iter() {
            contents.push_str(line);
            contents.push('\n');
        }
        contents.push_str(&self.pending);
        contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glang::indent::IndentAction;
    use crate::glang::matching::StringMatchRule;
    use similar_asserts::assert_eq;

    fn code_file() -> CodeFile {
        let rules: Rc<[IndentRule]> = Rc::from(vec![
            IndentRule::new(StringMatchRule::postfix("{"), IndentAction::PostIndent),
            IndentRule::new(StringMatchRule::equals("}"), IndentAction::PreDeIndent),
        ]);
        CodeFile::new("cs", 4, rules)
    }

    #[test]
    fn pending_text_joins_the_next_line() -> GenResult<()> {
        let mut file = code_file();
        file.push_text("public class ")?;
        file.push_text("Orders")?;
        file.push_text(" {\n")?;
        file.push_text("int Id;\n}\n")?;

        assert_eq!(file.contents(), "public class Orders {\n    int Id;\n}\n");
        assert_eq!(file.indent_level(), 0);
        Ok(())
    }

    #[test]
    fn finish_flushes_pending_text() -> GenResult<()> {
        let mut file = code_file();
        file.push_text("Orders")?;
        assert!(file.lines().is_empty());

        file.finish()?;
        assert_eq!(file.lines().to_vec(), vec!["Orders".to_string()]);
        Ok(())
    }

    #[test]
    fn empty_lines_stay_empty() -> GenResult<()> {
        let mut file = code_file();
        file.push_text("namespace X {\n\nclass Y;\n")?;
        assert_eq!(file.contents(), "namespace X {\n\n    class Y;\n");
        Ok(())
    }
}
