use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{GenError, GenResult};

/// A rendered file with its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub contents: String,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// What to do when an output file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    Skip,
    #[default]
    Overwrite,
    Error,
}

pub trait OutputSink {
    fn exists(&self, name: &str) -> bool;

    /// Returns `false` if the file was left alone.
    fn write(&mut self, file: &OutputFile) -> GenResult<bool>;
}

/// Writes every file to a stream, each preceded by a `==> name <==` banner.
pub struct ConsoleSink<W> {
    dest: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { dest: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(dest: W) -> Self {
        Self { dest }
    }

    pub fn into_inner(self) -> W {
        self.dest
    }
}

impl<W: Write> OutputSink for ConsoleSink<W> {
    fn exists(&self, _name: &str) -> bool {
        false
    }

    fn write(&mut self, file: &OutputFile) -> GenResult<bool> {
        writeln!(self.dest, "==> {} <==", file.name)?;
        write!(self.dest, "{}", file.contents)?;
        if !file.contents.ends_with('\n') {
            writeln!(self.dest)?;
        }
        self.dest.flush()?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Vec<OutputFile>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[OutputFile] {
        &self.files
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|file| file.name == name)
            .map(|file| file.contents.as_str())
    }
}

impl OutputSink for MemorySink {
    fn exists(&self, name: &str) -> bool {
        self.files.iter().any(|file| file.name == name)
    }

    fn write(&mut self, file: &OutputFile) -> GenResult<bool> {
        match self.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => existing.contents = file.contents.clone(),
            None => self.files.push(file.clone()),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
    policy: OverwritePolicy,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>, policy: OverwritePolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `name` under the root. Names that could leave it (absolute
    /// paths, `..` components) are rejected.
    fn path_of(&self, name: &str) -> GenResult<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative.components().any(|part| {
            matches!(
                part,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || name.is_empty() {
            return Err(GenError::FileName(format!(
                "`{}` does not stay inside {}",
                name,
                self.root.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl OutputSink for DirectorySink {
    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_ok_and(|path| path.exists())
    }

    fn write(&mut self, file: &OutputFile) -> GenResult<bool> {
        let path = self.path_of(&file.name)?;

        if path.exists() {
            match self.policy {
                OverwritePolicy::Skip => {
                    warn!(path = %path.display(), "output exists, skipping");
                    return Ok(false);
                }
                OverwritePolicy::Error => return Err(GenError::OutputExists(path)),
                OverwritePolicy::Overwrite => {}
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.contents)?;

        debug!(path = %path.display(), bytes = file.contents.len(), "wrote output");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_sink_prints_banners() -> GenResult<()> {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.write(&OutputFile::new("Orders.cs", "class Orders {\n}\n"))?;
        sink.write(&OutputFile::new("Notes.txt", "no newline"))?;

        let printed = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            printed,
            "==> Orders.cs <==\nclass Orders {\n}\n==> Notes.txt <==\nno newline\n"
        );
        Ok(())
    }

    #[test]
    fn memory_sink_replaces_by_name() -> GenResult<()> {
        let mut sink = MemorySink::new();
        sink.write(&OutputFile::new("a.cs", "one"))?;
        sink.write(&OutputFile::new("a.cs", "two"))?;

        assert!(sink.exists("a.cs"));
        assert_eq!(sink.files().len(), 1);
        assert_eq!(sink.get("a.cs"), Some("two"));
        Ok(())
    }

    #[test]
    fn directory_sink_honours_policy() -> GenResult<()> {
        let dir = tempfile::tempdir()?;
        let file = OutputFile::new("nested/Orders.cs", "v1");

        let mut sink = DirectorySink::new(dir.path(), OverwritePolicy::Skip);
        assert!(!sink.exists(&file.name));
        assert!(sink.write(&file)?);
        assert!(!sink.write(&OutputFile::new("nested/Orders.cs", "v2"))?);
        assert_eq!(fs::read_to_string(dir.path().join("nested/Orders.cs"))?, "v1");

        let mut sink = DirectorySink::new(dir.path(), OverwritePolicy::Error);
        assert!(matches!(sink.write(&file), Err(GenError::OutputExists(_))));

        let mut sink = DirectorySink::new(dir.path(), OverwritePolicy::Overwrite);
        assert!(sink.write(&OutputFile::new("nested/Orders.cs", "v3"))?);
        assert_eq!(fs::read_to_string(dir.path().join("nested/Orders.cs"))?, "v3");
        Ok(())
    }

    #[test]
    fn directory_sink_stays_inside_its_root() -> GenResult<()> {
        let parent = tempfile::tempdir()?;
        let root = parent.path().join("out");
        let outside = parent.path().join("escaped.cs");
        let mut sink = DirectorySink::new(&root, OverwritePolicy::Overwrite);

        for name in [
            "../escaped.cs".to_string(),
            "nested/../../escaped.cs".to_string(),
            outside.display().to_string(),
            String::new(),
        ] {
            assert!(!sink.exists(&name));
            assert!(matches!(
                sink.write(&OutputFile::new(name, "x")),
                Err(GenError::FileName(_))
            ));
        }
        assert!(!outside.exists());

        // "." components are harmless
        assert!(sink.write(&OutputFile::new("./Orders.cs", "ok"))?);
        assert_eq!(fs::read_to_string(root.join("Orders.cs"))?, "ok");
        Ok(())
    }
}
