// src/recipe/source.rs

//! Recipe file loading and atomic write-back

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Line terminator style of a recipe file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// A recipe split into lines, remembering how to put it back together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeSource {
    pub lines: Vec<String>,
    pub line_ending: LineEnding,
    pub trailing_newline: bool,
}

impl RecipeSource {
    /// Split `content` into lines; the first terminator decides the style
    pub fn parse(content: &str) -> Self {
        let line_ending = match content.find('\n') {
            Some(pos) if content[..pos].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        };
        let trailing_newline = content.ends_with('\n');

        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines = if content.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
                .collect()
        };

        Self {
            lines,
            line_ending,
            trailing_newline,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(Self::parse(&content))
    }

    /// Same shape, new lines
    pub fn with_lines(&self, lines: Vec<String>) -> Self {
        Self {
            lines,
            line_ending: self.line_ending,
            trailing_newline: self.trailing_newline,
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join(self.line_ending.as_str());
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(self.line_ending.as_str());
        }
        out
    }

    /// Replace `path` with the rendered text
    ///
    /// Writes a temp file next to the target, then renames it over, so the
    /// target is either untouched or fully rewritten.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let permissions = fs::metadata(path).map(|m| m.permissions()).ok();

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| {
            Error::IoError(format!("Failed to create temp file in {}: {}", dir.display(), e))
        })?;
        temp.write_all(self.render().as_bytes())?;
        temp.as_file().sync_all()?;
        if let Some(permissions) = permissions {
            fs::set_permissions(temp.path(), permissions)?;
        }

        temp.persist(path).map_err(|e| {
            Error::IoError(format!("Failed to replace {}: {}", path.display(), e.error))
        })?;
        debug!("Wrote {} ({} lines)", path.display(), self.lines.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_lf() {
        let src = RecipeSource::parse("a\nb\n");
        assert_eq!(src.lines, vec!["a", "b"]);
        assert_eq!(src.line_ending, LineEnding::Lf);
        assert!(src.trailing_newline);
        assert_eq!(src.render(), "a\nb\n");
    }

    #[test]
    fn test_crlf_preserved() {
        let src = RecipeSource::parse("a\r\nb\r\n");
        assert_eq!(src.lines, vec!["a", "b"]);
        assert_eq!(src.line_ending, LineEnding::CrLf);
        let patched = src.with_lines(vec!["a".into(), "x".into(), "b".into()]);
        assert_eq!(patched.render(), "a\r\nx\r\nb\r\n");
    }

    #[test]
    fn test_no_trailing_newline() {
        let src = RecipeSource::parse("a\n\nb");
        assert_eq!(src.lines, vec!["a", "", "b"]);
        assert!(!src.trailing_newline);
        assert_eq!(src.render(), "a\n\nb");
    }

    #[test]
    fn test_empty() {
        let src = RecipeSource::parse("");
        assert!(src.lines.is_empty());
        assert_eq!(src.render(), "");
    }

    #[test]
    fn test_write_atomic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conanfile.py");
        fs::write(&path, "old\n").unwrap();

        RecipeSource::parse("new\r\n").write_atomic(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\r\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            RecipeSource::read(&dir.path().join("nope.py")),
            Err(Error::IoError(_))
        ));
    }
}
