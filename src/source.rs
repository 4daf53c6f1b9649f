//! Named line sources: files, standard input, or any reader.

use crate::error::{FindError, Result};
use crate::pattern::Dialect;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Display name used for standard input.
pub const STDIN_NAME: &str = "<stdin>";

/// An ordered stream of lines plus the name records are attributed to.
pub struct LineSource {
    name: String,
    reader: Box<dyn BufRead>,
}

impl LineSource {
    /// Open a file for line-by-line reading.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| FindError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(path.to_string_lossy(), file))
    }

    /// Standard input; always scanned with the general dialect.
    pub fn stdin() -> Self {
        Self {
            name: STDIN_NAME.to_string(),
            reader: Box::new(io::stdin().lock()),
        }
    }

    pub fn from_reader(name: impl Into<String>, reader: impl Read + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(BufReader::new(reader)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_display_name(&self.name)
    }

    /// Split into the display name and a lazy line iterator.
    ///
    /// Invalid UTF-8 surfaces as an `InvalidData` error item.
    pub fn into_parts(self) -> (String, io::Lines<Box<dyn BufRead>>) {
        (self.name, self.reader.lines())
    }
}

impl fmt::Debug for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_source_yields_lines() {
        let source = LineSource::from_reader("x.py", Cursor::new("a\r\nb\n"));
        assert_eq!(source.dialect(), Dialect::General);
        let (name, lines) = source.into_parts();
        assert_eq!(name, "x.py");
        let lines: Vec<String> = lines.map(|l| l.unwrap()).collect();
        assert_eq!(lines, ["a", "b"]);
    }

    #[test]
    fn makefile_source_dialect() {
        let source = LineSource::from_reader("dir/GNUmakefile", Cursor::new(""));
        assert_eq!(source.dialect(), Dialect::General);
        let source = LineSource::from_reader("dir/Makefile", Cursor::new(""));
        assert_eq!(source.dialect(), Dialect::Makefile);
    }

    #[test]
    fn invalid_utf8_is_an_error_item() {
        let source = LineSource::from_reader("bin", Cursor::new(vec![b'o', b'k', b'\n', 0xff, b'\n']));
        let (_, mut lines) = source.into_parts();
        assert_eq!(lines.next().unwrap().unwrap(), "ok");
        let err = lines.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = LineSource::from_path(Path::new("/nonexistent/findfunc/x.py")).unwrap_err();
        assert!(matches!(err, FindError::Open { .. }));
    }

    #[test]
    fn debug_shows_name_only() {
        let source = LineSource::from_reader("a.sh", Cursor::new("echo\n"));
        assert_eq!(format!("{source:?}"), r#"LineSource { name: "a.sh", .. }"#);
    }
}
