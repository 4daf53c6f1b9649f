//! Definition records.
//!
//! A [`DefinitionBuilder`] accumulates lines while the scanner is inside a
//! definition and is turned into an immutable [`Definition`] when yielded.

use crate::error::Result;
use crate::pattern::compile_user;
use regex::Regex;

/// Spaces substituted for each leading tab.
pub const TAB_WIDTH: usize = 4;

/// Display names treated as standard input.
pub const STDIN_MARKERS: &[&str] = &["<stdin>", "-", "stdin"];

/// Expand leading tabs to [`TAB_WIDTH`] spaces, leaving the rest untouched.
pub fn expand_tabs(line: &str) -> String {
    let rest = line.trim_start_matches([' ', '\t']);
    let lead = &line[..line.len() - rest.len()];
    if !lead.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + lead.len() * TAB_WIDTH);
    for ch in lead.chars() {
        if ch == '\t' {
            out.push_str(&" ".repeat(TAB_WIDTH));
        } else {
            out.push(ch);
        }
    }
    out.push_str(rest);
    out
}

/// Leading-whitespace width of `line` after tab expansion.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// One discovered definition: signature plus body, relative to its own indent.
#[derive(Debug, Clone)]
pub struct Definition {
    source_id: String,
    start_line: usize,
    indent_level: usize,
    lines: Vec<String>,
}

impl Definition {
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Name shown to users: `stdin` for standard input markers.
    pub fn display_source(&self) -> &str {
        if self.is_stdin() {
            "stdin"
        } else {
            &self.source_id
        }
    }

    pub fn is_stdin(&self) -> bool {
        STDIN_MARKERS.contains(&self.source_id.as_str())
    }

    /// 1-based line number of the signature.
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// First line of the definition, de-indented.
    pub fn signature(&self) -> &str {
        &self.lines[0]
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    /// All stored lines, signature first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// True if any stored line matches `pattern`.
    pub fn contains(&self, pattern: &Regex) -> bool {
        self.lines.iter().any(|line| pattern.is_match(line))
    }

    /// Like [`Definition::contains`] for an uncompiled pattern.
    pub fn contains_str(&self, pattern: &str) -> Result<bool> {
        Ok(self.contains(&compile_user(pattern)?))
    }

    /// Body joined with newlines, every line prefixed by `indent` spaces.
    pub fn content(&self, indent: usize) -> String {
        let spaces = " ".repeat(indent);
        self.lines
            .iter()
            .map(|line| format!("{}{}", spaces, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// In-progress definition owned by the scanner.
#[derive(Debug)]
pub struct DefinitionBuilder {
    source_id: String,
    start_line: usize,
    indent_level: usize,
    lines: Vec<String>,
}

impl DefinitionBuilder {
    /// Start a definition from its signature line.
    ///
    /// The indent level is fixed here, from the tab-expanded signature.
    pub fn new(source_id: impl Into<String>, start_line: usize, signature: &str) -> Self {
        let signature = expand_tabs(signature.trim_end());
        let indent_level = indent_width(&signature);
        Self {
            source_id: source_id.into(),
            start_line,
            indent_level,
            lines: vec![signature[indent_level..].to_string()],
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn signature(&self) -> &str {
        &self.lines[0]
    }

    /// Append a body line, removing up to `indent_level` leading spaces.
    pub fn push_line(&mut self, line: &str) {
        let line = expand_tabs(line.trim_end());
        let strip = indent_width(&line).min(self.indent_level);
        self.lines.push(line[strip..].to_string());
    }

    /// Append text to the signature, e.g. a brace found on the next line.
    pub fn append_signature(&mut self, text: &str) {
        self.lines[0].push_str(text);
    }

    pub fn finish(self) -> Definition {
        Definition {
            source_id: self.source_id,
            start_line: self.start_line,
            indent_level: self.indent_level,
            lines: self.lines,
        }
    }
}
