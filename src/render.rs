//! Renderers for definitions and the final summary.
//!
//! The colour renderer highlights signatures and bodies with `syntect`. The
//! syntax comes from the source's file name, then from the definition's
//! first line, and falls back to plain text.

use crate::record::Definition;
use colored::Colorize;
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const THEME: &str = "base16-ocean.dark";
const RESET: &str = "\x1b[0m";

/// How much of each definition to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMode {
    /// Content only: no header, no indentation.
    pub short: bool,
    /// Signature only.
    pub signature_only: bool,
}

/// Trait for rendering definitions into text.
pub trait Renderer {
    fn render(&self, def: &Definition) -> String;
    fn footer(&self, total: usize, maxcount: Option<usize>) -> String;
}

/// Create a renderer for the given mode.
pub fn create_renderer(mode: RenderMode, color: bool) -> Box<dyn Renderer> {
    if color {
        Box::new(ColorRenderer {
            mode,
            highlighter: Highlighter::new(),
        })
    } else {
        Box::new(PlainRenderer { mode })
    }
}

/// Signature as printed: trailing brace and whitespace removed.
fn display_signature(def: &Definition) -> &str {
    def.signature().trim_end_matches('{').trim_end()
}

fn plural(total: usize) -> &'static str {
    if total == 1 {
        " definition."
    } else {
        " definitions."
    }
}

pub struct PlainRenderer {
    mode: RenderMode,
}

impl Renderer for PlainRenderer {
    fn render(&self, def: &Definition) -> String {
        if self.mode.signature_only {
            let signature = display_signature(def);
            if self.mode.short {
                return signature.to_string();
            }
            return format!("{}\n    {}", header(def), signature);
        }
        if self.mode.short {
            return def.content(0);
        }
        format!("{}\n{}", header(def), def.content(4))
    }

    fn footer(&self, total: usize, maxcount: Option<usize>) -> String {
        let mut msg = format!("\nFound {}{}", total, plural(total));
        if maxcount == Some(total) {
            msg.push_str(" Max count was satisfied.");
        }
        msg
    }
}

fn header(def: &Definition) -> String {
    format!(
        "\n{} #{} (lines: {}):",
        def.display_source(),
        def.start_line(),
        def.line_count()
    )
}

/// Terminal syntax highlighting backed by syntect's bundled syntaxes.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let mut themes = ThemeSet::load_defaults();
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: themes.themes.remove(THEME).unwrap_or_default(),
        }
    }

    /// Syntax for `def`: by file name or extension, then by its first line.
    ///
    /// Standard input has no file name, so only the first line is used.
    fn syntax_for(&self, def: &Definition) -> &SyntaxReference {
        let by_name = if def.is_stdin() {
            None
        } else {
            let path = Path::new(def.source_id());
            let file_name = path.file_name().and_then(|n| n.to_str());
            let extension = path.extension().and_then(|e| e.to_str());
            file_name
                .and_then(|n| self.syntaxes.find_syntax_by_extension(n))
                .or_else(|| extension.and_then(|e| self.syntaxes.find_syntax_by_extension(e)))
        };
        let syntax = by_name
            .or_else(|| self.syntaxes.find_syntax_by_first_line(def.signature()))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        log::debug!("Using syntax: {}", syntax.name);
        syntax
    }

    /// Highlight `text` as code from `def`'s source.
    pub fn highlight(&self, def: &Definition, text: &str) -> String {
        let mut lines = HighlightLines::new(self.syntax_for(def), &self.theme);
        // Newline-aware syntaxes expect every line to end with `\n`.
        let text = format!("{}\n", text);
        let mut out = String::with_capacity(text.len() * 4);
        for line in LinesWithEndings::from(&text) {
            match lines.highlight_line(line, &self.syntaxes) {
                Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
                Err(err) => {
                    log::debug!("Highlighting failed, printing plain: {}", err);
                    out.push_str(line);
                }
            }
        }
        if out.ends_with('\n') {
            out.pop();
        }
        out.push_str(RESET);
        out
    }
}

pub struct ColorRenderer {
    mode: RenderMode,
    highlighter: Highlighter,
}

impl ColorRenderer {
    fn header(&self, def: &Definition) -> String {
        format!(
            "\n{} {}{} {}{}{}{}{}:",
            def.display_source().bright_blue(),
            "#".bright_blue(),
            def.start_line().to_string().blue().bold(),
            "(".bold(),
            "lines".cyan(),
            ": ".bold(),
            def.line_count().to_string().blue(),
            ")".bold(),
        )
    }
}

impl Renderer for ColorRenderer {
    fn render(&self, def: &Definition) -> String {
        if self.mode.signature_only {
            let signature = self.highlighter.highlight(def, display_signature(def));
            if self.mode.short {
                return signature;
            }
            return format!("{}\n    {}", self.header(def), signature);
        }
        if self.mode.short {
            return self.highlighter.highlight(def, &def.content(0));
        }
        format!(
            "{}\n{}",
            self.header(def),
            self.highlighter.highlight(def, &def.content(4))
        )
    }

    fn footer(&self, total: usize, maxcount: Option<usize>) -> String {
        let mut msg = format!(
            "{}{}{}",
            "\nFound ".cyan(),
            total.to_string().blue().bold(),
            plural(total).cyan()
        );
        if maxcount == Some(total) {
            msg.push_str(&format!(" {}", "Max count was satisfied.".cyan()));
        }
        msg
    }
}
