//! Definition boundary scanner: a line-by-line state machine.
//!
//! Two states: outside any definition, or inside one while accumulating its
//! body. A definition ends at a sibling start (a generic definition start no
//! deeper than the open one), at a column-zero line for non-braced bodies, or
//! at a column-zero `}` for braced bodies. Input is consumed lazily; dropping
//! the scanner stops reading.

use crate::error::{FindError, Result};
use crate::pattern::PatternSet;
use crate::record::{indent_width, Definition, DefinitionBuilder};
use std::io;

enum State {
    Outside,
    Inside(DefinitionBuilder),
}

/// Outcome of feeding one line to the state machine.
enum Step {
    Continue,
    Yield(Definition),
    /// Yield, then feed the same line again while outside.
    YieldAndReplay(Definition),
}

/// Lazy iterator of definitions over a fallible line stream.
pub struct Scanner<I> {
    source_id: String,
    lines: I,
    patterns: PatternSet,
    state: State,
    lineno: usize,
    done: bool,
}

/// Scan `lines` from the source named `source_id`.
///
/// Lines may keep their line terminators; trailing whitespace is ignored.
pub fn scan<I>(source_id: impl Into<String>, lines: I, patterns: &PatternSet) -> Scanner<I::IntoIter>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    Scanner {
        source_id: source_id.into(),
        lines: lines.into_iter(),
        patterns: patterns.clone(),
        state: State::Outside,
        lineno: 0,
        done: false,
    }
}

/// Scan an in-memory string.
pub fn scan_str<'a>(
    source_id: impl Into<String>,
    text: &'a str,
    patterns: &PatternSet,
) -> Scanner<impl Iterator<Item = io::Result<String>> + 'a> {
    scan(source_id, text.lines().map(|l| Ok(l.to_string())), patterns)
}

impl<I> Scanner<I> {
    fn step(&mut self, line: &str) -> Step {
        let state = std::mem::replace(&mut self.state, State::Outside);
        match state {
            State::Outside => {
                self.open_if_target(line);
                Step::Continue
            }
            State::Inside(mut def) => {
                let child_indent = indent_width(line) > def.indent_level();

                if self.patterns.generic_start.is_match(line) && !child_indent {
                    log::debug!("Found start of another def: {:?}", line);
                    self.open_if_target(line);
                    return Step::Yield(def.finish());
                }

                if !line.is_empty() && !line.starts_with([' ', '\t']) {
                    if def.signature().ends_with('{') {
                        if line.starts_with('}') {
                            log::debug!("Found end of braced def: {:?}", line);
                            def.push_line(line);
                            return Step::Yield(def.finish());
                        }
                    } else if line == "{" {
                        def.append_signature(" {");
                        self.state = State::Inside(def);
                        return Step::Continue;
                    } else {
                        log::debug!("Found end of non-braced def: {:?}", line);
                        return Step::YieldAndReplay(def.finish());
                    }
                }

                def.push_line(line);
                self.state = State::Inside(def);
                Step::Continue
            }
        }
    }

    fn open_if_target(&mut self, line: &str) {
        if self.patterns.target_start.is_match(line) {
            log::debug!("Found start of def: {:?}", line);
            self.state = State::Inside(DefinitionBuilder::new(
                self.source_id.as_str(),
                self.lineno,
                line,
            ));
        }
    }
}

impl<I> Iterator for Scanner<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<Definition>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(source)) => {
                    // The open definition is incomplete and unreliable; drop it.
                    self.done = true;
                    self.state = State::Outside;
                    return Some(Err(FindError::Read {
                        source_id: self.source_id.clone(),
                        source,
                    }));
                }
                None => {
                    self.done = true;
                    return match std::mem::replace(&mut self.state, State::Outside) {
                        State::Inside(def) => Some(Ok(def.finish())),
                        State::Outside => None,
                    };
                }
            };
            self.lineno += 1;
            let line = line.trim_end();
            match self.step(line) {
                Step::Continue => {}
                Step::Yield(def) => return Some(Ok(def)),
                Step::YieldAndReplay(def) => {
                    self.open_if_target(line);
                    return Some(Ok(def));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Dialect, PatternBuilder};

    fn find(input: &str, pattern: &str, dialect: Dialect) -> Vec<Definition> {
        let patterns = PatternBuilder::new().pattern_set(pattern, dialect).unwrap();
        scan_str("test", input, &patterns)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn find_general(input: &str, pattern: &str) -> Vec<Definition> {
        find(input, pattern, Dialect::General)
    }

    #[test]
    fn python_sibling_ends_definition() {
        let defs = find_general("def foo():\n    return 1\ndef bar():\n    return 2\n", "foo");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].signature(), "def foo():");
        assert_eq!(defs[0].lines(), ["def foo():", "    return 1"]);
        assert_eq!(defs[0].start_line(), 1);
    }

    #[test]
    fn makefile_targets() {
        let input = "build:\n\tgcc main.c\n\ntest:\n\techo test\n";
        let defs = find(input, ".+", Dialect::Makefile);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].signature(), "build:");
        assert_eq!(defs[0].lines(), ["build:", "    gcc main.c", ""]);
        assert_eq!(defs[1].signature(), "test:");
        assert_eq!(defs[1].start_line(), 4);
    }

    #[test]
    fn c_function_ends_at_closing_brace() {
        let defs = find_general("int add(int a, int b) {\n    return a + b;\n}\n", "add");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].line_count(), 3);
        assert!(defs[0].lines().last().unwrap().starts_with('}'));
    }

    #[test]
    fn shell_function_keyword() {
        let defs = find_general("function greet {\n    echo hi\n}\n", "greet");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].lines(), ["function greet {", "    echo hi", "}"]);
    }

    #[test]
    fn dedent_line_is_rescanned() {
        let input = "x = 1\nfoo_a = lambda: 1\nfoo_b.x = 2\nfoo_c = lambda: 3\n";
        // `foo_b.x = 2` ends foo_a without being a generic start.
        let defs = find_general(input, "foo_.");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].signature(), "foo_a = lambda: 1");
        assert_eq!(defs[1].signature(), "foo_c = lambda: 3");
    }

    #[test]
    fn dedent_line_can_open_target() {
        // `.PHONY:` is no generic target but matches `.+`.
        let input = "all:\n\tmake build\n.PHONY: all\n";
        let defs = find(input, ".+", Dialect::Makefile);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].lines(), ["all:", "    make build"]);
        assert_eq!(defs[1].signature(), ".PHONY: all");
        assert_eq!(defs[1].start_line(), 3);
    }

    #[test]
    fn braced_body_keeps_dedented_lines() {
        let input = "function f() {\n    a();\n#ifdef X\n    b();\n}\nrest();\n";
        let defs = find_general(input, "f");
        assert_eq!(defs.len(), 1);
        assert_eq!(
            defs[0].lines(),
            ["function f() {", "    a();", "#ifdef X", "    b();", "}"]
        );
    }

    #[test]
    fn deferred_brace_merges_into_signature() {
        let input = "function greet(name)\n{\n    return name;\n}\nother();\n";
        let defs = find_general(input, "greet");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].signature(), "function greet(name) {");
        assert_eq!(
            defs[0].lines(),
            ["function greet(name) {", "    return name;", "}"]
        );
    }

    #[test]
    fn nested_definitions_do_not_truncate() {
        let input = "\
def outer():
    def inner():
        return 1
    return inner()

def other():
    pass
";
        let defs = find_general(input, "outer");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].line_count(), 5);
        assert_eq!(defs[0].lines()[3], "    return inner()");
    }

    #[test]
    fn nested_method_is_found_and_ends_at_sibling() {
        let input = "\
class A(object):
    def one(self):
        return 1

    def two(self):
        return 2
";
        let defs = find_general(input, "one");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].indent_level(), 4);
        assert_eq!(defs[0].lines(), ["def one(self):", "    return 1", ""]);
        assert_eq!(defs[0].start_line(), 2);
    }

    #[test]
    fn sibling_matching_target_opens_new_record() {
        let input = "def foo_a():\n    pass\ndef foo_b():\n    pass\n";
        let defs = find_general(input, "foo_.");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].start_line(), 3);
    }

    #[test]
    fn unterminated_definition_is_yielded() {
        let defs = find_general("int main() {\n    return 0;\n", "main");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].line_count(), 2);
    }

    #[test]
    fn mixed_tabs_and_spaces() {
        let input = "class A(object):\n\tdef one(self):\n\t\treturn 1\n    def two(self):\n        pass\n";
        let defs = find_general(input, "one");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].lines(), ["def one(self):", "    return 1"]);
    }

    #[test]
    fn every_record_has_lines() {
        let input = "def a():\ndef b():\n}\n{\nfunction c {\n";
        for def in find_general(input, ".+") {
            assert!(def.line_count() >= 1);
        }
    }

    #[test]
    fn read_error_stops_stream() {
        let patterns = PatternBuilder::new()
            .pattern_set("foo", Dialect::General)
            .unwrap();
        let lines = vec![
            Ok("def foo():".to_string()),
            Ok("    pass".to_string()),
            Ok("def foo():".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8")),
            Ok("    more".to_string()),
        ];
        let mut scanner = scan("a.py", lines, &patterns);
        assert_eq!(scanner.next().unwrap().unwrap().line_count(), 2);
        assert!(matches!(scanner.next(), Some(Err(FindError::Read { .. }))));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn scanning_is_lazy() {
        let patterns = PatternBuilder::new()
            .pattern_set("f.", Dialect::General)
            .unwrap();
        let mut consumed = 0;
        let lines = ["def f1():", "    pass", "def f2():", "    pass", "def f3():"]
            .iter()
            .inspect(|_| consumed += 1)
            .map(|l| Ok(l.to_string()));
        let first = scan("a.py", lines, &patterns).next();
        assert!(first.is_some());
        assert_eq!(consumed, 3);
    }
}
