//! Definition-start patterns.
//!
//! A user name fragment is spliced into nine dialect rules which are joined
//! into one anchored alternation. Makefile targets use a separate `^name:`
//! pattern. Every compiled regex is memoized in a [`PatternCache`] owned by
//! the [`PatternBuilder`], keyed by pattern class, case folding and wrapped
//! fragment.

use crate::error::{FindError, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::path::Path;

/// Name fragment used to recognise the start of *any* definition.
pub const ANY_NAME: &str = r"[\w\d_]+";

/// Placeholder replaced by the wrapped user fragment in rule templates.
const NAME: &str = "{name}";

/// One source-line grammar recognising a definition start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectRule {
    pub name: &'static str,
    template: &'static str,
}

impl DialectRule {
    /// Substitute an already-wrapped name fragment into this rule.
    pub fn expand(&self, wrapped: &str) -> String {
        self.template.replace(NAME, wrapped)
    }

    /// Compile this rule alone, anchored at line start.
    pub fn compile(&self, fragment: &str, ignore_case: bool) -> Result<Regex> {
        let source = format!("^{}", self.expand(&wrap_fragment(fragment)));
        build(&source, fragment, ignore_case)
    }
}

/// `var name =`
pub const JS_VAR: DialectRule = DialectRule {
    name: "js-var",
    template: "(var {name} ?=)",
};

/// `function name(`
pub const JS_FUNCTION: DialectRule = DialectRule {
    name: "js-function",
    template: r"(function {name} ?\()",
};

/// `def name(`
pub const PY_DEF: DialectRule = DialectRule {
    name: "py-def",
    template: r"(def {name} ?\()",
};

/// Indented `def name(` for methods and nested functions.
pub const PY_METHOD: DialectRule = DialectRule {
    name: "py-method",
    template: r"(([ \t]+)def {name} ?\()",
};

/// `name = lambda`
pub const PY_LAMBDA: DialectRule = DialectRule {
    name: "py-lambda",
    template: "({name} ?= ? lambda)",
};

/// `class name(`
pub const PY_CLASS: DialectRule = DialectRule {
    name: "py-class",
    template: r"(class {name} ?\()",
};

/// `function name {`
pub const SH_FUNCTION: DialectRule = DialectRule {
    name: "sh-function",
    template: r"(function {name} ?\{)",
};

/// `name() {`
pub const SH_PAREN: DialectRule = DialectRule {
    name: "sh-paren",
    template: r"({name}\(\) ?\{)",
};

/// `[type ]name(args) {`
pub const C_FUNCTION: DialectRule = DialectRule {
    name: "c-function",
    template: r"((\w{3,16} )?{name} ?\(([^\)]+)?\) ? \{)",
};

/// All general-dialect rules, in alternation order.
pub const DEFINITION_RULES: [DialectRule; 9] = [
    JS_VAR,
    JS_FUNCTION,
    PY_DEF,
    PY_METHOD,
    PY_LAMBDA,
    PY_CLASS,
    SH_FUNCTION,
    SH_PAREN,
    C_FUNCTION,
];

/// Which pattern pair a source is scanned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    General,
    Makefile,
}

impl Dialect {
    /// Pick the dialect from a source's display name.
    ///
    /// Only the final path component is considered; `Makefile`, `makefile`
    /// and friends select the Makefile dialect.
    pub fn from_display_name(name: &str) -> Self {
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);
        if file_name.eq_ignore_ascii_case("makefile") {
            Dialect::Makefile
        } else {
            Dialect::General
        }
    }
}

/// Cache key discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternClass {
    Definition,
    MakeTarget,
}

impl From<Dialect> for PatternClass {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::General => PatternClass::Definition,
            Dialect::Makefile => PatternClass::MakeTarget,
        }
    }
}

/// Compiled regexes keyed by class, case folding and wrapped fragment.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<(PatternClass, bool), HashMap<String, Regex>>,
}

impl PatternCache {
    pub fn get(&self, class: PatternClass, ignore_case: bool, wrapped: &str) -> Option<&Regex> {
        self.compiled.get(&(class, ignore_case))?.get(wrapped)
    }

    pub fn insert(
        &mut self,
        class: PatternClass,
        ignore_case: bool,
        wrapped: String,
        regex: Regex,
    ) {
        self.compiled
            .entry((class, ignore_case))
            .or_default()
            .insert(wrapped, regex);
    }

    pub fn len(&self) -> usize {
        self.compiled.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The generic/target pair a scanner needs for one dialect.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub dialect: Dialect,
    /// Matches the start of any definition.
    pub generic_start: Regex,
    /// Matches the start of a definition whose name matches the user fragment.
    pub target_start: Regex,
}

/// Builds and memoizes definition-start patterns.
#[derive(Debug)]
pub struct PatternBuilder {
    cache: PatternCache,
    ignore_case: bool,
}

impl Default for PatternBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternBuilder {
    /// Case-insensitive builder with an empty cache.
    pub fn new() -> Self {
        Self {
            cache: PatternCache::default(),
            ignore_case: true,
        }
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    /// Anchored alternation of every general-dialect rule around `fragment`.
    pub fn definition_pattern(&mut self, fragment: &str) -> Result<Regex> {
        self.compile_class(PatternClass::Definition, fragment)
    }

    /// `^fragment:` for Makefile targets.
    pub fn make_target_pattern(&mut self, fragment: &str) -> Result<Regex> {
        self.compile_class(PatternClass::MakeTarget, fragment)
    }

    /// Generic and target patterns for one dialect.
    pub fn pattern_set(&mut self, fragment: &str, dialect: Dialect) -> Result<PatternSet> {
        let class = PatternClass::from(dialect);
        let target_start = self.compile_class(class, fragment)?;
        Ok(PatternSet {
            dialect,
            generic_start: self.compile_class(class, ANY_NAME)?,
            target_start,
        })
    }

    /// Compile `fragment` for both dialects so errors surface before any
    /// input is read.
    pub fn validate(&mut self, fragment: &str) -> Result<()> {
        self.pattern_set(fragment, Dialect::General)?;
        self.pattern_set(fragment, Dialect::Makefile)?;
        Ok(())
    }

    fn compile_class(&mut self, class: PatternClass, fragment: &str) -> Result<Regex> {
        let wrapped = wrap_fragment(fragment);
        if let Some(cached) = self.cache.get(class, self.ignore_case, &wrapped) {
            return Ok(cached.clone());
        }

        // Report errors against the user's own text, not the composite.
        build(fragment, fragment, self.ignore_case)?;

        let source = match class {
            PatternClass::Definition => {
                let rules: Vec<String> = DEFINITION_RULES
                    .iter()
                    .map(|rule| rule.expand(&wrapped))
                    .collect();
                format!("^({})", rules.join("|"))
            }
            PatternClass::MakeTarget => format!("^{}:", wrapped),
        };
        log::debug!("Compiling {:?} pattern: {}", class, source);
        let regex = build(&source, fragment, self.ignore_case)?;
        self.cache.insert(class, self.ignore_case, wrapped, regex.clone());
        Ok(regex)
    }
}

/// Compile a plain user regex (contains, without, include, exclude).
pub fn compile_user(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FindError::invalid_pattern(pattern, e))
}

/// Widen a name fragment so it matches anywhere inside a name.
pub fn match_anywhere(fragment: &str) -> String {
    format!("(.+?{p}|{p}.+?)", p = fragment)
}

/// Parenthesize `fragment` unless it already is one balanced group.
pub fn wrap_fragment(fragment: &str) -> String {
    if is_single_group(fragment) {
        fragment.to_string()
    } else {
        format!("({})", fragment)
    }
}

fn is_single_group(fragment: &str) -> bool {
    if !(fragment.starts_with('(') && fragment.ends_with(')')) {
        return false;
    }
    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_class = false;
    for (i, ch) in fragment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == fragment.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn build(source: &str, fragment: &str, ignore_case: bool) -> Result<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| FindError::invalid_pattern(fragment, e))
}
