//! Locate function, class, shell function and Makefile target
//! definitions in source files using line-level heuristics.
//!
//! ```no_run
//! use findfunc::{scan, LineSource, PatternBuilder};
//!
//! let mut builder = PatternBuilder::new();
//! let source = LineSource::from_path("setup.py".as_ref())?;
//! let patterns = builder.pattern_set("main", source.dialect())?;
//! let (name, lines) = source.into_parts();
//! for def in scan(name, lines, &patterns) {
//!     println!("{}", def?.signature());
//! }
//! # Ok::<(), findfunc::FindError>(())
//! ```

pub mod error;
pub mod filter;
pub mod pattern;
pub mod record;
pub mod render;
pub mod scanner;
pub mod source;
pub mod walk;

pub use error::{FindError, Result};
pub use filter::{DefinitionFilter, LengthFilter, LengthOp};
pub use pattern::{Dialect, PatternBuilder, PatternSet};
pub use record::Definition;
pub use scanner::{scan, scan_str, Scanner};
pub use source::LineSource;
