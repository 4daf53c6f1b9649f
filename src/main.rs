//! findfunc: find function definitions and Makefile targets in files.
//!
//! The search is regex-based and depends on definitions starting on a new
//! line. Handles Python, JavaScript, shell, Make and C-like sources.
//!
//! - `findfunc PAT file.py dir/` searches files, walking directories
//! - `findfunc PAT < file.sh` reads standard input

use anyhow::{Context, Result};
use clap::Parser;
use findfunc::filter::DefinitionFilter;
use findfunc::pattern::{compile_user, match_anywhere};
use findfunc::render::{create_renderer, RenderMode, Renderer};
use findfunc::walk::{expand_inputs, walk_dir, Input, PathFilter};
use findfunc::{scan, Dialect, FindError, LengthFilter, LineSource, PatternBuilder};
use std::io::{self, IsTerminal, Write};
use std::ops::ControlFlow;
use std::path::Path;
use std::process::{self, ExitCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "findfunc",
    version,
    about = "Finds function definitions and Makefile targets in files",
    after_help = "Any file with a name like '[Mm]akefile' will trigger makefile-mode.\n\
                  That mode is never used for stdin data.\n\
                  Files that cannot be opened are skipped with a warning."
)]
struct Cli {
    /// Function name or regex pattern to search for.
    pattern: String,

    /// Files to search. Directories are walked. Default: stdin
    paths: Vec<String>,

    /// Match anywhere in the name, same as (.+?PAT|PAT.+?)
    #[arg(short = 'a', long)]
    any: bool,

    /// Always use color
    #[arg(long)]
    color: bool,

    /// Only show definitions that contain this pattern in the body
    #[arg(short = 'c', long, value_name = "PAT")]
    contains: Option<String>,

    /// Only show definitions that do not contain this pattern in the body.
    /// This cancels out any -c pattern.
    #[arg(short = 'C', long, value_name = "PAT")]
    without: Option<String>,

    /// Print debugging info while running
    #[arg(short = 'D', long)]
    debug: bool,

    /// Regex pattern to exclude file paths
    #[arg(short = 'e', long, value_name = "PAT")]
    exclude: Option<String>,

    /// Regex pattern to include file paths
    #[arg(short = 'f', long, value_name = "PAT")]
    filter: Option<String>,

    /// Match the name pattern case-sensitively
    #[arg(short = 'i', long)]
    case_sensitive: bool,

    /// Show definitions with this many lines: N, =N, ==N, >N, <N, >=N, <=N
    #[arg(short = 'l', long, value_name = "NUM")]
    length: Option<String>,

    /// Maximum number of definitions to show
    #[arg(short = 'm', long, value_name = "NUM")]
    maxcount: Option<String>,

    /// Just print the signatures found
    #[arg(short = 'S', long)]
    signature: bool,

    /// Use shorter output mode
    #[arg(short = 's', long)]
    short: bool,
}

/// Everything a search needs, validated before any input is read.
struct Options {
    builder: PatternBuilder,
    name_pattern: String,
    filter: DefinitionFilter,
    paths: PathFilter,
    maxcount: Option<usize>,
    mode: RenderMode,
    color: bool,
    renderer: Box<dyn Renderer>,
    /// Definitions printed so far, shared with the interrupt handler.
    printed: Arc<AtomicUsize>,
}

impl Options {
    fn from_cli(cli: &Cli, color: bool) -> findfunc::Result<Self> {
        let name_pattern = if cli.any {
            match_anywhere(&cli.pattern)
        } else {
            cli.pattern.clone()
        };
        let mut builder = PatternBuilder::new().with_ignore_case(!cli.case_sensitive);
        builder.validate(&name_pattern)?;

        let filter = DefinitionFilter {
            contains: optional(cli.contains.as_deref(), compile_user)?,
            without: optional(cli.without.as_deref(), compile_user)?,
            length: optional(cli.length.as_deref(), str::parse::<LengthFilter>)?,
        };
        let paths = PathFilter {
            include: optional(cli.filter.as_deref(), compile_user)?,
            exclude: optional(cli.exclude.as_deref(), compile_user)?,
        };
        let maxcount = optional(cli.maxcount.as_deref(), parse_count)?.filter(|&n| n > 0);

        log::debug!("Arguments:");
        log::debug!("  pattern    (PAT)        = {:?}", name_pattern);
        log::debug!("  contains   (--contains) = {:?}", filter.contains);
        log::debug!("  without    (--without)  = {:?}", filter.without);
        log::debug!("  length     (--length)   = {:?}", filter.length);
        log::debug!("  include    (--filter)   = {:?}", paths.include);
        log::debug!("  exclude    (--exclude)  = {:?}", paths.exclude);
        log::debug!("  maxcount   (--maxcount) = {:?}", maxcount);

        let mode = RenderMode {
            short: cli.short,
            signature_only: cli.signature,
        };
        Ok(Options {
            builder,
            name_pattern,
            filter,
            paths,
            maxcount,
            mode,
            color,
            renderer: create_renderer(mode, color),
            printed: Arc::new(AtomicUsize::new(0)),
        })
    }
}

/// Parse an optional argument; empty strings count as absent.
fn optional<T>(
    value: Option<&str>,
    parse: impl Fn(&str) -> findfunc::Result<T>,
) -> findfunc::Result<Option<T>> {
    match value {
        Some(s) if !s.is_empty() => parse(s).map(Some),
        _ => Ok(None),
    }
}

fn parse_count(s: &str) -> findfunc::Result<usize> {
    s.trim()
        .parse()
        .map_err(|_| FindError::InvalidNumber(s.to_string()))
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn use_color(forced: bool) -> bool {
    let color = forced
        || (io::stdout().is_terminal()
            && colored::control::SHOULD_COLORIZE.should_colorize());
    colored::control::set_override(color);
    color
}

/// On Ctrl-C, print the footer for what was found so far and exit with 2.
fn install_interrupt_handler(opts: &Options) -> Result<()> {
    let printed = Arc::clone(&opts.printed);
    let (mode, color) = (opts.mode, opts.color);
    ctrlc::set_handler(move || {
        let total = printed.load(Ordering::SeqCst);
        log::debug!("Interrupted after {} definition(s)", total);
        if !mode.short {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", create_renderer(mode, color).footer(total, None));
            let _ = out.flush();
        }
        eprintln!("\nUser cancelled.\n");
        process::exit(2);
    })
    .context("failed to install the Ctrl-C handler")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(total) if total > 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(err) if is_broken_pipe(&err) => {
            eprintln!("\nBroken pipe, input/output was interrupted.\n");
            ExitCode::from(3)
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

/// Search every input and print matches; returns the number printed.
fn run(cli: &Cli) -> Result<usize> {
    let color = use_color(cli.color);
    let mut opts = Options::from_cli(cli, color)?;
    let inputs = expand_inputs(&cli.paths)?;
    install_interrupt_handler(&opts)?;

    // Locked per write so the interrupt handler can still print the footer.
    let mut out = io::stdout();
    for input in &inputs {
        if search_input(&mut opts, input, &mut out)?.is_break() {
            break;
        }
    }

    let total = opts.printed.load(Ordering::SeqCst);
    if !opts.mode.short {
        writeln!(out, "{}", opts.renderer.footer(total, opts.maxcount))
            .context("failed to write output")?;
    }
    out.flush().context("failed to write output")?;
    Ok(total)
}

fn search_input(
    opts: &mut Options,
    input: &Input,
    out: &mut impl Write,
) -> Result<ControlFlow<()>> {
    match input {
        Input::Stdin => {
            log::debug!("Reading from: stdin");
            if io::stdin().is_terminal() && io::stdout().is_terminal() {
                eprintln!("\nReading from stdin until EOF (Ctrl + D)...\n");
            }
            search_source(opts, LineSource::stdin(), out)
        }
        Input::File(path) => search_path(opts, path, out),
        Input::Dir(dir) => {
            for path in walk_dir(dir) {
                if search_path(opts, &path, out)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
            Ok(ControlFlow::Continue(()))
        }
    }
}

fn search_path(
    opts: &mut Options,
    path: &Path,
    out: &mut impl Write,
) -> Result<ControlFlow<()>> {
    if !opts.paths.allows(path) {
        return Ok(ControlFlow::Continue(()));
    }
    match LineSource::from_path(path) {
        Ok(source) => search_source(opts, source, out),
        Err(FindError::Open { path, source }) => {
            log::warn!("skipping {}: {}", path.display(), source);
            Ok(ControlFlow::Continue(()))
        }
        Err(err) => Err(err.into()),
    }
}

fn search_source(
    opts: &mut Options,
    source: LineSource,
    out: &mut impl Write,
) -> Result<ControlFlow<()>> {
    let patterns = opts.builder.pattern_set(&opts.name_pattern, source.dialect())?;
    if patterns.dialect == Dialect::Makefile {
        log::debug!("Using makefile mode: {}", source.name());
    }

    let (name, lines) = source.into_parts();
    for item in scan(name, lines, &patterns) {
        let def = match item {
            Ok(def) => def,
            Err(FindError::Read { source_id, source }) => {
                log::debug!("Skipping file: {}", source_id);
                log::debug!("  Message: {}", source);
                break;
            }
            Err(err) => return Err(err.into()),
        };
        if !opts.filter.accepts(&def) {
            continue;
        }
        writeln!(out, "{}", opts.renderer.render(&def)).context("failed to write output")?;
        let total = opts.printed.fetch_add(1, Ordering::SeqCst) + 1;
        if opts.maxcount == Some(total) {
            log::debug!("Stopping at max count: {}", total);
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}
