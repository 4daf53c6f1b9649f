//! Resolving path arguments into scan inputs.

use crate::error::{FindError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One path argument after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
    Dir(PathBuf),
}

/// Include/exclude regexes matched anywhere in a file path.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
}

impl PathFilter {
    pub fn allows(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        let included = self.include.as_ref().map_or(true, |re| re.is_match(&text));
        let excluded = self.exclude.as_ref().is_some_and(|re| re.is_match(&text));
        if !included || excluded {
            log::debug!("Skipping filtered file: {}", text);
            return false;
        }
        true
    }
}

/// Resolve CLI path arguments, in order. No arguments means stdin.
///
/// Arguments that name nothing on disk but look like globs are expanded.
pub fn expand_inputs(args: &[String]) -> Result<Vec<Input>> {
    if args.is_empty() {
        return Ok(vec![Input::Stdin]);
    }
    let mut inputs = Vec::new();
    for arg in args {
        if arg == "-" {
            inputs.push(Input::Stdin);
            continue;
        }
        let path = Path::new(arg);
        if path.is_dir() {
            inputs.push(Input::Dir(path.to_path_buf()));
            continue;
        }
        if path.exists() || !is_glob(arg) {
            inputs.push(Input::File(path.to_path_buf()));
            continue;
        }
        let mut matches: Vec<PathBuf> = glob::glob(arg)
            .map_err(|source| FindError::InvalidGlob {
                pattern: arg.clone(),
                source,
            })?
            .filter_map(|r| r.ok())
            .collect();
        if matches.is_empty() {
            log::warn!("no files matched: {}", arg);
        }
        matches.sort();
        matches.dedup();
        inputs.extend(matches.into_iter().map(|p| {
            if p.is_dir() {
                Input::Dir(p)
            } else {
                Input::File(p)
            }
        }));
    }
    Ok(inputs)
}

/// Every regular file below `root`, in sorted order.
pub fn walk_dir(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
}

fn is_glob(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg").join("sub")).unwrap();
        fs::write(dir.path().join("pkg").join("a.py"), "def a():\n").unwrap();
        fs::write(dir.path().join("pkg").join("sub").join("b.sh"), "b() {\n}\n").unwrap();
        fs::write(dir.path().join("Makefile"), "all:\n").unwrap();
        dir
    }

    #[test]
    fn no_args_means_stdin() {
        assert_eq!(expand_inputs(&[]).unwrap(), [Input::Stdin]);
        assert_eq!(expand_inputs(&["-".to_string()]).unwrap(), [Input::Stdin]);
    }

    #[test]
    fn files_and_dirs_are_classified() {
        let dir = create_test_dir();
        let args = vec![
            dir.path().join("pkg").to_string_lossy().to_string(),
            dir.path().join("Makefile").to_string_lossy().to_string(),
            dir.path().join("missing.py").to_string_lossy().to_string(),
        ];
        let inputs = expand_inputs(&args).unwrap();
        assert_eq!(
            inputs,
            [
                Input::Dir(dir.path().join("pkg")),
                Input::File(dir.path().join("Makefile")),
                Input::File(dir.path().join("missing.py")),
            ]
        );
    }

    #[test]
    fn globs_are_expanded() {
        let dir = create_test_dir();
        let pattern = format!("{}/pkg/*", dir.path().display());
        let inputs = expand_inputs(&[pattern]).unwrap();
        assert_eq!(
            inputs,
            [
                Input::File(dir.path().join("pkg").join("a.py")),
                Input::Dir(dir.path().join("pkg").join("sub")),
            ]
        );
    }

    #[test]
    fn walk_is_recursive_and_sorted() {
        let dir = create_test_dir();
        let files: Vec<_> = walk_dir(dir.path()).collect();
        assert_eq!(
            files,
            [
                dir.path().join("Makefile"),
                dir.path().join("pkg").join("a.py"),
                dir.path().join("pkg").join("sub").join("b.sh"),
            ]
        );
    }

    #[test]
    fn path_filter_exclude_wins() {
        let filter = PathFilter {
            include: Some(Regex::new(r"\.py$").unwrap()),
            exclude: Some(Regex::new("test_").unwrap()),
        };
        assert!(filter.allows(Path::new("src/a.py")));
        assert!(!filter.allows(Path::new("src/a.sh")));
        assert!(!filter.allows(Path::new("src/test_a.py")));
        assert!(PathFilter::default().allows(Path::new("anything")));
    }
}
