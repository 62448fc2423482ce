//! Loading the Go package in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use goshim_syntax::{parse_file, Package, ParseError};
use indexmap::IndexSet;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {0}: {1}")]
    Io(String, String),
    #[error("parse error in {path}: {error}")]
    Parse {
        path: String,
        source_code: String,
        error: ParseError,
    },
    #[error("no Go package in {0}")]
    NoPackage(String),
    #[error("{} packages in {dir}, unexpected ({})", names.len(), names.join(", "))]
    MultiplePackages { dir: String, names: Vec<String> },
}

/// Parse the package in `dir`.
///
/// Only the directory itself is read. `_test.go` files and files Go ignores
/// (names starting with `.` or `_`) are skipped; the remaining files are
/// parsed in name order and must all declare the same package.
pub fn load_package(dir: &Path) -> Result<Package, LoadError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_go_source(path))
        .collect();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    let mut names: IndexSet<String> = IndexSet::new();
    for path in &paths {
        let src = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        tracing::debug!(path = %path.display(), "parsing");
        let file = parse_file(&src).map_err(|error| LoadError::Parse {
            path: path.display().to_string(),
            source_code: src.clone(),
            error,
        })?;
        names.insert(file.package.name.clone());
        files.push(file);
    }

    match names.len() {
        0 => Err(LoadError::NoPackage(dir.display().to_string())),
        1 => {
            let name = names.swap_remove_index(0).unwrap_or_default();
            Ok(Package::new(name, files))
        }
        _ => Err(LoadError::MultiplePackages {
            dir: dir.display().to_string(),
            names: names.into_iter().collect(),
        }),
    }
}

fn io_err(path: &Path, e: std::io::Error) -> LoadError {
    LoadError::Io(path.display().to_string(), e.to_string())
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file()
        && name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}
