//! Import path resolution for a package directory.
//!
//! A directory inside a module (a `go.mod` in it or any ancestor) is imported
//! as the module path plus its path relative to the module root. Otherwise
//! the GOPATH convention applies: `$GOPATH/src/<import path>`.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("GOPATH not provided")]
    NoGoPath,
    #[error("module file parse failed: {path}: no module directive")]
    ModuleFile { path: String },
    #[error("dir is just GOPATH")]
    JustGoPath,
    #[error("dir not in GOPATH, and has no readable go.mod in it")]
    NotInGoPath,
    #[error("both --dir and --pkg are not provided")]
    NoTarget,
    #[error("failed to resolve {0}: {1}")]
    Io(String, String),
}

/// A package to shim: where its sources are and how it is imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub dir: PathBuf,
    pub import_path: String,
}

/// Complete a `--dir`/`--pkg` pair. A missing directory is derived from
/// GOPATH, a missing import path from the directory.
pub fn resolve_target(dir: Option<&Path>, pkg: Option<&str>) -> Result<Target, ResolveError> {
    resolve_target_with(dir, pkg, env::var_os("GOPATH").as_deref())
}

pub fn resolve_target_with(
    dir: Option<&Path>,
    pkg: Option<&str>,
    gopath: Option<&OsStr>,
) -> Result<Target, ResolveError> {
    let pkg = pkg.filter(|p| !p.is_empty());
    let dir = dir.filter(|d| !d.as_os_str().is_empty());
    match (dir, pkg) {
        (None, None) => Err(ResolveError::NoTarget),
        (Some(dir), Some(pkg)) => Ok(Target {
            dir: dir.to_path_buf(),
            import_path: pkg.to_string(),
        }),
        (None, Some(pkg)) => Ok(Target {
            dir: package_dir_with(pkg, gopath)?,
            import_path: pkg.to_string(),
        }),
        (Some(dir), None) => Ok(Target {
            dir: dir.to_path_buf(),
            import_path: resolve_import_path_with(dir, gopath)?,
        }),
    }
}

/// Resolve the import path of the package in `dir`, reading `GOPATH` from
/// the environment when no `go.mod` applies.
pub fn resolve_import_path(dir: &Path) -> Result<String, ResolveError> {
    resolve_import_path_with(dir, env::var_os("GOPATH").as_deref())
}

pub fn resolve_import_path_with(
    dir: &Path,
    gopath: Option<&OsStr>,
) -> Result<String, ResolveError> {
    let dir = fs::canonicalize(dir)
        .map_err(|e| {
            ResolveError::Io(dir.display().to_string(), e.to_string())
        })?;

    for root in dir.ancestors() {
        let mod_path = root.join("go.mod");
        let Ok(text) = fs::read_to_string(&mod_path) else {
            continue;
        };
        let module = parse_module_path(&text).ok_or_else(|| ResolveError::ModuleFile {
            path: mod_path.display().to_string(),
        })?;
        let rel = slash_path(dir.strip_prefix(root).unwrap_or(Path::new("")));
        tracing::debug!(go_mod = %mod_path.display(), module = %module, "resolved module root");
        return Ok(if rel.is_empty() {
            module
        } else {
            format!("{module}/{rel}")
        });
    }

    in_gopath(&dir, gopath)
}

fn in_gopath(dir: &Path, gopath: Option<&OsStr>) -> Result<String, ResolveError> {
    let gopath = gopath.filter(|g| !g.is_empty()).ok_or(ResolveError::NoGoPath)?;
    for entry in env::split_paths(gopath) {
        let src = entry.join("src");
        let src = fs::canonicalize(&src).unwrap_or(src);
        if let Ok(rel) = dir.strip_prefix(&src) {
            let pkg = slash_path(rel);
            if pkg.is_empty() {
                return Err(ResolveError::JustGoPath);
            }
            return Ok(pkg);
        }
    }
    Err(ResolveError::NotInGoPath)
}

/// Directory of `import_path` in the first GOPATH entry.
pub fn package_dir(import_path: &str) -> Result<PathBuf, ResolveError> {
    package_dir_with(import_path, env::var_os("GOPATH").as_deref())
}

pub fn package_dir_with(
    import_path: &str,
    gopath: Option<&OsStr>,
) -> Result<PathBuf, ResolveError> {
    let gopath = gopath.filter(|g| !g.is_empty()).ok_or(ResolveError::NoGoPath)?;
    let first = env::split_paths(gopath).next().ok_or(ResolveError::NoGoPath)?;
    let mut dir = first.join("src");
    dir.extend(import_path.split('/').filter(|s| !s.is_empty()));
    Ok(dir)
}

/// The module path declared by a `go.mod` file.
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    for line in go_mod.lines() {
        let line = match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        };
        let Some(rest) = line.trim().strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_whitespace() || c == '"' || c == '`') {
            continue;
        }
        let rest = rest.trim();
        let path = if rest.starts_with('"') || rest.starts_with('`') {
            if rest.len() < 2 || !rest.ends_with(&rest[..1]) {
                return None;
            }
            goshim_syntax::unquote(rest)
        } else {
            rest.to_string()
        };
        if path.is_empty() || path.contains(char::is_whitespace) {
            return None;
        }
        return Some(path);
    }
    None
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_parse_module_path() {
        assert_eq!(
            parse_module_path("module example.com/foo\n\ngo 1.22\n").as_deref(),
            Some("example.com/foo")
        );
        assert_eq!(
            parse_module_path("// comment\nmodule \"example.com/quoted\" // trailing\n").as_deref(),
            Some("example.com/quoted")
        );
        assert_eq!(parse_module_path("go 1.21\nrequire x v1.0.0\n"), None);
        assert_eq!(parse_module_path("modules example.com/x\n"), None);
        assert_eq!(parse_module_path("module \"unterminated\n"), None);
    }

    #[test]
    fn test_go_mod_in_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("go.mod"), "module example.com/root\n").unwrap();
        assert_eq!(
            resolve_import_path_with(tmp.path(), None).unwrap(),
            "example.com/root"
        );
    }

    #[test]
    fn test_go_mod_in_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("go.mod"), "module example.com/root\n").unwrap();
        let nested = tmp.path().join("internal").join("geom");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(
            resolve_import_path_with(&nested, None).unwrap(),
            "example.com/root/internal/geom"
        );
    }

    #[test]
    fn test_invalid_go_mod_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("go.mod"), "go 1.22\n").unwrap();
        let err = resolve_import_path_with(tmp.path(), None).unwrap_err();
        assert!(err.to_string().starts_with("module file parse failed"));
    }

    #[test]
    fn test_gopath_fallback() {
        let gopath = tempfile::tempdir().unwrap();
        let pkg = gopath.path().join("src").join("github.com").join("me").join("geom");
        fs::create_dir_all(&pkg).unwrap();
        let gp = OsString::from(gopath.path());
        assert_eq!(
            resolve_import_path_with(&pkg, Some(gp.as_os_str())).unwrap(),
            "github.com/me/geom"
        );
        let src = gopath.path().join("src");
        let err = resolve_import_path_with(&src, Some(gp.as_os_str())).unwrap_err();
        assert!(matches!(err, ResolveError::JustGoPath));
    }

    #[test]
    fn test_gopath_list_and_missing() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let pkg = second.path().join("src").join("lib");
        fs::create_dir_all(&pkg).unwrap();
        let gp = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(
            resolve_import_path_with(&pkg, Some(gp.as_os_str())).unwrap(),
            "lib"
        );

        let outside = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_import_path_with(outside.path(), Some(gp.as_os_str())),
            Err(ResolveError::NotInGoPath)
        ));
        assert!(matches!(
            resolve_import_path_with(outside.path(), None),
            Err(ResolveError::NoGoPath)
        ));
    }

    #[test]
    fn test_package_dir() {
        let gp = OsString::from("/go");
        assert_eq!(
            package_dir_with("github.com/me/geom", Some(gp.as_os_str())).unwrap(),
            Path::new("/go/src/github.com/me/geom")
        );
        assert!(matches!(
            package_dir_with("x", None),
            Err(ResolveError::NoGoPath)
        ));
    }

    #[test]
    fn test_resolve_target() {
        assert!(matches!(
            resolve_target_with(None, None, None),
            Err(ResolveError::NoTarget)
        ));
        assert!(matches!(
            resolve_target_with(Some(Path::new("")), Some(""), None),
            Err(ResolveError::NoTarget)
        ));

        let gp = OsString::from("/go");
        let gopath = Some(gp.as_os_str());
        let target = resolve_target_with(None, Some("example.com/geom"), gopath).unwrap();
        assert_eq!(target.dir, Path::new("/go/src/example.com/geom"));
        assert_eq!(target.import_path, "example.com/geom");

        let both = resolve_target_with(
            Some(Path::new("vendor/geom")),
            Some("example.com/geom"),
            None,
        )
        .unwrap();
        assert_eq!(both.dir, Path::new("vendor/geom"));

        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("go.mod"), "module example.com/root\n").unwrap();
        let derived = resolve_target_with(Some(tmp.path()), None, None).unwrap();
        assert_eq!(derived.import_path, "example.com/root");
    }
}
