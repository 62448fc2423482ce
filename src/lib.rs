//! Glue between the filesystem and shim generation: locating a package,
//! loading its sources, and reading `goshim.toml`.

pub mod config;
pub mod load;
pub mod resolve;

use std::path::Path;

use goshim_reexport::{generate_with_options, GenerateOptions};

pub use config::{ConfigError, Defaults, GoshimConfig, ShimEntry};
pub use load::{load_package, LoadError};
pub use resolve::{resolve_import_path, resolve_target, ResolveError, Target};

/// Load the package in `dir` and generate its shim.
pub fn generate_for_dir(
    dir: &Path,
    import_path: &str,
    options: &GenerateOptions,
) -> anyhow::Result<String> {
    let package = load_package(dir)?;
    tracing::info!(package = %package.name, import_path, "generating shim");
    Ok(generate_with_options(&package, import_path, options)?)
}
