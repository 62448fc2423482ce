//! Shim package generation for Go.
//!
//! Given a parsed Go package and its import path, [`generate`] produces the
//! source of a package that re-declares every exported symbol of the original
//! as a forwarding declaration through an aliased import:
//!
//! ```text
//! const Pi = geom.Pi
//! var Area = geom.Area
//! type Shape = geom.Shape
//! type Pair[K comparable, V any] = geom.Pair[K, V]
//! func Sum[T geom.Number](xs ...T) T {
//!     return geom.Sum[T](xs...)
//! }
//! ```
//!
//! Generation runs in four passes: extraction of exported symbols,
//! classification into a forwarding strategy, synthesis of each forwarding
//! declaration, and assembly of the file. It performs no I/O.

mod assemble;
mod binding;
mod classify;
mod error;
mod extract;
mod qualify;
mod synth;

use goshim_syntax::Package;

pub use binding::{
    assumed_import_name, is_keyword, is_predeclared, is_valid_identifier, ImportBinding,
};
pub use classify::{classify, Strategy, WrapReason};
pub use error::GenerateError;
pub use extract::{extract, SymbolKind, SymbolRecord, SymbolSignature, ValueType};
pub use synth::ForwardDecl;

/// Options for shim generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Local name of the original package's import; defaults to its package name.
    pub alias: Option<String>,
    /// Package clause of the shim; defaults to the original package name.
    pub package_name: Option<String>,
    /// Forward every function through a wrapper.
    pub wrap_functions: bool,
    /// Emit the `// Code generated ... DO NOT EDIT.` line.
    pub header: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            alias: None,
            package_name: None,
            wrap_functions: false,
            header: true,
        }
    }
}

/// A symbol with its chosen forwarding strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSymbol<'a> {
    pub record: SymbolRecord<'a>,
    pub strategy: Strategy,
}

/// Generate a shim for `package`, imported from `import_path`, with default options.
pub fn generate(package: &Package, import_path: &str) -> Result<String, GenerateError> {
    generate_with_options(package, import_path, &GenerateOptions::default())
}

/// Generate a shim for `package`, imported from `import_path`.
pub fn generate_with_options(
    package: &Package,
    import_path: &str,
    options: &GenerateOptions,
) -> Result<String, GenerateError> {
    let alias = options.alias.as_deref().unwrap_or(&package.name);
    let binding = ImportBinding::new(import_path, alias)?;
    let package_name = options.package_name.as_deref().unwrap_or(&package.name);
    if !is_valid_identifier(package_name) || package_name == "_" {
        return Err(GenerateError::InvalidIdentifier {
            role: "package name",
            name: package_name.to_string(),
        });
    }

    let mut symbols: Vec<(SymbolRecord<'_>, Strategy)> = classify_package(package, options)?
        .into_iter()
        .map(|c| (c.record, c.strategy))
        .collect();
    binding.check_collisions(&symbols)?;

    // Synthesis in name order keeps re-import numbering independent of
    // declaration order.
    symbols.sort_by(|a, b| a.0.name.cmp(b.0.name));
    let mut synth = synth::Synthesizer::new(package, &binding.alias, &symbols);
    let decls = symbols
        .iter()
        .map(|(record, strategy)| synth.forward(record, *strategy))
        .collect::<Result<Vec<_>, _>>()?;
    let imports = synth.finish();
    tracing::debug!(
        decls = decls.len(),
        imports = imports.len(),
        "synthesized forwarding declarations"
    );

    Ok(assemble::assemble(assemble::Unit {
        package_name,
        binding: &binding,
        imports,
        decls,
        header: options.header,
    }))
}

/// Extract and classify the exported symbols of `package`, in declaration order.
pub fn classify_package<'a>(
    package: &'a Package,
    options: &GenerateOptions,
) -> Result<Vec<ClassifiedSymbol<'a>>, GenerateError> {
    let records = extract(package)?;
    tracing::debug!(
        package = %package.name,
        files = package.files.len(),
        symbols = records.len(),
        "extracted exported symbols"
    );
    Ok(records
        .into_iter()
        .map(|record| {
            let strategy = classify(&record, options.wrap_functions);
            ClassifiedSymbol { record, strategy }
        })
        .collect())
}
