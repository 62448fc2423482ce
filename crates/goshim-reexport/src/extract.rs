//! Symbol extraction: the exported top-level names of a package.

use std::collections::HashSet;
use std::fmt;

use goshim_syntax::{
    is_exported, type_params_to_string, Decl, Doc, FuncDecl, InterfaceElem, Package, Signature,
    SourceFile, TypeExpr, TypeParam, TypeSpec, ValueDecl,
};
use indexmap::IndexMap;

use crate::error::GenerateError;

/// Declaration kind of an exported symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Constant,
    Variable,
    Function,
    TypeDefinition,
    TypeAlias,
    Interface,
    Aggregate,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::TypeDefinition => "type definition",
            SymbolKind::TypeAlias => "type alias",
            SymbolKind::Interface => "interface",
            SymbolKind::Aggregate => "aggregate",
        }
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::TypeDefinition
                | SymbolKind::TypeAlias
                | SymbolKind::Interface
                | SymbolKind::Aggregate
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the type of a constant or variable is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType<'a> {
    /// `X T = v`
    Explicit(&'a TypeExpr),
    /// `X = v`: untyped, or inferred from the initializer.
    Initializer,
    /// Implicit repetition inside a const group (`iota` style); carries the
    /// type of the spec being repeated, if it had one.
    FromGroup(Option<&'a TypeExpr>),
}

/// Kind-specific shape of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolSignature<'a> {
    Value(ValueType<'a>),
    Func {
        type_params: &'a [TypeParam],
        sig: &'a Signature,
    },
    Type {
        type_params: &'a [TypeParam],
        underlying: &'a TypeExpr,
        /// Exported method names: declared methods for defined types, the
        /// method set for interfaces.
        methods: Vec<&'a str>,
    },
}

/// One exported top-level name, borrowed from the parsed package.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRecord<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
    pub signature: SymbolSignature<'a>,
    pub doc: Option<&'a Doc>,
    /// The declaring file, whose imports qualify `pkg.Name` references.
    pub file: &'a SourceFile,
}

impl<'a> SymbolRecord<'a> {
    pub fn type_params(&self) -> &'a [TypeParam] {
        match &self.signature {
            SymbolSignature::Func { type_params, .. }
            | SymbolSignature::Type { type_params, .. } => *type_params,
            SymbolSignature::Value(_) => &[],
        }
    }

    pub fn methods(&self) -> &[&'a str] {
        match &self.signature {
            SymbolSignature::Type { methods, .. } => methods,
            _ => &[],
        }
    }

    /// One-line rendering of the symbol's shape, as it reads in the source.
    pub fn describe(&self) -> String {
        match &self.signature {
            SymbolSignature::Value(ValueType::Explicit(ty))
            | SymbolSignature::Value(ValueType::FromGroup(Some(ty))) => ty.to_string(),
            SymbolSignature::Value(ValueType::Initializer) => "(from initializer)".to_string(),
            SymbolSignature::Value(ValueType::FromGroup(None)) => "(from group)".to_string(),
            SymbolSignature::Func { type_params, sig } => {
                format!("func{}{sig}", type_params_to_string(type_params))
            }
            SymbolSignature::Type {
                type_params,
                underlying,
                ..
            } => {
                let mut out = type_params_to_string(type_params);
                if !out.is_empty() {
                    out.push(' ');
                }
                if self.kind == SymbolKind::TypeAlias {
                    out.push_str("= ");
                }
                out.push_str(&underlying.to_string());
                out
            }
        }
    }
}

/// Extract the exported symbols of `package` in declaration order.
///
/// Constant and variable specs are expanded into one record per name.
/// Methods are not records of their own; exported methods of exported
/// types are summarized on the receiver's record.
pub fn extract(package: &Package) -> Result<Vec<SymbolRecord<'_>>, GenerateError> {
    let mut table: IndexMap<&str, SymbolRecord<'_>> = IndexMap::new();
    let mut type_names: HashSet<&str> = HashSet::new();
    let mut receivers: Vec<(&str, &FuncDecl)> = Vec::new();

    for file in &package.files {
        for decl in &file.decls {
            match decl {
                Decl::Const(d) => extract_values(&mut table, d, SymbolKind::Constant, file)?,
                Decl::Var(d) => extract_values(&mut table, d, SymbolKind::Variable, file)?,
                Decl::Type(d) => {
                    for spec in &d.specs {
                        type_names.insert(&spec.name.name);
                        if !spec.name.is_exported() {
                            continue;
                        }
                        let decl_doc = if d.grouped { None } else { d.doc.as_ref() };
                        let doc = spec.doc.as_ref().or(decl_doc);
                        insert(&mut table, type_record(spec, doc, file))?;
                    }
                }
                Decl::Func(f) => match &f.recv {
                    Some(recv) => {
                        let base = receiver_base(&recv.ty).ok_or_else(|| {
                            GenerateError::extraction(
                                &f.name.name,
                                format!("invalid receiver type `{}`", recv.ty),
                            )
                        })?;
                        receivers.push((base, f));
                    }
                    None => {
                        if !f.name.is_exported() {
                            continue;
                        }
                        insert(
                            &mut table,
                            SymbolRecord {
                                name: &f.name.name,
                                kind: SymbolKind::Function,
                                signature: SymbolSignature::Func {
                                    type_params: &f.type_params,
                                    sig: &f.sig,
                                },
                                doc: f.doc.as_ref(),
                                file,
                            },
                        )?;
                    }
                },
            }
        }
    }

    for (base, f) in receivers {
        if !type_names.contains(base) {
            return Err(GenerateError::extraction(
                format!("{base}.{}", f.name.name),
                format!(
                    "receiver type `{base}` is not declared in package `{}`",
                    package.name
                ),
            ));
        }
        if !f.name.is_exported() {
            continue;
        }
        if let Some(SymbolRecord {
            signature: SymbolSignature::Type { methods, .. },
            ..
        }) = table.get_mut(base)
        {
            methods.push(&f.name.name);
        }
    }

    Ok(table.into_values().collect())
}

fn insert<'a>(
    table: &mut IndexMap<&'a str, SymbolRecord<'a>>,
    record: SymbolRecord<'a>,
) -> Result<(), GenerateError> {
    if table.contains_key(record.name) {
        return Err(GenerateError::extraction(
            record.name,
            "declared more than once",
        ));
    }
    table.insert(record.name, record);
    Ok(())
}

fn extract_values<'a>(
    table: &mut IndexMap<&'a str, SymbolRecord<'a>>,
    decl: &'a ValueDecl,
    kind: SymbolKind,
    file: &'a SourceFile,
) -> Result<(), GenerateError> {
    let mut group_ty: Option<&'a TypeExpr> = None;
    let mut seen_values = false;

    for spec in &decl.specs {
        let first = spec.names.first().map_or("_", |n| n.name.as_str());
        let value_type = if spec.has_values {
            group_ty = spec.ty.as_ref();
            seen_values = true;
            match &spec.ty {
                Some(ty) => ValueType::Explicit(ty),
                None => ValueType::Initializer,
            }
        } else if kind == SymbolKind::Constant {
            if spec.ty.is_some() || !seen_values {
                return Err(GenerateError::extraction(
                    first,
                    "missing init expr for const declaration",
                ));
            }
            ValueType::FromGroup(group_ty)
        } else {
            match &spec.ty {
                Some(ty) => ValueType::Explicit(ty),
                None => {
                    return Err(GenerateError::extraction(
                        first,
                        "missing type or init expr",
                    ));
                }
            }
        };

        let doc = spec
            .doc
            .as_ref()
            .or(if decl.grouped { None } else { decl.doc.as_ref() });
        for name in spec.names.iter().filter(|n| n.is_exported()) {
            insert(
                table,
                SymbolRecord {
                    name: &name.name,
                    kind,
                    signature: SymbolSignature::Value(value_type),
                    doc,
                    file,
                },
            )?;
        }
    }
    Ok(())
}

fn type_record<'a>(
    spec: &'a TypeSpec,
    doc: Option<&'a Doc>,
    file: &'a SourceFile,
) -> SymbolRecord<'a> {
    let kind = if spec.is_alias {
        SymbolKind::TypeAlias
    } else {
        match &spec.ty {
            TypeExpr::Interface(_) => SymbolKind::Interface,
            TypeExpr::Struct(_) => SymbolKind::Aggregate,
            _ => SymbolKind::TypeDefinition,
        }
    };
    let methods = match &spec.ty {
        TypeExpr::Interface(elems) if !spec.is_alias => elems
            .iter()
            .filter_map(|elem| match elem {
                InterfaceElem::Method { name, .. } if is_exported(name) => Some(name.as_str()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    SymbolRecord {
        name: &spec.name.name,
        kind,
        signature: SymbolSignature::Type {
            type_params: &spec.type_params,
            underlying: &spec.ty,
            methods,
        },
        doc,
        file,
    }
}

/// Base type name of a method receiver: `T`, `*T`, `T[K, V]`, `(*T)`.
fn receiver_base(ty: &TypeExpr) -> Option<&str> {
    match ty {
        TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => receiver_base(inner),
        TypeExpr::Named {
            pkg: None, name, ..
        } => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goshim_syntax::parse_file;

    fn package(srcs: &[&str]) -> Package {
        let files: Vec<SourceFile> = srcs.iter().map(|s| parse_file(s).unwrap()).collect();
        Package::new(files[0].package.name.clone(), files)
    }

    fn names(records: &[SymbolRecord<'_>]) -> Vec<String> {
        records.iter().map(|r| r.name.to_string()).collect()
    }

    #[test]
    fn test_only_exported_names() {
        let pkg = package(&[r#"package p

const (
    A = 1
    b = 2
    _ = 3
)
var C, d, E = 1, 2, 3
func F() {}
func g() {}
type T int
type u struct{}
"#]);
        let records = extract(&pkg).unwrap();
        assert_eq!(names(&records), vec!["A", "C", "E", "F", "T"]);
    }

    #[test]
    fn test_const_group_value_types() {
        let pkg = package(&[r#"package p

type Color int

const (
    Red Color = iota
    Green
    Blue
    Max = 3
    Other
)
"#]);
        let records = extract(&pkg).unwrap();
        let color = TypeExpr::named("Color");
        assert_eq!(
            records[1].signature,
            SymbolSignature::Value(ValueType::Explicit(&color))
        );
        let from_group = SymbolSignature::Value(ValueType::FromGroup(Some(&color)));
        assert_eq!(records[2].signature, from_group);
        assert_eq!(records[3].signature, from_group);
        assert_eq!(
            records[4].signature,
            SymbolSignature::Value(ValueType::Initializer)
        );
        assert_eq!(
            records[5].signature,
            SymbolSignature::Value(ValueType::FromGroup(None))
        );
    }

    #[test]
    fn test_type_kinds() {
        let pkg = package(&[r#"package p

type Def int
type Alias = Def
type Iface interface {
    Read() int
    close()
}
type Agg struct{ X int }
"#]);
        let records = extract(&pkg).unwrap();
        let kinds: Vec<SymbolKind> = records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SymbolKind::TypeDefinition,
                SymbolKind::TypeAlias,
                SymbolKind::Interface,
                SymbolKind::Aggregate
            ]
        );
        assert_eq!(records[2].methods(), &["Read"]);
    }

    #[test]
    fn test_methods_attach_to_receiver_across_files() {
        let pkg = package(&[
            "package p\ntype Buffer[T any] struct{ items []T }\ntype inner struct{}\n",
            "package p\nfunc (b *Buffer[T]) Len() int { return 0 }\nfunc (b *Buffer[T]) grow() {}\n\
                func (inner) Hidden() {}\n",
        ]);
        let records = extract(&pkg).unwrap();
        assert_eq!(names(&records), vec!["Buffer"]);
        assert_eq!(records[0].methods(), &["Len"]);
        assert_eq!(records[0].type_params().len(), 1);
    }

    #[test]
    fn test_method_on_undeclared_receiver_is_error() {
        let pkg = package(&["package p\nfunc (m Missing) Do() {}\n"]);
        let err = extract(&pkg).unwrap_err();
        assert!(
            matches!(err, GenerateError::Extraction { ref symbol, .. } if symbol == "Missing.Do")
        );
    }

    #[test]
    fn test_duplicate_declaration_is_error() {
        let pkg = package(&["package p\nfunc F() {}\n", "package p\nvar F = 1\n"]);
        let err = extract(&pkg).unwrap_err();
        assert_eq!(
            err,
            GenerateError::extraction("F", "declared more than once")
        );
    }

    #[test]
    fn test_const_without_value_is_error() {
        let pkg = package(&["package p\nconst (\n    A int\n)\n"]);
        assert!(matches!(extract(&pkg), Err(GenerateError::Extraction { .. })));
    }

    #[test]
    fn test_doc_selection() {
        let pkg = package(&[r#"package p

// Single is documented on the decl.
const Single = 1

// Group doc is not a spec doc.
var (
    // First has its own doc.
    First = 1
    Second = 2
)
"#]);
        let records = extract(&pkg).unwrap();
        assert_eq!(
            records[0].doc.unwrap().comments,
            vec!["// Single is documented on the decl.".to_string()]
        );
        assert_eq!(
            records[1].doc.unwrap().comments,
            vec!["// First has its own doc.".to_string()]
        );
        assert!(records[2].doc.is_none());
    }

    #[test]
    fn test_describe() {
        let pkg = package(&["package p\n\
            func Map[T, U any](xs []T, f func(T) U) []U { return nil }\n\
            type Set[T comparable] = map[T]struct{}\n"]);
        let records = extract(&pkg).unwrap();
        assert_eq!(
            records[0].describe(),
            "func[T, U any](xs []T, f func(T) U) []U"
        );
        assert_eq!(records[1].describe(), "[T comparable] = map[T]struct{}");
    }
}
