//! Rewriting type expressions so they resolve inside the shim package.
//!
//! A type written in the source package refers to sibling declarations by
//! bare name and to other packages through the declaring file's imports. In
//! the shim, siblings are reached through the alias and every other package
//! must be imported again.

use std::collections::HashSet;

use goshim_syntax::{
    is_exported, ArrayLen, ConstExpr, ExprToken, Field, InterfaceElem, Package, Signature,
    SourceFile, StructField, TypeExpr, TypeParam,
};
use indexmap::IndexMap;

use crate::binding::{assumed_import_name, is_keyword, is_predeclared};

/// Imports the shim needs besides the alias, keyed by path.
#[derive(Debug, Default)]
pub(crate) struct ImportSet {
    reserved: HashSet<String>,
    locals: IndexMap<String, String>,
}

impl ImportSet {
    /// `reserved` holds names the shim declares itself (alias, symbols, type parameters).
    pub(crate) fn new(reserved: HashSet<String>) -> Self {
        Self {
            reserved,
            locals: IndexMap::new(),
        }
    }

    /// Local name for `path`, preferring `preferred` and numbering on conflict.
    pub(crate) fn local_for(&mut self, path: &str, preferred: &str) -> String {
        if let Some(local) = self.locals.get(path) {
            return local.clone();
        }
        let mut candidate = preferred.to_string();
        let mut n = 2;
        while self.is_taken(&candidate) {
            candidate = format!("{preferred}{n}");
            n += 1;
        }
        tracing::debug!(path, local = %candidate, "re-importing dependency");
        self.locals.insert(path.to_string(), candidate.clone());
        candidate
    }

    fn is_taken(&self, name: &str) -> bool {
        self.reserved.contains(name)
            || is_keyword(name)
            || is_predeclared(name)
            || self.locals.values().any(|local| local == name)
    }

    /// `(path, local)` pairs sorted by path.
    pub(crate) fn into_sorted(self) -> Vec<(String, String)> {
        let mut imports: Vec<(String, String)> = self.locals.into_iter().collect();
        imports.sort();
        imports
    }
}

/// Names visible while rewriting one declaration.
pub(crate) struct Scope<'a> {
    pub file: &'a SourceFile,
    pub type_params: HashSet<&'a str>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(file: &'a SourceFile, type_params: &'a [TypeParam]) -> Self {
        Self {
            file,
            type_params: goshim_syntax::type_param_names(type_params).collect(),
        }
    }
}

/// Rewrites source-package type expressions into shim-package ones.
///
/// Errors are reasons, turned into `UnsupportedSignature` by the caller.
pub(crate) struct Qualifier<'a> {
    alias: &'a str,
    declared: HashSet<&'a str>,
}

impl<'a> Qualifier<'a> {
    pub(crate) fn new(package: &'a Package, alias: &'a str) -> Self {
        Self {
            alias,
            declared: package_level_names(package),
        }
    }

    pub(crate) fn type_expr(
        &self,
        ty: &TypeExpr,
        scope: &Scope<'_>,
        imports: &mut ImportSet,
    ) -> Result<TypeExpr, String> {
        let boxed = |inner: &TypeExpr, imports: &mut ImportSet| -> Result<Box<TypeExpr>, String> {
            Ok(Box::new(self.type_expr(inner, scope, imports)?))
        };
        Ok(match ty {
            TypeExpr::Named { pkg, name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.type_expr(arg, scope, imports))
                    .collect::<Result<Vec<_>, _>>()?;
                let pkg = match pkg {
                    Some(qualifier) => Some(self.import_local(qualifier, scope, imports)?),
                    None => self.bare_name(name, scope)?,
                };
                TypeExpr::Named {
                    pkg,
                    name: name.clone(),
                    args,
                }
            }
            TypeExpr::Pointer(inner) => TypeExpr::Pointer(boxed(inner, imports)?),
            TypeExpr::Slice(elem) => TypeExpr::Slice(boxed(elem, imports)?),
            TypeExpr::Array { len, elem } => TypeExpr::Array {
                len: match len {
                    ArrayLen::Inferred => ArrayLen::Inferred,
                    ArrayLen::Expr(expr) => ArrayLen::Expr(self.const_expr(expr, scope, imports)?),
                },
                elem: boxed(elem, imports)?,
            },
            TypeExpr::Map { key, value } => TypeExpr::Map {
                key: boxed(key, imports)?,
                value: boxed(value, imports)?,
            },
            TypeExpr::Chan { dir, elem } => TypeExpr::Chan {
                dir: *dir,
                elem: boxed(elem, imports)?,
            },
            TypeExpr::Func(sig) => TypeExpr::Func(self.signature(sig, scope, imports)?),
            TypeExpr::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    if let Some(name) = field.names.iter().find(|n| !is_exported(n)) {
                        return Err(format!("struct field `{name}` is unexported"));
                    }
                    out.push(StructField {
                        names: field.names.clone(),
                        ty: self.type_expr(&field.ty, scope, imports)?,
                        tag: field.tag.clone(),
                    });
                }
                TypeExpr::Struct(out)
            }
            TypeExpr::Interface(elems) => {
                let mut out = Vec::with_capacity(elems.len());
                for elem in elems {
                    out.push(match elem {
                        InterfaceElem::Method { name, .. } if !is_exported(name) => {
                            return Err(format!("interface method `{name}` is unexported"));
                        }
                        InterfaceElem::Method { name, sig } => InterfaceElem::Method {
                            name: name.clone(),
                            sig: self.signature(sig, scope, imports)?,
                        },
                        InterfaceElem::Embed(ty) => {
                            InterfaceElem::Embed(self.type_expr(ty, scope, imports)?)
                        }
                    });
                }
                TypeExpr::Interface(out)
            }
            TypeExpr::Paren(inner) => TypeExpr::Paren(boxed(inner, imports)?),
            TypeExpr::Ellipsis(elem) => TypeExpr::Ellipsis(boxed(elem, imports)?),
            TypeExpr::Tilde(inner) => TypeExpr::Tilde(boxed(inner, imports)?),
            TypeExpr::Union(terms) => TypeExpr::Union(
                terms
                    .iter()
                    .map(|t| self.type_expr(t, scope, imports))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Rewrite a signature keeping parameter and result names.
    pub(crate) fn signature(
        &self,
        sig: &Signature,
        scope: &Scope<'_>,
        imports: &mut ImportSet,
    ) -> Result<Signature, String> {
        let fields = |list: &[Field], imports: &mut ImportSet| -> Result<Vec<Field>, String> {
            list.iter()
                .map(|f| {
                    Ok(Field {
                        names: f.names.clone(),
                        ty: self.type_expr(&f.ty, scope, imports)?,
                    })
                })
                .collect()
        };
        Ok(Signature {
            params: fields(&sig.params, imports)?,
            results: fields(&sig.results, imports)?,
        })
    }

    pub(crate) fn type_params(
        &self,
        params: &[TypeParam],
        scope: &Scope<'_>,
        imports: &mut ImportSet,
    ) -> Result<Vec<TypeParam>, String> {
        params
            .iter()
            .map(|p| {
                Ok(TypeParam {
                    names: p.names.clone(),
                    constraint: self.type_expr(&p.constraint, scope, imports)?,
                })
            })
            .collect()
    }

    /// Package qualifier for a bare name, or `None` when it stays bare.
    fn bare_name(&self, name: &str, scope: &Scope<'_>) -> Result<Option<String>, String> {
        if scope.type_params.contains(name) {
            return Ok(None);
        }
        if self.declared.contains(name) {
            if is_exported(name) {
                return Ok(Some(self.alias.to_string()));
            }
            return Err(format!("refers to unexported `{name}`"));
        }
        if is_predeclared(name) {
            return Ok(None);
        }
        Err(format!("cannot resolve `{name}`"))
    }

    fn import_local(
        &self,
        qualifier: &str,
        scope: &Scope<'_>,
        imports: &mut ImportSet,
    ) -> Result<String, String> {
        let spec = scope
            .file
            .imports
            .iter()
            .find(|spec| match spec.name.as_deref() {
                Some(".") | Some("_") => false,
                Some(name) => name == qualifier,
                None => assumed_import_name(&spec.path) == qualifier,
            })
            .ok_or_else(|| format!("cannot resolve package `{qualifier}`"))?;
        Ok(imports.local_for(&spec.path, qualifier))
    }

    /// Array lengths: `N`, `pkg.Size*2`, `len(x)`.
    fn const_expr(
        &self,
        expr: &ConstExpr,
        scope: &Scope<'_>,
        imports: &mut ImportSet,
    ) -> Result<ConstExpr, String> {
        let mut tokens = Vec::with_capacity(expr.tokens.len());
        let mut iter = expr.tokens.iter().peekable();
        while let Some(token) = iter.next() {
            let ExprToken::Ident(name) = token else {
                tokens.push(token.clone());
                continue;
            };
            let selector = matches!(iter.peek(), Some(ExprToken::Punct(p)) if p == ".");
            if selector {
                tokens.push(ExprToken::Ident(self.import_local(name, scope, imports)?));
                // `.` and the selected name
                tokens.extend(iter.next().cloned());
                tokens.extend(iter.next().cloned());
                continue;
            }
            let rewritten = match self.bare_name(name, scope)? {
                Some(pkg) => format!("{pkg}.{name}"),
                None => name.clone(),
            };
            tokens.push(ExprToken::Ident(rewritten));
        }
        Ok(ConstExpr { tokens })
    }
}

/// Every package-level name, exported or not (methods excluded).
fn package_level_names(package: &Package) -> HashSet<&str> {
    use goshim_syntax::Decl;

    let mut names = HashSet::new();
    for file in &package.files {
        for decl in &file.decls {
            match decl {
                Decl::Const(d) | Decl::Var(d) => {
                    names.extend(
                        d.specs
                            .iter()
                            .flat_map(|s| s.names.iter().map(|n| n.name.as_str())),
                    );
                }
                Decl::Type(d) => names.extend(d.specs.iter().map(|s| s.name.name.as_str())),
                Decl::Func(f) if f.recv.is_none() => {
                    names.insert(f.name.name.as_str());
                }
                Decl::Func(_) => {}
            }
        }
    }
    names.remove("_");
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use goshim_syntax::{parse_file, Decl};

    fn setup(src: &str) -> Package {
        let file = parse_file(src).unwrap();
        Package::new(file.package.name.clone(), vec![file])
    }

    /// Qualify the declared type of the first `var` spec.
    fn qualify_var(pkg: &Package, imports: &mut ImportSet) -> Result<String, String> {
        let file = &pkg.files[0];
        let ty = file
            .decls
            .iter()
            .find_map(|d| match d {
                Decl::Var(v) => v.specs[0].ty.as_ref(),
                _ => None,
            })
            .unwrap();
        let qualifier = Qualifier::new(pkg, "orig");
        let scope = Scope::new(file, &[]);
        qualifier.type_expr(ty, &scope, imports).map(|t| t.to_string())
    }

    #[test]
    fn test_local_and_predeclared_names() {
        let pkg = setup("package p\ntype Node struct{}\nvar X map[string][]*Node\n");
        let mut imports = ImportSet::default();
        assert_eq!(
            qualify_var(&pkg, &mut imports).unwrap(),
            "map[string][]*orig.Node"
        );
    }

    #[test]
    fn test_imported_qualifier_is_reimported() {
        let pkg = setup("package p\nimport (\n\tstdio \"io\"\n\t\"net/http\"\n)\n\
            var X func(stdio.Reader, *http.Request) error\n");
        let mut imports = ImportSet::default();
        assert_eq!(
            qualify_var(&pkg, &mut imports).unwrap(),
            "func(stdio.Reader, *http.Request) error"
        );
        assert_eq!(
            imports.into_sorted(),
            vec![
                ("io".to_string(), "stdio".to_string()),
                ("net/http".to_string(), "http".to_string())
            ]
        );
    }

    #[test]
    fn test_import_renamed_on_conflict() {
        let pkg = setup("package p\nimport \"context\"\nvar X context.Context\n");
        let mut imports = ImportSet::new(HashSet::from(["context".to_string()]));
        assert_eq!(qualify_var(&pkg, &mut imports).unwrap(), "context2.Context");
    }

    #[test]
    fn test_unexported_reference_fails() {
        let pkg = setup("package p\ntype node struct{}\nvar X []node\n");
        let err = qualify_var(&pkg, &mut ImportSet::default()).unwrap_err();
        assert!(err.contains("unexported `node`"));
    }

    #[test]
    fn test_unresolved_names_fail() {
        let pkg = setup("package p\nvar X Missing\n");
        assert!(qualify_var(&pkg, &mut ImportSet::default()).is_err());
        let pkg = setup("package p\nvar X json.RawMessage\n");
        let err = qualify_var(&pkg, &mut ImportSet::default()).unwrap_err();
        assert!(err.contains("package `json`"));
    }

    #[test]
    fn test_anonymous_struct_and_interface() {
        let pkg = setup(
            "package p\ntype ID int\nvar X struct{ A ID; B interface{ M() error } }\n",
        );
        assert_eq!(
            qualify_var(&pkg, &mut ImportSet::default()).unwrap(),
            "struct{ A orig.ID; B interface{ M() error } }"
        );
        let pkg = setup("package p\nvar X struct{ a int }\n");
        assert!(qualify_var(&pkg, &mut ImportSet::default()).is_err());
        let pkg = setup("package p\nvar X interface{ m() }\n");
        assert!(qualify_var(&pkg, &mut ImportSet::default()).is_err());
    }

    #[test]
    fn test_array_length_constants() {
        let pkg = setup("package p\nimport \"crypto/sha256\"\nconst Width = 4\n\
            var X [Width * 2][sha256.Size]byte\n");
        let mut imports = ImportSet::default();
        assert_eq!(
            qualify_var(&pkg, &mut imports).unwrap(),
            "[orig.Width*2][sha256.Size]byte"
        );
    }

    #[test]
    fn test_type_params_stay_bare() {
        let pkg = setup("package p\ntype Number interface{ ~int | ~float64 }\n\
            func Sum[T Number](xs ...T) T { return 0 }\n");
        let Decl::Func(f) = &pkg.files[0].decls[1] else {
            panic!("expected func");
        };
        let qualifier = Qualifier::new(&pkg, "orig");
        let scope = Scope::new(&pkg.files[0], &f.type_params);
        let mut imports = ImportSet::default();
        let params = qualifier.type_params(&f.type_params, &scope, &mut imports).unwrap();
        assert_eq!(
            goshim_syntax::type_params_to_string(&params),
            "[T orig.Number]"
        );
        let sig = qualifier.signature(&f.sig, &scope, &mut imports).unwrap();
        assert_eq!(sig.to_string(), "(xs ...T) T");
    }
}
