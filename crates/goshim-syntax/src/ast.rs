//! AST types for the top-level declarations of Go source files.
//!
//! Only what a package exposes to importers is modelled in detail: names,
//! type expressions and signatures. Function bodies and initializer
//! expressions are skipped by the parser.

use std::ops::Range;

/// A span in the source file, represented as a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { range: start..end }
    }
}

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// Whether the identifier is visible outside its package.
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// Go's visibility rule: the first character is an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// The parsed files of one package directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub files: Vec<SourceFile>,
}

impl Package {
    pub fn new(name: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// One parsed `.go` file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

/// `import name "path"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit local name, including `.` and `_`.
    pub name: Option<String>,
    pub path: String,
    pub span: Span,
}

/// A doc comment group, each comment kept with its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub comments: Vec<String>,
}

impl Doc {
    /// Source lines of the comment group, verbatim.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.comments.iter().flat_map(|c| c.lines())
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Const(ValueDecl),
    Var(ValueDecl),
    Type(TypeDecl),
    Func(FuncDecl),
}

/// `const`/`var` declaration, possibly a parenthesized group.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDecl {
    pub doc: Option<Doc>,
    pub grouped: bool,
    pub specs: Vec<ValueSpec>,
    pub span: Span,
}

/// `A, B Type = x, y`
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub doc: Option<Doc>,
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    /// Whether the spec has an `= values` part.
    pub has_values: bool,
    pub span: Span,
}

/// `type` declaration, possibly a parenthesized group.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub doc: Option<Doc>,
    pub grouped: bool,
    pub specs: Vec<TypeSpec>,
    pub span: Span,
}

/// `Name[T any] Underlying` or `Name = Target`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub doc: Option<Doc>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub doc: Option<Doc>,
    pub recv: Option<Field>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub sig: Signature,
    pub has_body: bool,
    pub span: Span,
}

/// A group of type parameters sharing one constraint: `K, V comparable`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub names: Vec<String>,
    pub constraint: TypeExpr,
}

/// Flattened type parameter names, in declaration order.
pub fn type_param_names(params: &[TypeParam]) -> impl Iterator<Item = &str> {
    params.iter().flat_map(|p| p.names.iter().map(String::as_str))
}

/// A parameter, result, or receiver group; `names` is empty when unnamed.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

/// Parameters and results of a function type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

impl Signature {
    /// Whether the final parameter is `...T`.
    pub fn is_variadic(&self) -> bool {
        self.params
            .last()
            .is_some_and(|f| matches!(f.ty, TypeExpr::Ellipsis(_)))
    }

    /// Number of parameters after expanding grouped names.
    pub fn param_count(&self) -> usize {
        self.params.iter().map(|f| f.names.len().max(1)).sum()
    }

    pub fn result_count(&self) -> usize {
        self.results.iter().map(|f| f.names.len().max(1)).sum()
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Name`, `pkg.Name`, `Name[A, B]`
    Named {
        pkg: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: ArrayLen,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(Signature),
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceElem>),
    Paren(Box<TypeExpr>),
    /// `...T`, final parameter only.
    Ellipsis(Box<TypeExpr>),
    /// `~T`, constraint position only.
    Tilde(Box<TypeExpr>),
    /// `A | B`, constraint position only.
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            pkg: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// The bare identifier, if this is an unqualified, uninstantiated name.
    pub fn as_bare_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named {
                pkg: None,
                name,
                args,
            } if args.is_empty() => Some(name),
            _ => None,
        }
    }
}

/// Length of an array type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayLen {
    /// `[...]T`
    Inferred,
    Expr(ConstExpr),
}

/// A constant expression kept as its token sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstExpr {
    pub tokens: Vec<ExprToken>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken {
    Ident(String),
    Literal(String),
    Punct(String),
}

/// A struct field or embedded field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// Empty for an embedded field.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Raw tag literal including quotes.
    pub tag: Option<String>,
}

/// An element of an interface type.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: String, sig: Signature },
    /// Embedded interface or type-set term (`~int | string`).
    Embed(TypeExpr),
}
