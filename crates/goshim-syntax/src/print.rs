//! Canonical rendering of type expressions.
//!
//! Output follows gofmt spacing regardless of how the source was formatted,
//! so generated code is stable across regeneration.

use std::fmt;

use crate::ast::*;

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { pkg, name, args } => {
                if let Some(pkg) = pkg {
                    write!(f, "{pkg}.")?;
                }
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    write_joined(f, args, ", ")?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            TypeExpr::Pointer(inner) => write!(f, "*{inner}"),
            TypeExpr::Slice(elem) => write!(f, "[]{elem}"),
            TypeExpr::Array { len, elem } => match len {
                ArrayLen::Inferred => write!(f, "[...]{elem}"),
                ArrayLen::Expr(expr) => write!(f, "[{expr}]{elem}"),
            },
            TypeExpr::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Recv => write!(f, "<-chan {elem}"),
            },
            TypeExpr::Func(sig) => write!(f, "func{sig}"),
            TypeExpr::Struct(fields) => {
                if fields.is_empty() {
                    return f.write_str("struct{}");
                }
                f.write_str("struct{ ")?;
                write_joined(f, fields, "; ")?;
                f.write_str(" }")
            }
            TypeExpr::Interface(elems) => {
                if elems.is_empty() {
                    return f.write_str("interface{}");
                }
                f.write_str("interface{ ")?;
                write_joined(f, elems, "; ")?;
                f.write_str(" }")
            }
            TypeExpr::Paren(inner) => write!(f, "({inner})"),
            TypeExpr::Ellipsis(elem) => write!(f, "...{elem}"),
            TypeExpr::Tilde(inner) => write!(f, "~{inner}"),
            TypeExpr::Union(terms) => write_joined(f, terms, " | "),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.names.is_empty() {
            write!(f, "{} ", self.names.join(", "))?;
        }
        write!(f, "{}", self.ty)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_joined(f, &self.params, ", ")?;
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.names.is_empty() && !matches!(single.ty, TypeExpr::Func(_)) => {
                write!(f, " {}", single.ty)
            }
            results => {
                f.write_str(" (")?;
                write_joined(f, results, ", ")?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.names.join(", "), self.constraint)
    }
}

impl fmt::Display for StructField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.names.is_empty() {
            write!(f, "{} ", self.names.join(", "))?;
        }
        write!(f, "{}", self.ty)?;
        if let Some(tag) = &self.tag {
            write!(f, " {tag}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InterfaceElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceElem::Method { name, sig } => write!(f, "{name}{sig}"),
            InterfaceElem::Embed(ty) => write!(f, "{ty}"),
        }
    }
}

impl fmt::Display for ConstExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prev_word = false;
        for token in &self.tokens {
            let (text, word) = match token {
                ExprToken::Ident(s) | ExprToken::Literal(s) => (s.as_str(), true),
                ExprToken::Punct(s) => (s.as_str(), false),
            };
            if word && prev_word {
                f.write_str(" ")?;
            }
            f.write_str(text)?;
            prev_word = word;
        }
        Ok(())
    }
}

/// Render a type-parameter list including brackets, or nothing when empty.
pub fn type_params_to_string(params: &[TypeParam]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let inner: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("[{}]", inner.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pkg: Option<&str>, name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Named {
            pkg: pkg.map(String::from),
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn test_render_composite_types() {
        let ty = TypeExpr::Map {
            key: Box::new(TypeExpr::named("string")),
            value: Box::new(TypeExpr::Slice(Box::new(TypeExpr::Pointer(Box::new(named(
                Some("io"),
                "Reader",
                vec![],
            )))))),
        };
        assert_eq!(ty.to_string(), "map[string][]*io.Reader");
    }

    #[test]
    fn test_render_channels() {
        let recv = TypeExpr::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(TypeExpr::named("int")),
        };
        let send = TypeExpr::Chan {
            dir: ChanDir::Send,
            elem: Box::new(TypeExpr::named("error")),
        };
        assert_eq!(recv.to_string(), "<-chan int");
        assert_eq!(send.to_string(), "chan<- error");
    }

    #[test]
    fn test_render_signature_results() {
        let sig = Signature {
            params: vec![
                Field {
                    names: vec!["format".to_string()],
                    ty: TypeExpr::named("string"),
                },
                Field {
                    names: vec!["args".to_string()],
                    ty: TypeExpr::Ellipsis(Box::new(TypeExpr::named("any"))),
                },
            ],
            results: vec![
                Field {
                    names: vec![],
                    ty: TypeExpr::named("int"),
                },
                Field {
                    names: vec![],
                    ty: TypeExpr::named("error"),
                },
            ],
        };
        assert_eq!(sig.to_string(), "(format string, args ...any) (int, error)");
        assert_eq!(
            TypeExpr::Func(sig).to_string(),
            "func(format string, args ...any) (int, error)"
        );
    }

    #[test]
    fn test_single_func_result_is_parenthesized() {
        let sig = Signature {
            params: vec![],
            results: vec![Field {
                names: vec![],
                ty: TypeExpr::Func(Signature::default()),
            }],
        };
        assert_eq!(sig.to_string(), "() (func())");
    }

    #[test]
    fn test_render_struct_and_interface() {
        let st = TypeExpr::Struct(vec![
            StructField {
                names: vec!["A".to_string(), "B".to_string()],
                ty: TypeExpr::named("int"),
                tag: Some("`json:\"a\"`".to_string()),
            },
            StructField {
                names: vec![],
                ty: named(Some("sync"), "Mutex", vec![]),
                tag: None,
            },
        ]);
        assert_eq!(
            st.to_string(),
            "struct{ A, B int `json:\"a\"`; sync.Mutex }"
        );

        let iface = TypeExpr::Interface(vec![
            InterfaceElem::Embed(TypeExpr::Union(vec![
                TypeExpr::Tilde(Box::new(TypeExpr::named("int"))),
                TypeExpr::named("string"),
            ])),
            InterfaceElem::Method {
                name: "String".to_string(),
                sig: Signature {
                    params: vec![],
                    results: vec![Field {
                        names: vec![],
                        ty: TypeExpr::named("string"),
                    }],
                },
            },
        ]);
        assert_eq!(
            iface.to_string(),
            "interface{ ~int | string; String() string }"
        );
        assert_eq!(TypeExpr::Struct(vec![]).to_string(), "struct{}");
    }

    #[test]
    fn test_render_array_length_expression() {
        let ty = TypeExpr::Array {
            len: ArrayLen::Expr(ConstExpr {
                tokens: vec![
                    ExprToken::Ident("N".to_string()),
                    ExprToken::Punct("*".to_string()),
                    ExprToken::Literal("2".to_string()),
                ],
            }),
            elem: Box::new(TypeExpr::named("byte")),
        };
        assert_eq!(ty.to_string(), "[N*2]byte");
    }

    #[test]
    fn test_render_type_params() {
        let params = vec![
            TypeParam {
                names: vec!["K".to_string()],
                constraint: TypeExpr::named("comparable"),
            },
            TypeParam {
                names: vec!["V".to_string(), "W".to_string()],
                constraint: TypeExpr::named("any"),
            },
        ];
        assert_eq!(type_params_to_string(&params), "[K comparable, V, W any]");
        assert_eq!(type_params_to_string(&[]), "");
        let pair = named(
            None,
            "Pair",
            vec![TypeExpr::named("K"), TypeExpr::named("V")],
        );
        assert_eq!(pair.to_string(), "Pair[K, V]");
    }
}
