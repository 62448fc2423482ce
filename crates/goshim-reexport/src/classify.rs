//! Forwarding strategy selection.

use std::fmt;

use crate::extract::{SymbolKind, SymbolRecord, SymbolSignature};

/// Why a function is forwarded through a wrapper instead of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapReason {
    /// Generic functions cannot be referenced uninstantiated.
    Generic,
    Variadic,
    /// Wrappers were requested for every function.
    Forced,
}

impl WrapReason {
    pub fn as_str(self) -> &'static str {
        match self {
            WrapReason::Generic => "generic",
            WrapReason::Variadic => "variadic",
            WrapReason::Forced => "forced",
        }
    }
}

/// How a symbol is re-declared in the shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `const X = alias.X`
    ConstForward,
    /// `var X = alias.X`
    VarForward,
    /// `var F = alias.F`
    FuncValueForward,
    /// `func F(...) ... { return alias.F(...) }`
    FuncWrapper { reason: WrapReason },
    /// `type T = alias.T`, or `type T[P any] = alias.T[P]`
    TypeAliasForward,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ConstForward => f.write_str("const-forward"),
            Strategy::VarForward => f.write_str("var-forward"),
            Strategy::FuncValueForward => f.write_str("func-value-forward"),
            Strategy::FuncWrapper { reason } => write!(f, "func-wrapper ({})", reason.as_str()),
            Strategy::TypeAliasForward => f.write_str("type-alias-forward"),
        }
    }
}

/// Pick the forwarding strategy for one symbol.
///
/// Aliasing is preferred; functions fall back to a wrapper only when a value
/// reference would lose their generic shape, when they are variadic, or when
/// `wrap_functions` asks for wrappers everywhere.
pub fn classify(record: &SymbolRecord<'_>, wrap_functions: bool) -> Strategy {
    match record.kind {
        SymbolKind::Constant => Strategy::ConstForward,
        SymbolKind::Variable => Strategy::VarForward,
        SymbolKind::Function => {
            let (generic, variadic) = match &record.signature {
                SymbolSignature::Func { type_params, sig } => {
                    (!type_params.is_empty(), sig.is_variadic())
                }
                _ => (false, false),
            };
            if generic {
                Strategy::FuncWrapper {
                    reason: WrapReason::Generic,
                }
            } else if variadic {
                Strategy::FuncWrapper {
                    reason: WrapReason::Variadic,
                }
            } else if wrap_functions {
                Strategy::FuncWrapper {
                    reason: WrapReason::Forced,
                }
            } else {
                Strategy::FuncValueForward
            }
        }
        SymbolKind::TypeDefinition
        | SymbolKind::TypeAlias
        | SymbolKind::Interface
        | SymbolKind::Aggregate => Strategy::TypeAliasForward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use goshim_syntax::{parse_file, Package};

    fn strategies(src: &str, wrap_functions: bool) -> Vec<(String, Strategy)> {
        let file = parse_file(src).unwrap();
        let pkg = Package::new("p", vec![file]);
        extract(&pkg)
            .unwrap()
            .iter()
            .map(|r| (r.name.to_string(), classify(r, wrap_functions)))
            .collect()
    }

    #[test]
    fn test_value_kinds() {
        let got = strategies("package p\nconst A = 1\nvar B int\n", false);
        assert_eq!(
            got,
            vec![
                ("A".to_string(), Strategy::ConstForward),
                ("B".to_string(), Strategy::VarForward)
            ]
        );
    }

    #[test]
    fn test_function_precedence() {
        let src = r#"package p
func Plain(a int) error { return nil }
func Variadic(xs ...int) {}
func Generic[T any](x T) T { return x }
func Both[T any](xs ...T) {}
"#;
        let got = strategies(src, false);
        assert_eq!(got[0].1, Strategy::FuncValueForward);
        assert_eq!(
            got[1].1,
            Strategy::FuncWrapper { reason: WrapReason::Variadic }
        );
        assert_eq!(
            got[2].1,
            Strategy::FuncWrapper { reason: WrapReason::Generic }
        );
        assert_eq!(
            got[3].1,
            Strategy::FuncWrapper { reason: WrapReason::Generic }
        );
    }

    #[test]
    fn test_wrap_functions_never_downgrades() {
        let src = "package p\nfunc Plain() {}\nfunc Generic[T any]() {}\n";
        let got = strategies(src, true);
        assert_eq!(
            got[0].1,
            Strategy::FuncWrapper { reason: WrapReason::Forced }
        );
        assert_eq!(
            got[1].1,
            Strategy::FuncWrapper { reason: WrapReason::Generic }
        );
    }

    #[test]
    fn test_all_type_kinds_alias_forward() {
        let src = "package p\ntype A int\ntype B = A\ntype C interface{}\ntype D struct{}\n\
            type E[T any] []T\n";
        assert!(
            strategies(src, false)
                .iter()
                .all(|(_, s)| *s == Strategy::TypeAliasForward)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Strategy::ConstForward.to_string(), "const-forward");
        assert_eq!(
            Strategy::FuncWrapper { reason: WrapReason::Variadic }.to_string(),
            "func-wrapper (variadic)"
        );
    }
}
