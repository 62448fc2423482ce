//! The import binding of the source package and Go's reserved names.

use crate::classify::Strategy;
use crate::error::GenerateError;
use crate::extract::SymbolRecord;

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

const PREDECLARED_VALUES: &[&str] = &["true", "false", "iota", "nil"];

const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

pub fn is_predeclared_type(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

/// Any identifier of Go's universe block.
pub fn is_predeclared(name: &str) -> bool {
    is_predeclared_type(name) || PREDECLARED_VALUES.contains(&name) || BUILTIN_FUNCS.contains(&name)
}

/// A Go identifier that is not a keyword.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_') && !is_keyword(name)
}

/// The package name an unnamed import of `path` is assumed to bind:
/// the last path element, skipping a `/vN` major-version suffix, without a
/// `go-` prefix and cut at the first non-identifier character.
pub fn assumed_import_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut base = segments.next().unwrap_or(path);
    if is_major_version(base) {
        if let Some(prev) = segments.next() {
            base = prev;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    base[..end].to_string()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| {
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        })
}

/// The original package's import path paired with its local alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub path: String,
    pub alias: String,
}

impl ImportBinding {
    pub fn new(path: &str, alias: &str) -> Result<Self, GenerateError> {
        if path.trim().is_empty() {
            return Err(GenerateError::EmptyImportPath);
        }
        let reserved = if alias == "_" {
            Some("blank identifier")
        } else if is_keyword(alias) {
            Some("keyword")
        } else if is_predeclared(alias) {
            Some("predeclared identifier")
        } else {
            None
        };
        if reserved.is_some() {
            return Err(GenerateError::AliasCollision {
                alias: alias.to_string(),
                name: alias.to_string(),
                reserved,
            });
        }
        if !is_valid_identifier(alias) {
            return Err(GenerateError::InvalidIdentifier {
                role: "import alias",
                name: alias.to_string(),
            });
        }
        Ok(Self {
            path: path.to_string(),
            alias: alias.to_string(),
        })
    }

    /// Fail if the alias would be shadowed by, or would shadow, a name the
    /// shim declares: an emitted symbol, or a type parameter of a generic
    /// forwarding declaration.
    pub fn check_collisions(
        &self,
        symbols: &[(SymbolRecord<'_>, Strategy)],
    ) -> Result<(), GenerateError> {
        for (record, strategy) in symbols {
            if record.name == self.alias {
                return Err(self.collision(record.name));
            }
            let restates_params = matches!(
                strategy,
                Strategy::FuncWrapper { .. } | Strategy::TypeAliasForward
            );
            if restates_params {
                if let Some(param) = goshim_syntax::type_param_names(record.type_params())
                    .find(|p| *p == self.alias)
                {
                    return Err(self.collision(param));
                }
            }
        }
        Ok(())
    }

    fn collision(&self, name: &str) -> GenerateError {
        GenerateError::AliasCollision {
            alias: self.alias.clone(),
            name: name.to_string(),
            reserved: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("strings"));
        assert!(is_valid_identifier("_x1"));
        assert!(is_valid_identifier("café"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("func"));
    }

    #[test]
    fn test_assumed_import_name() {
        assert_eq!(assumed_import_name("fmt"), "fmt");
        assert_eq!(assumed_import_name("net/http"), "http");
        assert_eq!(assumed_import_name("github.com/mattn/go-isatty"), "isatty");
        assert_eq!(assumed_import_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(assumed_import_name("example.com/mod/v2"), "mod");
        assert_eq!(assumed_import_name("example.com/v2"), "example");
    }

    #[test]
    fn test_binding_rejects_reserved_alias() {
        let cases = [
            ("_", "blank identifier"),
            ("int", "predeclared identifier"),
            ("error", "predeclared identifier"),
            ("len", "predeclared identifier"),
            ("nil", "predeclared identifier"),
            ("type", "keyword"),
        ];
        for (alias, class) in cases {
            assert_eq!(
                ImportBinding::new("example.com/p", alias),
                Err(GenerateError::AliasCollision {
                    alias: alias.to_string(),
                    name: alias.to_string(),
                    reserved: Some(class),
                })
            );
        }
        assert_eq!(
            ImportBinding::new("example.com/p", "len")
                .unwrap_err()
                .to_string(),
            "import alias `len` collides with predeclared identifier `len`"
        );
    }

    #[test]
    fn test_binding_rejects_invalid_alias_and_empty_path() {
        assert!(matches!(
            ImportBinding::new("example.com/p", "my-pkg"),
            Err(GenerateError::InvalidIdentifier { role: "import alias", .. })
        ));
        assert_eq!(
            ImportBinding::new("  ", "p"),
            Err(GenerateError::EmptyImportPath)
        );
    }
}
