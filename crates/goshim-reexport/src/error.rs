//! Errors surfaced by shim generation.

/// A fatal generation error. No partial output is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// A declaration the parser accepted but that cannot be a valid Go
    /// declaration (duplicate names, missing initializers, bad receivers).
    #[error("malformed declaration `{symbol}`: {reason}")]
    Extraction { symbol: String, reason: String },

    /// A function or generic type whose signature cannot be restated in the shim.
    #[error("cannot forward `{symbol}`: {reason}")]
    UnsupportedSignature { symbol: String, reason: String },

    /// The import alias clashes with a name visible in the shim. `reserved`
    /// names the class when `name` is a keyword, a predeclared name, or `_`.
    #[error("import alias `{alias}` collides with {}", collision_target(name, *reserved))]
    AliasCollision {
        alias: String,
        name: String,
        reserved: Option<&'static str>,
    },

    #[error("invalid {role} `{name}`")]
    InvalidIdentifier { role: &'static str, name: String },

    #[error("import path must not be empty")]
    EmptyImportPath,
}

fn collision_target(name: &str, reserved: Option<&str>) -> String {
    match reserved {
        Some(class) => format!("{class} `{name}`"),
        None => format!("`{name}`"),
    }
}

impl GenerateError {
    pub(crate) fn extraction(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerateError::Extraction {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerateError::UnsupportedSignature {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}
