//! Forwarding declaration synthesis.

use std::collections::HashSet;

use goshim_syntax::{type_params_to_string, Doc, Field, Package, Signature, TypeExpr, TypeParam};

use crate::classify::Strategy;
use crate::error::GenerateError;
use crate::extract::{SymbolRecord, SymbolSignature};
use crate::qualify::{ImportSet, Qualifier, Scope};

/// Source text of one forwarding declaration, doc comment included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardDecl {
    pub name: String,
    pub text: String,
}

pub(crate) struct Synthesizer<'a> {
    alias: &'a str,
    qualifier: Qualifier<'a>,
    imports: ImportSet,
}

impl<'a> Synthesizer<'a> {
    pub(crate) fn new(
        package: &'a Package,
        alias: &'a str,
        symbols: &[(SymbolRecord<'a>, Strategy)],
    ) -> Self {
        let mut reserved: HashSet<String> = HashSet::from([alias.to_string()]);
        for (record, _) in symbols {
            reserved.insert(record.name.to_string());
            reserved.extend(
                goshim_syntax::type_param_names(record.type_params()).map(String::from),
            );
        }
        Self {
            alias,
            qualifier: Qualifier::new(package, alias),
            imports: ImportSet::new(reserved),
        }
    }

    /// Imports collected while synthesizing, as `(path, local)` sorted by path.
    pub(crate) fn finish(self) -> Vec<(String, String)> {
        self.imports.into_sorted()
    }

    pub(crate) fn forward(
        &mut self,
        record: &SymbolRecord<'a>,
        strategy: Strategy,
    ) -> Result<ForwardDecl, GenerateError> {
        let name = record.name;
        let alias = self.alias;
        let decl = match strategy {
            Strategy::ConstForward => format!("const {name} = {alias}.{name}"),
            Strategy::VarForward | Strategy::FuncValueForward => {
                format!("var {name} = {alias}.{name}")
            }
            Strategy::TypeAliasForward => self
                .type_alias(record)
                .map_err(|reason| GenerateError::unsupported(name, reason))?,
            Strategy::FuncWrapper { .. } => self
                .wrapper(record)
                .map_err(|reason| GenerateError::unsupported(name, reason))?,
        };

        let mut text = String::new();
        if let Some(doc) = record.doc {
            for line in doc_lines(doc) {
                text.push_str(line);
                text.push('\n');
            }
        }
        text.push_str(&decl);
        Ok(ForwardDecl {
            name: name.to_string(),
            text,
        })
    }

    fn type_alias(&mut self, record: &SymbolRecord<'a>) -> Result<String, String> {
        let name = record.name;
        let params = record.type_params();
        if params.is_empty() {
            return Ok(format!("type {name} = {}.{name}", self.alias));
        }
        let scope = Scope::new(record.file, params);
        let restated = self.qualifier.type_params(params, &scope, &mut self.imports)?;
        Ok(format!(
            "type {name}{} = {}.{name}{}",
            type_params_to_string(&restated),
            self.alias,
            instantiation(params)
        ))
    }

    fn wrapper(&mut self, record: &SymbolRecord<'a>) -> Result<String, String> {
        let SymbolSignature::Func { type_params, sig } = &record.signature else {
            return Err(format!("`{}` is not a function", record.name));
        };
        let name = record.name;
        let scope = Scope::new(record.file, type_params);
        let restated = self.qualifier.type_params(type_params, &scope, &mut self.imports)?;
        let qualified = self.qualifier.signature(sig, &scope, &mut self.imports)?;
        let (params, args) = wrapper_params(&qualified, self.alias);
        let results = qualified
            .results
            .into_iter()
            .flat_map(|f| {
                let count = f.names.len().max(1);
                std::iter::repeat(f.ty).take(count)
            })
            .map(|ty| Field {
                names: Vec::new(),
                ty,
            })
            .collect::<Vec<_>>();

        let call = format!(
            "{}.{name}{}({})",
            self.alias,
            instantiation(type_params),
            args.join(", ")
        );
        let body = if results.is_empty() {
            call
        } else {
            format!("return {call}")
        };
        let sig = Signature { params, results };
        Ok(format!(
            "func {name}{}{sig} {{\n\t{body}\n}}",
            type_params_to_string(&restated)
        ))
    }
}

/// `[K, V]` for a generic declaration, or nothing.
fn instantiation(params: &[TypeParam]) -> String {
    let names: Vec<&str> = goshim_syntax::type_param_names(params).collect();
    if names.is_empty() {
        String::new()
    } else {
        format!("[{}]", names.join(", "))
    }
}

/// Wrapper parameters and the matching call arguments.
///
/// Source names are kept; unnamed, blank and alias-shadowing parameters get
/// fresh `pN` names, N being the parameter's position.
fn wrapper_params(sig: &Signature, alias: &str) -> (Vec<Field>, Vec<String>) {
    let mut used: HashSet<String> = sig
        .params
        .iter()
        .flat_map(|f| f.names.iter().cloned())
        .collect();
    used.insert(alias.to_string());

    let mut params = Vec::with_capacity(sig.params.len());
    let mut args = Vec::new();
    let mut position = 0;
    for field in &sig.params {
        let variadic = matches!(field.ty, TypeExpr::Ellipsis(_));
        let originals: Vec<Option<&str>> = if field.names.is_empty() {
            vec![None]
        } else {
            field.names.iter().map(|n| Some(n.as_str())).collect()
        };
        let mut names = Vec::with_capacity(originals.len());
        for original in originals {
            let chosen = match original {
                Some(n) if n != "_" && n != alias => n.to_string(),
                _ => fresh_name(position, &mut used),
            };
            args.push(if variadic {
                format!("{chosen}...")
            } else {
                chosen.clone()
            });
            names.push(chosen);
            position += 1;
        }
        params.push(Field {
            names,
            ty: field.ty.clone(),
        });
    }
    (params, args)
}

fn fresh_name(position: usize, used: &mut HashSet<String>) -> String {
    let mut candidate = format!("p{position}");
    while used.contains(&candidate) {
        candidate.push('_');
    }
    used.insert(candidate.clone());
    candidate
}

/// Doc comment lines, minus `//go:` and `//line` directives and the blank
/// `//` lines left dangling before them.
fn doc_lines(doc: &Doc) -> Vec<&str> {
    let mut lines: Vec<&str> = doc
        .comments
        .iter()
        .filter(|c| !(c.starts_with("//go:") || c.starts_with("//line ")))
        .flat_map(|c| c.lines())
        .collect();
    while lines.last().is_some_and(|line| line.trim_end() == "//") {
        lines.pop();
    }
    lines
}
