//! Output assembly: header, package clause, imports, sorted declarations.

use crate::binding::{assumed_import_name, ImportBinding};
use crate::synth::ForwardDecl;

/// Everything that goes into one generated file.
pub(crate) struct Unit<'a> {
    pub package_name: &'a str,
    pub binding: &'a ImportBinding,
    /// Re-imported dependencies as `(path, local)`.
    pub imports: Vec<(String, String)>,
    pub decls: Vec<ForwardDecl>,
    pub header: bool,
}

pub(crate) fn assemble(unit: Unit<'_>) -> String {
    let Unit {
        package_name,
        binding,
        mut imports,
        mut decls,
        header,
    } = unit;

    let mut out = String::new();
    if header {
        out.push_str(&format!(
            "// Code generated by goshim from {}. DO NOT EDIT.\n\n",
            binding.path
        ));
    }
    out.push_str(&format!("package {package_name}\n\n"));

    if decls.is_empty() {
        // Keeps the dependency edge, and the file compiles without using the alias.
        out.push_str(&format!("import _ {}\n", quote(&binding.path)));
        return out;
    }

    imports.push((binding.path.clone(), binding.alias.clone()));
    imports.sort();
    if let [(path, local)] = imports.as_slice() {
        out.push_str(&format!("import {}\n", import_spec(path, local, true)));
    } else {
        out.push_str("import (\n");
        for (path, local) in &imports {
            let explicit = *path == binding.path;
            out.push_str(&format!("\t{}\n", import_spec(path, local, explicit)));
        }
        out.push_str(")\n");
    }

    decls.sort_by(|a, b| a.name.cmp(&b.name));
    for decl in &decls {
        out.push('\n');
        out.push_str(&decl.text);
        out.push('\n');
    }
    out
}

/// `local "path"`, or just `"path"` when the local name is the assumed one.
fn import_spec(path: &str, local: &str, always_named: bool) -> String {
    if !always_named && assumed_import_name(path) == local {
        quote(path)
    } else {
        format!("{local} {}", quote(path))
    }
}

fn quote(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    out.push('"');
    for ch in path.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, text: &str) -> ForwardDecl {
        ForwardDecl {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    fn binding() -> ImportBinding {
        ImportBinding::new("example.com/lib/shapes", "shapes").unwrap()
    }

    #[test]
    fn test_single_import_and_sorted_decls() {
        let binding = binding();
        let out = assemble(Unit {
            package_name: "shapes",
            binding: &binding,
            imports: vec![],
            decls: vec![
                decl("Square", "type Square = shapes.Square"),
                decl("Area", "var Area = shapes.Area"),
            ],
            header: true,
        });
        assert_eq!(
            out,
            "// Code generated by goshim from example.com/lib/shapes. DO NOT EDIT.\n\n\
             package shapes\n\n\
             import shapes \"example.com/lib/shapes\"\n\n\
             var Area = shapes.Area\n\n\
             type Square = shapes.Square\n"
        );
    }

    #[test]
    fn test_import_block_sorted_by_path() {
        let binding = binding();
        let out = assemble(Unit {
            package_name: "facade",
            binding: &binding,
            imports: vec![
                ("net/http".to_string(), "http".to_string()),
                ("context".to_string(), "context2".to_string()),
            ],
            decls: vec![decl("A", "const A = shapes.A")],
            header: false,
        });
        assert_eq!(
            out,
            "package facade\n\n\
             import (\n\
             \tcontext2 \"context\"\n\
             \tshapes \"example.com/lib/shapes\"\n\
             \t\"net/http\"\n\
             )\n\n\
             const A = shapes.A\n"
        );
    }

    #[test]
    fn test_empty_package_uses_blank_import() {
        let binding = binding();
        let out = assemble(Unit {
            package_name: "shapes",
            binding: &binding,
            imports: vec![],
            decls: vec![],
            header: false,
        });
        assert_eq!(
            out,
            "package shapes\n\nimport _ \"example.com/lib/shapes\"\n"
        );
    }
}
