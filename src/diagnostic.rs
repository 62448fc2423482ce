//! Rich error reporting using codespan-reporting.

use std::io::Write;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use goshim::load::LoadError;

/// A single source file for codespan-reporting.
pub struct SourceDb {
    file: SimpleFile<String, String>,
}

impl SourceDb {
    pub fn new(name: String, source: String) -> Self {
        Self {
            file: SimpleFile::new(name, source),
        }
    }

    /// Report a parse error with source context.
    pub fn report_parse_error(&self, message: &str, span: Range<usize>) {
        let diagnostic = Diagnostic::error()
            .with_message(message)
            .with_labels(vec![
                Label::primary((), span).with_message("error occurs here"),
            ]);

        let writer = term::termcolor::StandardStream::stderr(term::termcolor::ColorChoice::Auto);
        let config = term::Config::default();
        let _ = term::emit(&mut writer.lock(), &config, &self.file, &diagnostic);
    }
}

/// Report a LoadError, with source context for parse errors.
pub fn report_load_error(err: &LoadError) {
    match err {
        LoadError::Parse {
            path,
            source_code,
            error,
        } => {
            let db = SourceDb::new(path.clone(), source_code.clone());
            let end = error.span.range.end.min(source_code.len());
            let start = error.span.range.start.min(end);
            db.report_parse_error(&error.message, start..end);
        }
        _ => print_error(&err.to_string()),
    }
}

/// Report a command failure. Parse errors anywhere in the chain get source context.
pub fn report_error(err: &anyhow::Error) {
    if let Some(load) = err.chain().find_map(|e| e.downcast_ref::<LoadError>()) {
        if matches!(load, LoadError::Parse { .. }) {
            report_load_error(load);
            return;
        }
    }
    print_error(&format!("{err:#}"));
}

/// `Error: message` with a colored prefix.
fn print_error(message: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "Error:");
    let _ = stderr.reset();
    let _ = writeln!(stderr, " {message}");
}
