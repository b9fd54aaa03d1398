// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use ariadne::Config;
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use ofc_syntax::TextRange;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::diagnostic::{ErrorTrait, Severity};

/// Source text paired with the path used to label diagnostics. The path does not
/// need to exist, e.g. for code that came from a literal string.
#[derive(Clone, Debug)]
pub struct SourceString {
    file_path: PathBuf,
    source: String,
}

impl SourceString {
    pub fn new<T: ToString>(source: T, fake_file_path: Option<&str>) -> SourceString {
        SourceString {
            file_path: PathBuf::from(fake_file_path.unwrap_or("no file")),
            source: source.to_string(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn print_errors<T: ErrorTrait>(&self, errors: &[T]) {
        inner_print_compiler_errors(errors, &self.file_path, &self.source);
    }
}

/// `TextRange` comes from rowan, ariadne wants a `Range<usize>`.
pub(crate) fn range_to_span(range: &TextRange) -> Range<usize> {
    let r1: usize = range.start().into();
    let r2: usize = range.end().into();
    r1..r2
}

/// Print compiler errors. Diagnostics include text taken from `source`.
/// `info_file_path` is only used for labelling.
pub fn inner_print_compiler_errors<T: ErrorTrait>(
    errors: &[T],
    info_file_path: &Path,
    source: &str,
) {
    let file_path_str = info_file_path.to_string_lossy();
    for err in errors.iter() {
        let err_string = err.message();
        let err_span = range_to_span(&err.range());
        let kind = match err.severity() {
            Severity::Warning => ReportKind::Warning,
            Severity::Error => ReportKind::Error,
        };
        report(kind, &err_string, &err_span, &file_path_str, source);
        println!();
    }
}

/// Read `file_path` and print `errors` against its contents. If the file cannot
/// be read the messages are printed without source context.
pub fn print_compiler_errors<T: ErrorTrait>(errors: &[T], file_path: &Path) {
    if errors.is_empty() {
        return;
    }
    match fs::read_to_string(file_path) {
        Ok(source) => inner_print_compiler_errors(errors, file_path, &source),
        Err(err) => {
            eprintln!("Unable to read '{}': {}", file_path.display(), err);
            for error in errors {
                eprintln!("{}", error.message());
            }
        }
    }
}

pub fn report_error(message: &str, span: &Range<usize>, file_path: &str, source: &str) {
    report(ReportKind::Error, message, span, file_path, source)
}

fn report(kind: ReportKind, message: &str, span: &Range<usize>, file_path: &str, source: &str) {
    let mut colors = ColorGenerator::new();
    let a = colors.next();
    let printed = Report::build(kind, (file_path, span.clone()))
        .with_message(message)
        .with_config(Config::default().with_compact(true))
        .with_label(
            Label::new((file_path, span.clone()))
                .with_message("Near this point")
                .with_color(a),
        )
        .finish()
        .print((file_path, Source::from(source)));
    if let Err(err) = printed {
        eprintln!("{message} (failed to render diagnostic: {err})");
    }
}
