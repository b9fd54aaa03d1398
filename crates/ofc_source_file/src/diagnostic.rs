// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use ofc_syntax::TextRange;
use std::fmt;

pub trait ErrorTrait {
    /// Return a message describing the error.
    fn message(&self) -> String;

    /// Return the character range in the source associated with the error.
    fn range(&self) -> TextRange;

    fn severity(&self) -> Severity {
        Severity::Error
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn new<T: ToString>(severity: Severity, message: T, range: TextRange) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.to_string(),
            range,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl ErrorTrait for Diagnostic {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn range(&self) -> TextRange {
        self.range
    }

    fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{tag}: {}, {:?}", self.message, self.range)
    }
}

/// Receiver of diagnostics. Reporting is synchronous. The returned flag says
/// whether the report was accepted, and is all a caller ever looks at.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic) -> bool;

    fn warning<T: ToString>(&mut self, range: TextRange, message: T) -> bool
    where
        Self: Sized,
    {
        self.report(Diagnostic::new(Severity::Warning, message, range))
    }

    fn error<T: ToString>(&mut self, range: TextRange, message: T) -> bool
    where
        Self: Sized,
    {
        self.report(Diagnostic::new(Severity::Error, message, range))
    }
}

/// A sink that keeps everything it is given, in order.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticList {
    list: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> DiagnosticList {
        DiagnosticList { list: Vec::new() }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn any_errors(&self) -> bool {
        self.list.iter().any(Diagnostic::is_error)
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }
}

impl std::ops::Deref for DiagnosticList {
    type Target = Vec<Diagnostic>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl DiagnosticSink for DiagnosticList {
    fn report(&mut self, diagnostic: Diagnostic) -> bool {
        self.list.push(diagnostic);
        true
    }
}
