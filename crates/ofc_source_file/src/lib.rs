// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics for the OFC semantic analyzer. The analyzer pushes warnings and
//! errors into a `DiagnosticSink` as it goes. `report_error` formats them with the
//! external crate `ariadne` against the source text they were produced from.

mod api;
mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticList, DiagnosticSink, ErrorTrait, Severity};

pub use api::{inner_print_compiler_errors, print_compiler_errors, report_error, SourceString};
