// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis for the OFC Fortran front end.
//!
//! [`syntax_to_semantics::analyze_source`] takes the parse tree of a source file
//! and builds typed symbol tables, storage association (COMMON and EQUIVALENCE)
//! and typed expressions, collected in a [`context::Context`]. The executable
//! statements come back as an ASG, an abstract semantic graph, of typed
//! statements. Constant expressions are folded on the way.

pub mod asg;
pub mod common;
pub mod context;
pub mod decl;
pub mod equiv;
pub mod expr_resolver;
pub mod implicit;
pub mod intrinsics;
pub mod scope;
pub mod semantic_error;
pub mod syntax_to_semantics;
pub mod types;
pub mod typeval;

// Ranges are attached to declarations, expressions and errors.
pub use rowan::{TextRange, TextSize};
