// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Syntactic input to the OFC semantic analyzer.
//!
//! The lexer and the parser live outside this workspace. What they hand over is
//! described here: plain, read-only trees of program units, statements,
//! declarations and expressions. Every node carries the `TextRange` of the source
//! it was parsed from. The analyzer never inspects a range, it only forwards it to
//! diagnostics.

pub mod ast;

pub use rowan::{TextRange, TextSize};
pub use smol_str::SmolStr;
