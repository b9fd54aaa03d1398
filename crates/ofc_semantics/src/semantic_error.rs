// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

use ofc_source_file::{ErrorTrait, SourceString};
use smol_str::SmolStr;
use std::collections::TryReserveError;
use std::fmt;

use crate::TextRange;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SemanticErrorKind {
    #[error("`{0}` is already declared in this scope")]
    DuplicateName(SmolStr),
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),
    #[error("invalid type: {0}")]
    InvalidType(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("reference to undeclared `{0}`")]
    UndeclaredReference(SmolStr),
    #[error("bad subscript: {0}")]
    SubscriptError(String),
    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),
    #[error("expression is not constant")]
    NotConstant,
    #[error("division by zero in constant expression")]
    DivideByZero,
    #[error("constant expression overflows its type")]
    Overflow,
    #[error("`{0}` is already initialized with a different value")]
    AlreadyInitialized(SmolStr),
    #[error("out of memory")]
    AllocationFailure,
}

/// A failed resolution. `range` is the position token of the syntactic node that
/// triggered the failure, when one was at hand.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct SemanticError {
    kind: SemanticErrorKind,
    range: Option<TextRange>,
}

pub type SemaResult<T> = Result<T, SemanticError>;

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, range: TextRange) -> SemanticError {
        SemanticError {
            kind,
            range: Some(range),
        }
    }

    pub fn kind(&self) -> &SemanticErrorKind {
        &self.kind
    }

    pub fn range(&self) -> Option<TextRange> {
        self.range
    }

    /// Attach `range` unless a more precise one is already recorded.
    pub fn or_range(mut self, range: TextRange) -> SemanticError {
        if self.range.is_none() {
            self.range = Some(range);
        }
        self
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl From<SemanticErrorKind> for SemanticError {
    fn from(kind: SemanticErrorKind) -> SemanticError {
        SemanticError { kind, range: None }
    }
}

impl From<TryReserveError> for SemanticError {
    fn from(_: TryReserveError) -> SemanticError {
        SemanticErrorKind::AllocationFailure.into()
    }
}

impl From<hashbrown::TryReserveError> for SemanticError {
    fn from(_: hashbrown::TryReserveError) -> SemanticError {
        SemanticErrorKind::AllocationFailure.into()
    }
}

/// Shorthand used throughout the crate: `Err(mismatch(...))?`.
pub(crate) fn type_mismatch<T: ToString>(detail: T) -> SemanticError {
    SemanticErrorKind::TypeMismatch(detail.to_string()).into()
}

pub(crate) fn invalid_declaration<T: ToString>(detail: T) -> SemanticError {
    SemanticErrorKind::InvalidDeclaration(detail.to_string()).into()
}

impl ErrorTrait for SemanticError {
    fn message(&self) -> String {
        self.message()
    }

    fn range(&self) -> TextRange {
        self.range.unwrap_or_default()
    }
}

/// Errors collected while analyzing a source file, one per failed statement.
#[derive(Clone, Debug, Default)]
pub struct SemanticErrorList {
    list: Vec<SemanticError>,
}

impl std::ops::Deref for SemanticErrorList {
    type Target = Vec<SemanticError>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl SemanticErrorList {
    pub fn new() -> SemanticErrorList {
        SemanticErrorList {
            list: Vec::<SemanticError>::new(),
        }
    }

    pub fn insert(&mut self, error: SemanticError) {
        self.list.push(error);
    }

    pub fn any_semantic_errors(&self) -> bool {
        !self.list.is_empty()
    }

    /// Print errors against `source`, which need not come from a real file.
    pub fn print_errors(&self, source: &SourceString) {
        if !self.list.is_empty() {
            source.print_errors(&self.list);
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &SemanticErrorKind> {
        self.list.iter().map(SemanticError::kind)
    }
}

impl fmt::Display for SemanticErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.list {
            writeln!(f, "{:?}: {}", error.range(), error)?;
        }
        Ok(())
    }
}
