// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::model::{MergeError, Structure};

/// Broad category of an inference failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    UnknownFilter,
    UnsupportedFilter,
    InvalidArguments,
    DepthLimitExceeded,
}

/// Error raised while inferring the structure of a template expression.
///
/// Every variant keeps its data in typed fields; the message is only
/// rendered when the error is displayed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// The structure an expression produces is not what its context needs.
    #[error("conflict on the line {line}\ngot: AST node {node_kind} of structure {got}\nexpected structure: {expected}")]
    Conflict {
        line: u32,
        node_kind: &'static str,
        got: Box<Structure>,
        expected: Box<Structure>,
    },

    /// Two usages of the same value require incompatible structures.
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("line {line}: unknown filter \"{name}\"")]
    UnknownFilter { line: u32, name: String },

    #[error("line {line}: \"{name}\" filter is not supported")]
    UnsupportedFilter { line: u32, name: String },

    #[error("line {line}: invalid arguments for \"{name}\" filter: {detail}")]
    InvalidArguments {
        line: u32,
        name: String,
        detail: String,
    },

    #[error("line {line}: expression nesting exceeds the limit of {limit}")]
    DepthLimitExceeded { line: u32, limit: u32 },
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::Conflict { .. } | InferenceError::Merge(_) => ErrorKind::Conflict,
            InferenceError::UnknownFilter { .. } => ErrorKind::UnknownFilter,
            InferenceError::UnsupportedFilter { .. } => ErrorKind::UnsupportedFilter,
            InferenceError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            InferenceError::DepthLimitExceeded { .. } => ErrorKind::DepthLimitExceeded,
        }
    }

    pub fn conflict(line: u32, node_kind: &'static str, got: &Structure, expected: &Structure) -> Self {
        InferenceError::Conflict {
            line,
            node_kind,
            got: Box::new(got.clone()),
            expected: Box::new(expected.clone()),
        }
    }

    /// Line the failure is attributed to, when it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            InferenceError::Conflict { line, .. }
            | InferenceError::UnknownFilter { line, .. }
            | InferenceError::UnsupportedFilter { line, .. }
            | InferenceError::InvalidArguments { line, .. }
            | InferenceError::DepthLimitExceeded { line, .. } => Some(*line),
            InferenceError::Merge(e) => e
                .left
                .linenos
                .iter()
                .chain(e.right.linenos.iter())
                .max()
                .copied(),
        }
    }
}
