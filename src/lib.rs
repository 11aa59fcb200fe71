// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

#[macro_use]
mod macros;

mod ast;
mod engine;
pub mod inference;
mod lexer;
mod parser;
mod value;

pub use engine::Engine;
pub use inference::{
    Config, Context, ErrorKind, IgnoreUnknownFilters, InferenceError, Requirements, Structure,
    StructureClass, StructureKind,
};
pub use value::Value;

pub(crate) use std::rc::Rc;

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::ast::*;
    pub use crate::lexer::*;
    pub use crate::parser::*;
}

#[cfg(test)]
mod tests;
