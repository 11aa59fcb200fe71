// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Static inference of the structure a template expects from its context.
//!
//! Nothing is rendered. The analysis walks each output expression top-down
//! with the structure the enclosing expression expects of it, and bottom-up
//! with the structure the expression was found to have. Every variable
//! reference contributes a requirement; requirements coming from different
//! places are combined with [`merge`](model::merge), which fails when two
//! usages cannot describe the same value.
//!
//! * `model.rs` holds [`Structure`] and the merge algebra.
//! * `requirements.rs` maps variable names to structures.
//! * `context.rs` carries the expectation and [`Config`] through the walk.
//! * `filters/` is the table of filter contracts, loaded from JSON.
//! * `visitors/` walks expressions; the filter visitor is the heart of it.
//! * `json_schema.rs` renders requirements as a JSON Schema document.

pub mod context;
pub mod error;
pub mod filters;
pub mod json_schema;
pub mod model;
pub mod requirements;
pub mod visitors;

#[cfg(test)]
mod prop_tests;

pub use context::{ContainerKind, Config, Context, IgnoreUnknownFilters};
pub use error::{ErrorKind, InferenceError};
pub use model::{merge, MergeError, Structure, StructureClass, StructureKind};
pub use requirements::Requirements;
pub use visitors::{infer_template, visit_expr, visit_filter, VisitResult};
