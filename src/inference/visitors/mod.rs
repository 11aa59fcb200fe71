// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod access;
mod dispatch;
mod filter;
mod literals;
mod names;
mod template;

use super::error::InferenceError;
use super::model::Structure;
use super::requirements::Requirements;

/// Structure of the visited expression and the requirements it places on
/// the template's variables.
pub type VisitResult = Result<(Structure, Requirements), InferenceError>;

pub use dispatch::visit_expr;
pub use filter::visit_filter;
pub use template::infer_template;
