// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::Expr;
use crate::inference::context::Context;
use crate::inference::requirements::Requirements;

use super::VisitResult;

/// A variable is required to be whatever its context expects.
pub fn visit_name(expr: &Expr, name: &str, ctx: &Context) -> VisitResult {
    let structure = ctx
        .predicted_struct
        .clone()
        .with_label(name)
        .with_line(expr.line());
    let reqs = Requirements::single(name, structure.clone());
    Ok((structure, reqs))
}
