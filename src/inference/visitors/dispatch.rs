// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::inference::context::Context;
use crate::inference::error::InferenceError;

use super::access::{visit_getattr, visit_getitem};
use super::filter::visit_filter;
use super::literals::{visit_const, visit_list, visit_tuple};
use super::names::visit_name;
use super::VisitResult;

/// Infer the structure of any expression and what it requires from the
/// template's variables.
///
/// The context's predicted structure is what the enclosing expression needs
/// this one to produce.
pub fn visit_expr(expr: &Ref<Expr>, ctx: &Context) -> VisitResult {
    if ctx.depth() > ctx.config.max_depth {
        return Err(InferenceError::DepthLimitExceeded {
            line: expr.line(),
            limit: ctx.config.max_depth,
        });
    }

    trace!(
        kind = expr.kind_name(),
        line = expr.line(),
        predicted = %ctx.predicted_struct,
        "visiting expression"
    );

    match expr.as_ref() {
        Expr::Name { name, .. } => visit_name(expr, name, ctx),
        Expr::Const { value, .. } => visit_const(expr, value, ctx),
        Expr::List { items, .. } => visit_list(expr, items, ctx),
        Expr::Tuple { items, .. } => visit_tuple(expr, items, ctx),
        Expr::Getattr { node, attr, .. } => visit_getattr(expr, node, &attr.1, ctx),
        Expr::Getitem { node, index, .. } => visit_getitem(expr, node, index, ctx),
        Expr::Filter { .. } => visit_filter(expr, ctx),
    }
}
