// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, Ref};
use crate::inference::context::Context;
use crate::inference::error::InferenceError;
use crate::inference::model::{merge, Structure, StructureKind};
use crate::inference::requirements::Requirements;
use crate::value::Value;

use super::dispatch::visit_expr;
use super::VisitResult;

// The inferred structure of a literal must fit what the context expects.
fn reconcile(expr: &Expr, got: Structure, ctx: &Context) -> Result<Structure, InferenceError> {
    let merged = merge(&ctx.predicted_struct, &got).map_err(|_| {
        InferenceError::conflict(expr.line(), expr.kind_name(), &got, &ctx.predicted_struct)
    })?;
    let mut structure = got.retag(merged.kind);
    structure.value = got.value;
    structure.constant = got.constant;
    Ok(structure)
}

pub fn visit_const(expr: &Expr, value: &Value, ctx: &Context) -> VisitResult {
    let got = Structure::from_value(value).with_line(expr.line());
    Ok((reconcile(expr, got, ctx)?, Requirements::new()))
}

pub fn visit_list(expr: &Expr, items: &[Ref<Expr>], ctx: &Context) -> VisitResult {
    let predicted_element = match &ctx.predicted_struct.kind {
        StructureKind::List(element) => element.as_ref().clone(),
        _ => Structure::unknown(),
    };

    let mut element = Structure::unknown();
    let mut reqs = Requirements::new();
    for item in items {
        let (s, r) = visit_expr(item, &ctx.descend(predicted_element.clone()))?;
        element = merge(&element, &s)?;
        reqs.merge_in(r)?;
    }

    let mut got = Structure::list(element).with_line(expr.line());
    if let Some(values) = items
        .iter()
        .map(|item| item.as_const().cloned())
        .collect::<Option<Vec<Value>>>()
    {
        got.value = Some(Value::from(values));
        got.constant = true;
    }
    Ok((reconcile(expr, got, ctx)?, reqs))
}

pub fn visit_tuple(expr: &Expr, items: &[Ref<Expr>], ctx: &Context) -> VisitResult {
    let predicted_items = match &ctx.predicted_struct.kind {
        StructureKind::Tuple(predicted) if predicted.len() == items.len() => predicted.clone(),
        _ => vec![Structure::unknown(); items.len()],
    };

    let mut structures = Vec::with_capacity(items.len());
    let mut reqs = Requirements::new();
    for (item, predicted) in items.iter().zip(predicted_items) {
        let (s, r) = visit_expr(item, &ctx.descend(predicted))?;
        structures.push(s);
        reqs.merge_in(r)?;
    }

    let got = Structure::tuple(structures).with_line(expr.line());
    Ok((reconcile(expr, got, ctx)?, reqs))
}
