// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use crate::ast::{Expr, Ref};
use crate::inference::context::{ContainerKind, Context};
use crate::inference::model::{Structure, StructureKind};
use crate::value::Value;

use super::dispatch::visit_expr;
use super::VisitResult;

fn field(name: &str, structure: Structure) -> Structure {
    let mut fields = BTreeMap::new();
    fields.insert(name.to_string(), structure);
    Structure::dictionary(fields)
}

// Visit `node` as a dictionary holding `name`, returning the field.
fn visit_field(expr: &Expr, node: &Ref<Expr>, name: &str, ctx: &Context) -> VisitResult {
    let line = expr.line();
    let predicted_field = ctx.predicted_struct.clone().with_label(name).with_line(line);
    let (base, reqs) = visit_expr(
        node,
        &ctx.descend(field(name, predicted_field.clone()).with_line(line)),
    )?;

    let structure = match &base.kind {
        StructureKind::Dictionary(fields) => fields.get(name).cloned().unwrap_or(predicted_field),
        _ => predicted_field,
    };
    Ok((structure, reqs))
}

/// `node.attr`: the base must be a dictionary with that field.
pub fn visit_getattr(expr: &Expr, node: &Ref<Expr>, attr: &str, ctx: &Context) -> VisitResult {
    visit_field(expr, node, attr, ctx)
}

// Visit `node` as a container of the given kind indexed at `index`.
fn visit_container(
    expr: &Expr,
    node: &Ref<Expr>,
    container: ContainerKind,
    index: Option<i64>,
    ctx: &Context,
) -> VisitResult {
    let line = expr.line();
    let predicted = ctx.predicted_struct.clone().with_line(line);

    let base_predicted = match (container, index) {
        (ContainerKind::List, _) => Structure::list(predicted.clone()),
        (ContainerKind::Tuple, Some(idx))
            if idx >= 0 && idx <= i64::from(ctx.config.max_tuple_index) =>
        {
            let mut items = vec![Structure::unknown().with_line(line); idx as usize];
            items.push(predicted.clone());
            Structure::tuple(items)
        }
        // Tuples indexed from the end or past `max_tuple_index` have an
        // unknown arity, as do tuples indexed by a variable.
        (ContainerKind::Tuple, _) => Structure::unknown(),
        (ContainerKind::Dictionary, Some(idx)) => field(&idx.to_string(), predicted.clone()),
        (ContainerKind::Dictionary, None) => Structure::dictionary(BTreeMap::new()),
    };

    let (base, reqs) = visit_expr(node, &ctx.descend(base_predicted.with_line(line)))?;

    let structure = match (&base.kind, index) {
        (StructureKind::List(element), _) => element.as_ref().clone(),
        (StructureKind::Tuple(items), Some(idx)) if idx >= 0 && (idx as usize) < items.len() => {
            items[idx as usize].clone()
        }
        (StructureKind::Dictionary(fields), Some(idx)) => fields
            .get(&idx.to_string())
            .cloned()
            .unwrap_or(predicted),
        _ => predicted,
    };
    Ok((structure, reqs))
}

/// `node[index]`. String literals behave like attribute access, integer
/// literals and other expressions follow the configured container kinds.
pub fn visit_getitem(expr: &Expr, node: &Ref<Expr>, index: &Ref<Expr>, ctx: &Context) -> VisitResult {
    match index.as_const() {
        Some(Value::String(name)) => visit_field(expr, node, name, ctx),
        Some(Value::Int(idx)) => visit_container(
            expr,
            node,
            ctx.config.indexed_with_integer,
            Some(*idx),
            ctx,
        ),
        _ => {
            let (_, mut reqs) = visit_expr(index, &ctx.descend(Structure::scalar()))?;
            let (structure, base_reqs) =
                visit_container(expr, node, ctx.config.indexed_with_variable, None, ctx)?;
            reqs.merge_in(base_reqs)?;
            Ok((structure, reqs))
        }
    }
}
