// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{Expr, Ref};
use crate::inference::context::Context;
use crate::inference::error::InferenceError;
use crate::inference::filters::{self, FilterSpec, OutputRule, ParamRole, ParamSpec};
use crate::inference::model::{merge, Structure, StructureKind};
use crate::inference::requirements::Requirements;
use crate::lexer::Span;
use crate::value::Value;

use super::dispatch::visit_expr;
use super::VisitResult;

type BoundArgument<'a> = (Option<&'a ParamSpec>, &'a Ref<Expr>);

// Match call-site arguments against the filter's parameters. Arguments the
// filter accepts without declaring them are paired with `None`.
fn bind_arguments<'a>(
    spec: &'a FilterSpec,
    name: &str,
    line: u32,
    args: &'a [Ref<Expr>],
    kwargs: &'a [(Span, Ref<Expr>)],
) -> Result<Vec<BoundArgument<'a>>, InferenceError> {
    let invalid = |detail: String| InferenceError::InvalidArguments {
        line,
        name: name.to_string(),
        detail,
    };

    let positional: Vec<&ParamSpec> = spec.params().iter().filter(|p| !p.keyword_only).collect();
    let mut bound = Vec::with_capacity(args.len() + kwargs.len());
    let mut seen = BTreeSet::new();

    for (idx, arg) in args.iter().enumerate() {
        match positional.get(idx) {
            Some(param) => {
                seen.insert(param.name.as_str());
                bound.push((Some(*param), arg));
            }
            None if spec.is_variadic() => bound.push((None, arg)),
            None => {
                return Err(invalid(format!(
                    "expected at most {} positional arguments, got {}",
                    positional.len(),
                    args.len()
                )))
            }
        }
    }

    for (keyword, arg) in kwargs {
        let keyword = keyword.text();
        match spec.param(keyword) {
            Some(param) => {
                if !seen.insert(param.name.as_str()) {
                    return Err(invalid(format!(
                        "got multiple values for argument \"{keyword}\""
                    )));
                }
                bound.push((Some(param), arg));
            }
            None if spec.is_variadic() => bound.push((None, arg)),
            None => {
                return Err(invalid(format!(
                    "unexpected keyword argument \"{keyword}\""
                )))
            }
        }
    }

    if let Some(missing) = spec
        .params()
        .iter()
        .find(|p| !p.optional && !seen.contains(p.name.as_str()))
    {
        return Err(invalid(format!(
            "missing required argument \"{}\"",
            missing.name
        )));
    }

    Ok(bound)
}

// Elements of the demanded list must be dictionaries reachable through the
// dotted attribute path, ending in what was demanded of the element itself.
fn with_attribute(demand: Structure, path: &str, line: u32) -> Structure {
    let StructureKind::List(element) = &demand.kind else {
        return demand;
    };

    let mut field = element.as_ref().clone();
    for segment in path.rsplit('.') {
        let mut fields = BTreeMap::new();
        fields.insert(segment.to_string(), field.with_label(segment).with_line(line));
        field = Structure::dictionary(fields).with_line(line);
    }

    let mut result = demand.clone();
    result.kind = StructureKind::List(Box::new(field));
    result
}

fn output_structure(
    rule: OutputRule,
    sub: &Structure,
    expected: &Structure,
    ctx: &Context,
    line: u32,
) -> Structure {
    let structure = match rule {
        OutputRule::Returns => sub.retag(expected.kind.clone()),
        OutputRule::ReturnClass => {
            let class = Structure::new(ctx.return_struct_cls.into_kind());
            let kind = match merge(&class, expected) {
                Ok(narrowed) => narrowed.kind,
                Err(_) => expected.kind.clone(),
            };
            sub.retag(kind)
        }
        OutputRule::Input => sub.clone(),
        OutputRule::Element => {
            let element = sub.element();
            if element.is_unknown() {
                sub.retag(expected.kind.clone())
            } else {
                sub.retag(element.kind)
            }
        }
        OutputRule::Wrap => sub.retag(StructureKind::List(Box::new(
            sub.clone().without_label(),
        ))),
        OutputRule::Batch => {
            Structure::list(Structure::list(sub.element().with_line(line)).with_line(line))
        }
    };
    structure.with_line(line)
}

/// Infer the structure of a filter application `node|name(args)`.
///
/// The filter's contract decides what is demanded from the filtered
/// expression given what the caller expects of the result. The filtered
/// expression is then visited under that demand, and the result is derived
/// from what it turned out to be. Requirements from arguments and from the
/// filtered expression are merged.
pub fn visit_filter(expr: &Ref<Expr>, ctx: &Context) -> VisitResult {
    let Expr::Filter {
        node,
        name,
        args,
        kwargs,
        ..
    } = expr.as_ref()
    else {
        return visit_expr(expr, ctx);
    };

    let line = expr.line();
    let filter_name = name.text();

    let opaque;
    let spec = match filters::lookup(filter_name) {
        Some(spec) if spec.is_unsupported() => {
            return Err(InferenceError::UnsupportedFilter {
                line,
                name: filter_name.to_string(),
            })
        }
        Some(spec) => spec,
        None if ctx.config.ignore_unknown_filters.tolerates(filter_name) => {
            opaque = FilterSpec::opaque(filter_name);
            &opaque
        }
        None => {
            return Err(InferenceError::UnknownFilter {
                line,
                name: filter_name.to_string(),
            })
        }
    };

    let nominal = spec.returns().instantiate(&Structure::unknown(), line);
    let expected = merge(&nominal, &ctx.predicted_struct).map_err(|_| {
        InferenceError::conflict(line, expr.kind_name(), &nominal, &ctx.predicted_struct)
    })?;

    debug!(
        filter = filter_name,
        line,
        expected = %expected,
        "resolved filter"
    );

    let bound = bind_arguments(spec, filter_name, line, args, kwargs)?;

    let mut demand = spec.input().instantiate(&expected, line);
    if spec
        .params()
        .iter()
        .any(|p| p.role == Some(ParamRole::DefaultValue))
    {
        demand.used_with_default = true;
    }

    let mut reqs = Requirements::new();
    for (param, arg) in bound {
        let predicted = match param {
            Some(param) => param.expects.instantiate(&expected, line),
            None => Structure::unknown().with_line(line),
        };
        let (arg_structure, arg_reqs) = visit_expr(arg, &ctx.descend(predicted))?;
        reqs.merge_in(arg_reqs)?;

        match param.and_then(|p| p.role) {
            Some(ParamRole::DefaultValue) => {
                let fallback = arg_structure
                    .retag(arg_structure.kind.clone())
                    .without_label();
                demand = merge(&demand, &fallback)?;
                if let Some(value) = arg.as_const() {
                    demand.default_value = Some(value.clone());
                }
            }
            Some(ParamRole::Attribute) => {
                if let Some(Value::String(path)) = arg.as_const() {
                    demand = with_attribute(demand, path, line);
                }
            }
            None => {}
        }
    }

    let (sub, sub_reqs) = visit_expr(node, &ctx.descend(demand))?;
    reqs.merge_in(sub_reqs)?;

    let output = output_structure(spec.output(), &sub, &expected, ctx, line);
    trace!(filter = filter_name, output = %output, "filter visited");
    Ok((output, reqs))
}
