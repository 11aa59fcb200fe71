// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::Template;
use crate::inference::context::{Config, Context};
use crate::inference::error::InferenceError;
use crate::inference::model::{Structure, StructureClass};
use crate::inference::requirements::Requirements;

use super::dispatch::visit_expr;

/// Requirements of a whole template.
///
/// Every `{{ ... }}` block is printed, so each is expected to produce a
/// scalar. Requirements of all blocks are merged; the first failure aborts.
pub fn infer_template(template: &Template, config: &Config) -> Result<Requirements, InferenceError> {
    let mut reqs = Requirements::new();
    for output in template.outputs.iter() {
        let ctx = Context::new(config)
            .with_predicted(Structure::scalar().with_line(output.line()))
            .with_return_class(StructureClass::Scalar);
        let (_, output_reqs) = visit_expr(output, &ctx)?;
        reqs.merge_in(output_reqs)?;
    }
    debug!(
        file = template.source.file().as_str(),
        variables = reqs.len(),
        "inferred template requirements"
    );
    Ok(reqs)
}
