// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::inference::{
    infer_template, visit_filter, Config, Context, ErrorKind, InferenceError, Requirements,
    Structure, StructureClass,
};
use crate::lexer::Source;
use crate::parser::Parser;
use crate::value::Value;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use test_generator::test_resources;

#[derive(Debug, Deserialize)]
struct FilterYamlTest {
    cases: Vec<FilterCase>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum Expectation {
    Scalar,
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterCase {
    note: String,
    template: String,
    /// Visit the single expression of the template under this expectation.
    /// Without it the whole template is inferred.
    #[serde(default)]
    context: Option<Expectation>,
    #[serde(default)]
    config: Option<Config>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    result_label: Option<String>,
    #[serde(default)]
    requirements: Option<BTreeMap<String, String>>,
    #[serde(default)]
    used_with_default: Vec<String>,
    #[serde(default)]
    defaults: BTreeMap<String, Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_kind: Option<String>,
}

fn error_kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Conflict => "conflict",
        ErrorKind::UnknownFilter => "unknown_filter",
        ErrorKind::UnsupportedFilter => "unsupported_filter",
        ErrorKind::InvalidArguments => "invalid_arguments",
        ErrorKind::DepthLimitExceeded => "depth_limit_exceeded",
    }
}

fn infer(case: &FilterCase, config: &Config) -> Result<(Option<Structure>, Requirements)> {
    let source = Source::from_contents("case.j2".to_string(), case.template.clone())?;
    let mut parser = Parser::new(&source)?;
    match case.context {
        Some(expectation) => {
            let expr = parser.parse_output_expr()?;
            let predicted = match expectation {
                Expectation::Scalar => Structure::scalar().with_line(expr.line()),
                Expectation::Unknown => Structure::unknown().with_line(expr.line()),
            };
            let ctx = Context::new(config)
                .with_predicted(predicted)
                .with_return_class(StructureClass::Scalar);
            let (result, reqs) = visit_filter(&expr, &ctx)?;
            Ok((Some(result), reqs))
        }
        None => {
            let template = parser.parse()?;
            Ok((None, infer_template(&template, config)?))
        }
    }
}

fn check_success(case: &FilterCase, result: Option<Structure>, reqs: &Requirements) -> Result<()> {
    if let Some(expected) = &case.result {
        let Some(result) = &result else {
            bail!("`result` needs a `context`");
        };
        assert_eq!(&result.to_string(), expected, "result structure");
        assert!(!result.linenos.is_empty(), "result has no line numbers");
    }

    if let Some(label) = &case.result_label {
        assert_eq!(
            result.as_ref().and_then(|r| r.label.as_deref()),
            Some(label.as_str()),
            "result label"
        );
    }

    if let Some(expected) = &case.requirements {
        let actual: BTreeMap<String, String> = reqs
            .iter()
            .map(|(name, s)| (name.clone(), s.to_string()))
            .collect();
        assert_eq!(&actual, expected, "requirements");
    }

    for (name, structure) in reqs.iter() {
        assert_eq!(structure.label.as_deref(), Some(name.as_str()), "label of {name}");
        assert!(!structure.linenos.is_empty(), "{name} has no line numbers");
        assert_eq!(
            structure.used_with_default,
            case.used_with_default.contains(name),
            "used_with_default of {name}"
        );
        assert_eq!(
            structure.default_value.as_ref(),
            case.defaults.get(name),
            "default value of {name}"
        );
    }

    Ok(())
}

fn run_case(case: &FilterCase) -> Result<()> {
    let config = case.config.clone().unwrap_or_default();
    let outcome = infer(case, &config);

    match (&case.error, outcome) {
        (None, Ok((result, reqs))) => check_success(case, result, &reqs),
        (None, Err(e)) => Err(e),
        (Some(expected), Ok((_, reqs))) => {
            bail!("expected error `{expected}`, inference succeeded with {reqs}")
        }
        (Some(expected), Err(e)) => {
            let Some(err) = e.downcast_ref::<InferenceError>() else {
                bail!("expected inference error, got: {e}");
            };
            assert_eq!(&err.to_string(), expected, "error message");
            if let Some(kind) = &case.error_kind {
                assert_eq!(error_kind_name(err.kind()), kind.as_str(), "error kind");
            }
            Ok(())
        }
    }
}

fn yaml_test_impl(path: &str) -> Result<()> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read yaml test file {path}"))?;
    let test: FilterYamlTest = serde_yaml::from_str(&yaml)
        .with_context(|| format!("failed to parse yaml test file {path}"))?;

    for case in test.cases.iter() {
        run_case(case).with_context(|| format!("case `{}`", case.note))?;
    }

    Ok(())
}

#[test_resources("tests/filters/**/*.yaml")]
fn run(path: &str) {
    yaml_test_impl(path).unwrap();
}
