// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use serde_json::json;
use template_schema::*;

#[test]
fn infer_single_template() -> Result<()> {
    let mut engine = Engine::new();
    engine.add_template(
        "index.j2".to_string(),
        "Hello {{ user.name|title }}! You have {{ inbox|length }} messages.".to_string(),
    )?;

    let reqs = engine.infer()?;
    assert_eq!(reqs.to_string(), "{inbox: [<unknown>], user: {name: <string>}}");
    assert_eq!(
        reqs.get("user").and_then(|s| s.label.as_deref()),
        Some("user")
    );
    Ok(())
}

#[test]
fn templates_share_one_context() -> Result<()> {
    let mut engine = Engine::new();
    engine.add_template("a.j2".to_string(), "{{ items|first }}".to_string())?;
    engine.add_template("b.j2".to_string(), "{{ items|sum }}".to_string())?;
    engine.add_template("c.j2".to_string(), "{{ limit|abs }}".to_string())?;

    let reqs = engine.infer()?;
    assert_eq!(reqs.to_string(), "{items: [<scalar>], limit: <number>}");

    engine.add_template("d.j2".to_string(), "{{ limit|upper }}".to_string())?;
    let err = engine.infer().unwrap_err();
    let Some(err) = err.downcast_ref::<InferenceError>() else {
        bail!("expected an inference error, got {err}");
    };
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.to_string(),
        "variable \"limit\" (lines: 1, structure <number>) conflicts with variable \"limit\" (lines: 1, structure <string>)"
    );

    engine.clear_templates();
    assert!(engine.infer()?.is_empty());
    Ok(())
}

#[test]
fn template_from_file() -> Result<()> {
    let mut engine = Engine::new();
    engine.add_template_from_file("tests/engine/greeting.j2")?;

    let reqs = engine.infer()?;
    assert_eq!(reqs.names().collect::<Vec<_>>(), vec!["title", "users"]);

    let title = reqs.get("title").map(|s| s.to_string());
    assert_eq!(title.as_deref(), Some("<string>"));
    let Some(title) = reqs.get("title") else {
        bail!("title is required");
    };
    assert!(title.used_with_default);
    assert_eq!(title.default_value, Some(Value::from("Welcome")));
    assert_eq!(title.linenos.iter().copied().collect::<Vec<_>>(), vec![1]);

    let Some(users) = reqs.get("users") else {
        bail!("users is required");
    };
    assert_eq!(users.to_string(), "[{name: <unknown>}]");
    assert_eq!(users.linenos.iter().copied().collect::<Vec<_>>(), vec![3, 5]);
    Ok(())
}

#[test]
fn infer_template_str_ignores_added_templates() -> Result<()> {
    let mut engine = Engine::new();
    engine.add_template("a.j2".to_string(), "{{ x|upper }}".to_string())?;

    let reqs = engine.infer_template_str("b.j2", "{{ x|abs }}")?;
    assert_eq!(reqs.to_string(), "{x: <number>}");
    Ok(())
}

#[test]
fn unknown_filters_follow_config() -> Result<()> {
    let template = "{{ price|currency|upper }}";

    let engine = Engine::new();
    let err = engine.infer_template_str("t.j2", template).unwrap_err();
    let Some(err) = err.downcast_ref::<InferenceError>() else {
        bail!("expected an inference error, got {err}");
    };
    assert_eq!(err.kind(), ErrorKind::UnknownFilter);
    assert_eq!(err.line(), Some(1));
    assert_eq!(err.to_string(), "line 1: unknown filter \"currency\"");

    let config = Config::from_json_str(r#"{"ignore_unknown_filters": ["currency"]}"#)?;
    let engine = Engine::with_config(config);
    let reqs = engine.infer_template_str("t.j2", template)?;
    assert_eq!(reqs.to_string(), "{price: <unknown>}");

    let mut engine = Engine::new();
    engine.set_config(Config {
        ignore_unknown_filters: IgnoreUnknownFilters::All(true),
        ..Config::default()
    });
    assert!(engine.config().ignore_unknown_filters.tolerates("anything"));
    assert!(engine.infer_template_str("t.j2", template).is_ok());
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    assert!(Config::from_json_str(r#"{"max_depht": 3}"#).is_err());
    assert!(Config::from_json_str(r#"{"indexed_with_integer": "set"}"#).is_err());
}

#[test]
fn json_schema_output() -> Result<()> {
    let mut engine = Engine::new();
    engine.add_template(
        "t.j2".to_string(),
        "{{ tags|join(sep|d(', ')) }} {{ author.age|abs }}".to_string(),
    )?;

    let schema = engine.infer_json_schema()?;
    assert_eq!(
        schema,
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "author": {
                    "type": "object",
                    "properties": {
                        "age": {"type": "number", "title": "age"},
                    },
                    "required": ["age"],
                    "title": "author",
                },
                "sep": {"type": "string", "title": "sep", "default": ", "},
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "title": "tags",
                },
            },
            "required": ["author", "tags"],
        })
    );
    Ok(())
}

#[test]
fn parse_errors_surface() {
    let mut engine = Engine::new();
    let err = engine
        .add_template("t.j2".to_string(), "{% if x %}{{ x }}{% endif %}".to_string())
        .unwrap_err();
    assert!(err.to_string().contains("statement blocks are not supported"));

    let err = engine
        .add_template("t.j2".to_string(), "{{ x|upper ".to_string())
        .unwrap_err();
    assert!(err.to_string().contains("t.j2:1:"));
}

#[test]
fn filter_chains_count_toward_max_depth() -> Result<()> {
    let template = format!("{{{{ x{} }}}}", "|upper".repeat(130));

    let engine = Engine::new();
    let err = engine.infer_template_str("t.j2", &template).unwrap_err();
    let Some(err) = err.downcast_ref::<InferenceError>() else {
        bail!("expected an inference error, got {err}");
    };
    assert_eq!(err.kind(), ErrorKind::DepthLimitExceeded);
    assert_eq!(
        err.to_string(),
        "line 1: expression nesting exceeds the limit of 128"
    );

    let engine = Engine::with_config(Config {
        max_depth: 256,
        ..Config::default()
    });
    let reqs = engine.infer_template_str("t.j2", &template)?;
    assert_eq!(reqs.to_string(), "{x: <string>}");
    Ok(())
}

#[test]
fn huge_tuple_index_is_tolerated() -> Result<()> {
    let config = Config::from_json_str(r#"{"indexed_with_integer": "tuple"}"#)?;
    let engine = Engine::with_config(config);
    let reqs = engine.infer_template_str("t.j2", "{{ x[4000000000000000000] }}")?;
    assert_eq!(reqs.to_string(), "{x: <unknown>}");
    Ok(())
}
