// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use template_schema::unstable::*;
use template_schema::Value;

fn parse(contents: &str) -> Result<Template> {
    let source = Source::from_contents("parser.j2".to_string(), contents.to_string())?;
    let mut parser = Parser::new(&source)?;
    parser.parse()
}

#[test]
fn blocks_in_document_order() -> Result<()> {
    let template = parse("a {{ x }} b {{- y -}}\n c {{+ z }}")?;
    let names: Vec<String> = template
        .outputs
        .iter()
        .map(|e| match e.as_ref() {
            Expr::Name { name, .. } => name.to_string(),
            other => other.kind_name().to_string(),
        })
        .collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    Ok(())
}

#[test]
fn keyword_arguments_keep_their_names() -> Result<()> {
    let template = parse("{{ users|map(attribute='name', default=none)|join(', ') }}")?;
    let Expr::Filter { node, name, args, .. } = template.outputs[0].as_ref() else {
        bail!("expected a filter");
    };
    assert_eq!(name.text(), "join");
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].as_const(), Some(&Value::from(", ")));

    let Expr::Filter { name, args, kwargs, .. } = node.as_ref() else {
        bail!("expected a filter");
    };
    assert_eq!(name.text(), "map");
    assert!(args.is_empty());
    let keywords: Vec<&str> = kwargs.iter().map(|(k, _)| k.text()).collect();
    assert_eq!(keywords, vec!["attribute", "default"]);
    assert_eq!(kwargs[1].1.as_const(), Some(&Value::Null));
    Ok(())
}

#[test]
fn subscripts_and_attributes() -> Result<()> {
    let template = parse("{{ rows[0]['name'].first }}")?;
    let Expr::Getattr { node, attr, .. } = template.outputs[0].as_ref() else {
        bail!("expected an attribute access");
    };
    assert_eq!(attr.1.as_ref(), "first");
    let Expr::Getitem { node, index, .. } = node.as_ref() else {
        bail!("expected a subscript");
    };
    assert_eq!(index.as_const(), Some(&Value::from("name")));
    let Expr::Getitem { index, .. } = node.as_ref() else {
        bail!("expected a subscript");
    };
    assert_eq!(index.as_const(), Some(&Value::from(0i64)));
    Ok(())
}

#[test]
fn lines_are_one_based() -> Result<()> {
    let template = parse("first line\n\n{{ a\n  |upper }}")?;
    let expr = &template.outputs[0];
    assert_eq!(expr.kind_name(), "Filter");
    assert_eq!(expr.line(), 4);
    let Expr::Filter { node, .. } = expr.as_ref() else {
        bail!("expected a filter");
    };
    assert_eq!(node.line(), 3);
    Ok(())
}

#[test]
fn malformed_templates() {
    for (contents, message) in [
        ("{{ }}", "expecting expression"),
        ("{{ x|upper(1, }}", "expecting expression"),
        ("{{ x + 1 }}", "invalid character"),
        ("{{ x|f(a=1, 2) }}", "positional argument follows keyword argument"),
        ("{% for x in xs %}", "statement blocks are not supported"),
        ("{{ x }} {{ y", "unexpected end of template"),
    ] {
        match parse(contents) {
            Ok(_) => panic!("`{contents}` parsed"),
            Err(e) => assert!(
                e.to_string().contains(message),
                "`{contents}`: {e} does not mention `{message}`"
            ),
        }
    }
}

#[test]
fn deeply_nested_expressions_are_rejected() -> Result<()> {
    let nested = |depth: usize| format!("{{{{ {}x{} }}}}", "(".repeat(depth), ")".repeat(depth));

    let template = parse(&nested(100))?;
    assert_eq!(template.outputs[0].kind_name(), "Name");

    for depth in [MAX_NESTING as usize, 200_000] {
        let Err(e) = parse(&nested(depth)) else {
            bail!("{depth} nested parentheses parsed");
        };
        assert!(e
            .to_string()
            .contains("expression nesting exceeds the limit of 128"));
    }

    let lists = format!("{{{{ {}1{} }}}}", "[".repeat(200_000), "]".repeat(200_000));
    assert!(parse(&lists).is_err());
    let args = format!("{{{{ x{} }}}}", "|f(y".repeat(200_000) + &")".repeat(200_000));
    assert!(parse(&args).is_err());
    Ok(())
}
