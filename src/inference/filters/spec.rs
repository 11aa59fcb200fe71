// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::fmt;

use crate::inference::model::Structure;

use super::catalog::{FilterConfig, OutputConfig, ParamConfig, RoleConfig};

/// Structure template used by the filter table.
///
/// `expected` stands for the structure the filter's result is expected to
/// have at the point of use; `element(T)` is the element of a list `T`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructureTemplate {
    Unknown,
    Scalar,
    String,
    Number,
    Boolean,
    Dict,
    List(Box<StructureTemplate>),
    Tuple(Vec<StructureTemplate>),
    Element(Box<StructureTemplate>),
    Expected,
}

impl StructureTemplate {
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut parser = TemplateParser {
            text,
            pos: 0,
        };
        let template = parser.parse()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(format!("trailing input at offset {} in `{text}`", parser.pos));
        }
        Ok(template)
    }

    /// Whether the template depends on the expected result.
    pub fn is_contextual(&self) -> bool {
        match self {
            StructureTemplate::Expected | StructureTemplate::Element(_) => true,
            StructureTemplate::List(inner) => inner.is_contextual(),
            StructureTemplate::Tuple(items) => items.iter().any(Self::is_contextual),
            _ => false,
        }
    }

    /// Build the structure described by the template. Every node created
    /// is attributed to `line`.
    pub fn instantiate(&self, expected: &Structure, line: u32) -> Structure {
        let s = match self {
            StructureTemplate::Unknown => Structure::unknown(),
            StructureTemplate::Scalar => Structure::scalar(),
            StructureTemplate::String => Structure::string(),
            StructureTemplate::Number => Structure::number(),
            StructureTemplate::Boolean => Structure::boolean(),
            StructureTemplate::Dict => Structure::dictionary(BTreeMap::new()),
            StructureTemplate::List(inner) => Structure::list(inner.instantiate(expected, line)),
            StructureTemplate::Tuple(items) => Structure::tuple(
                items
                    .iter()
                    .map(|item| item.instantiate(expected, line))
                    .collect(),
            ),
            StructureTemplate::Element(inner) => inner.instantiate(expected, line).element(),
            StructureTemplate::Expected => expected.clone(),
        };
        s.with_line(line)
    }
}

impl fmt::Display for StructureTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureTemplate::Unknown => f.write_str("unknown"),
            StructureTemplate::Scalar => f.write_str("scalar"),
            StructureTemplate::String => f.write_str("string"),
            StructureTemplate::Number => f.write_str("number"),
            StructureTemplate::Boolean => f.write_str("boolean"),
            StructureTemplate::Dict => f.write_str("dict"),
            StructureTemplate::List(inner) => write!(f, "list({inner})"),
            StructureTemplate::Tuple(items) => {
                f.write_str("tuple(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            StructureTemplate::Element(inner) => write!(f, "element({inner})"),
            StructureTemplate::Expected => f.write_str("expected"),
        }
    }
}

struct TemplateParser<'a> {
    text: &'a str,
    pos: usize,
}

impl TemplateParser<'_> {
    fn skip_ws(&mut self) {
        while self.text[self.pos..].starts_with(' ') {
            self.pos += 1;
        }
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.text[self.pos..].starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> &str {
        self.skip_ws();
        let start = self.pos;
        let rest = &self.text[start..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &self.text[start..start + len]
    }

    fn inner(&mut self) -> Result<StructureTemplate, String> {
        if !self.eat('(') {
            return Err(format!("expecting `(` at offset {} in `{}`", self.pos, self.text));
        }
        let inner = self.parse()?;
        if !self.eat(')') {
            return Err(format!("expecting `)` at offset {} in `{}`", self.pos, self.text));
        }
        Ok(inner)
    }

    fn parse(&mut self) -> Result<StructureTemplate, String> {
        let word = self.word().to_string();
        Ok(match word.as_str() {
            "unknown" => StructureTemplate::Unknown,
            "scalar" => StructureTemplate::Scalar,
            "string" => StructureTemplate::String,
            "number" => StructureTemplate::Number,
            "boolean" => StructureTemplate::Boolean,
            "dict" => StructureTemplate::Dict,
            "expected" => StructureTemplate::Expected,
            "list" => StructureTemplate::List(Box::new(self.inner()?)),
            "element" => StructureTemplate::Element(Box::new(self.inner()?)),
            "tuple" => {
                if !self.eat('(') {
                    return Err(format!("expecting `(` after tuple in `{}`", self.text));
                }
                let mut items = vec![self.parse()?];
                while self.eat(',') {
                    items.push(self.parse()?);
                }
                if !self.eat(')') {
                    return Err(format!("expecting `)` to close tuple in `{}`", self.text));
                }
                StructureTemplate::Tuple(items)
            }
            "" => return Err(format!("expecting structure at offset {} in `{}`", self.pos, self.text)),
            other => return Err(format!("unknown structure `{other}` in `{}`", self.text)),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamRole {
    /// Fallback used by `default`: the argument's structure becomes part of
    /// what is demanded from the filtered value.
    DefaultValue,
    /// A string literal naming a field of every element of the input list.
    Attribute,
}

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub optional: bool,
    /// Can only be passed as `name=value`.
    pub keyword_only: bool,
    pub expects: StructureTemplate,
    pub role: Option<ParamRole>,
}

/// How the result of a filter is derived from the structure of its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputRule {
    /// The expected result, describing the filtered expression.
    Returns,
    /// The context's return class, narrowed by the expected result.
    ReturnClass,
    /// The input itself.
    Input,
    /// An element of the input sequence.
    Element,
    /// A list holding the input.
    Wrap,
    /// A list of lists of the input's elements.
    Batch,
}

#[derive(Clone, Debug)]
pub struct FilterSpec {
    name: String,
    unsupported: bool,
    params: Vec<ParamSpec>,
    variadic: bool,
    returns: StructureTemplate,
    input: StructureTemplate,
    output: OutputRule,
}

impl FilterSpec {
    pub(super) fn from_config(cfg: &FilterConfig) -> Result<Self, FilterTableError> {
        let invalid = |detail: String| FilterTableError::InvalidTemplate {
            filter: cfg.name.clone(),
            detail,
        };

        let returns = StructureTemplate::parse(&cfg.returns).map_err(invalid)?;
        if returns.is_contextual() {
            return Err(FilterTableError::InvalidTemplate {
                filter: cfg.name.clone(),
                detail: format!("result `{returns}` must not depend on the expected result"),
            });
        }
        let input = StructureTemplate::parse(&cfg.input).map_err(invalid)?;

        let mut params: Vec<ParamSpec> = Vec::with_capacity(cfg.params.len());
        for p in cfg.params.iter() {
            params.push(ParamSpec::from_config(&cfg.name, p)?);
        }

        let spec = FilterSpec {
            name: cfg.name.clone(),
            unsupported: cfg.unsupported,
            params,
            variadic: cfg.variadic,
            returns,
            input,
            output: match cfg.output {
                OutputConfig::Returns => OutputRule::Returns,
                OutputConfig::ReturnClass => OutputRule::ReturnClass,
                OutputConfig::Input => OutputRule::Input,
                OutputConfig::Element => OutputRule::Element,
                OutputConfig::Wrap => OutputRule::Wrap,
                OutputConfig::Batch => OutputRule::Batch,
            },
        };
        spec.validate_params()?;
        Ok(spec)
    }

    fn validate_params(&self) -> Result<(), FilterTableError> {
        let mut seen_optional = false;
        for (idx, p) in self.params.iter().enumerate() {
            if self.params[..idx].iter().any(|q| q.name == p.name) {
                return Err(FilterTableError::DuplicateParameter {
                    filter: self.name.clone(),
                    param: p.name.clone(),
                });
            }
            if p.optional || p.keyword_only {
                seen_optional = true;
            } else if seen_optional {
                return Err(FilterTableError::RequiredAfterOptional {
                    filter: self.name.clone(),
                    param: p.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Opaque stand-in for a tolerated filter missing from the table.
    pub fn opaque(name: &str) -> Self {
        FilterSpec {
            name: name.to_string(),
            unsupported: false,
            params: Vec::new(),
            variadic: true,
            returns: StructureTemplate::Unknown,
            input: StructureTemplate::Unknown,
            output: OutputRule::Input,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn returns(&self) -> &StructureTemplate {
        &self.returns
    }

    pub fn input(&self) -> &StructureTemplate {
        &self.input
    }

    pub fn output(&self) -> OutputRule {
        self.output
    }
}

impl ParamSpec {
    fn from_config(filter: &str, cfg: &ParamConfig) -> Result<Self, FilterTableError> {
        let expects =
            StructureTemplate::parse(&cfg.expects).map_err(|detail| {
                FilterTableError::InvalidTemplate {
                    filter: filter.to_string(),
                    detail: format!("parameter `{}`: {detail}", cfg.name),
                }
            })?;
        Ok(ParamSpec {
            name: cfg.name.clone(),
            optional: cfg.optional,
            keyword_only: cfg.keyword_only,
            expects,
            role: cfg.role.map(|r| match r {
                RoleConfig::DefaultValue => ParamRole::DefaultValue,
                RoleConfig::Attribute => ParamRole::Attribute,
            }),
        })
    }
}

#[derive(Debug)]
pub enum FilterTableError {
    Parse(serde_json::Error),
    DuplicateFilter(String),
    DuplicateParameter { filter: String, param: String },
    RequiredAfterOptional { filter: String, param: String },
    InvalidTemplate { filter: String, detail: String },
}

impl fmt::Display for FilterTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTableError::Parse(err) => write!(f, "failed to parse filter table: {err}"),
            FilterTableError::DuplicateFilter(name) => {
                write!(f, "duplicate filter entry `{name}` in table")
            }
            FilterTableError::DuplicateParameter { filter, param } => {
                write!(f, "filter `{filter}` declares parameter `{param}` twice")
            }
            FilterTableError::RequiredAfterOptional { filter, param } => write!(
                f,
                "filter `{filter}` declares required parameter `{param}` after an optional one"
            ),
            FilterTableError::InvalidTemplate { filter, detail } => {
                write!(f, "filter `{filter}` has invalid template: {detail}")
            }
        }
    }
}

impl From<serde_json::Error> for FilterTableError {
    fn from(err: serde_json::Error) -> Self {
        FilterTableError::Parse(err)
    }
}

impl std::error::Error for FilterTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterTableError::Parse(err) => Some(err),
            _ => None,
        }
    }
}
