// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::value::Value;

/// Shape of a value as observed from the way a template consumes it.
///
/// The flat kinds form a small lattice: `Unknown` is refined by `Scalar`,
/// which in turn is refined by `String`, `Number` and `Boolean`. The
/// container kinds are unrelated to each other and to `Scalar`.
#[derive(Clone, Debug, PartialEq)]
pub enum StructureKind {
    Unknown,
    Scalar,
    String,
    Number,
    Boolean,
    List(Box<Structure>),
    Tuple(Vec<Structure>),
    Dictionary(BTreeMap<String, Structure>),
}

/// Flat structure classes. Used where a filter's result is known to be
/// scalar-like but its exact subtype is left to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StructureClass {
    Unknown,
    #[default]
    Scalar,
    String,
    Number,
    Boolean,
}

impl StructureClass {
    pub fn into_kind(self) -> StructureKind {
        match self {
            StructureClass::Unknown => StructureKind::Unknown,
            StructureClass::Scalar => StructureKind::Scalar,
            StructureClass::String => StructureKind::String,
            StructureClass::Number => StructureKind::Number,
            StructureClass::Boolean => StructureKind::Boolean,
        }
    }
}

impl fmt::Display for StructureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Structure::new(self.into_kind()), f)
    }
}

/// An inferred structure together with the bookkeeping gathered while
/// inferring it.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    pub kind: StructureKind,
    /// Name hint, usually the variable or attribute the structure describes.
    pub label: Option<String>,
    /// Source lines that contributed to this structure.
    pub linenos: BTreeSet<u32>,
    pub used_with_default: bool,
    pub default_value: Option<Value>,
    /// Literal value when the structure was derived from a constant.
    pub value: Option<Value>,
    pub constant: bool,
}

impl Default for Structure {
    fn default() -> Self {
        Structure::unknown()
    }
}

impl Structure {
    pub fn new(kind: StructureKind) -> Self {
        Structure {
            kind,
            label: None,
            linenos: BTreeSet::new(),
            used_with_default: false,
            default_value: None,
            value: None,
            constant: false,
        }
    }

    pub fn unknown() -> Self {
        Structure::new(StructureKind::Unknown)
    }

    pub fn scalar() -> Self {
        Structure::new(StructureKind::Scalar)
    }

    pub fn string() -> Self {
        Structure::new(StructureKind::String)
    }

    pub fn number() -> Self {
        Structure::new(StructureKind::Number)
    }

    pub fn boolean() -> Self {
        Structure::new(StructureKind::Boolean)
    }

    pub fn list(element: Structure) -> Self {
        Structure::new(StructureKind::List(Box::new(element)))
    }

    pub fn tuple(items: Vec<Structure>) -> Self {
        Structure::new(StructureKind::Tuple(items))
    }

    pub fn dictionary(fields: BTreeMap<String, Structure>) -> Self {
        Structure::new(StructureKind::Dictionary(fields))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn without_label(mut self) -> Self {
        self.label = None;
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.linenos.insert(line);
        self
    }

    pub fn with_lines<'a>(mut self, lines: impl IntoIterator<Item = &'a u32>) -> Self {
        self.linenos.extend(lines);
        self
    }

    /// Structure of a literal. `none` only tells us the value is scalar.
    pub fn from_value(value: &Value) -> Self {
        let kind = match value {
            Value::Null => StructureKind::Scalar,
            Value::Bool(_) => StructureKind::Boolean,
            Value::Int(_) | Value::Float(_) => StructureKind::Number,
            Value::String(_) => StructureKind::String,
            Value::Array(items) => {
                let mut element = Structure::unknown();
                for item in items.iter() {
                    // Heterogeneous literal lists stay opaque.
                    match merge(&element, &Structure::from_value(item)) {
                        Ok(merged) => element = merged,
                        Err(_) => {
                            element = Structure::unknown();
                            break;
                        }
                    }
                }
                StructureKind::List(Box::new(element))
            }
        };
        let mut s = Structure::new(kind);
        s.value = Some(value.clone());
        s.constant = true;
        s
    }

    /// A structure of a different kind describing the same expression:
    /// the label and line numbers carry over, literal metadata does not.
    pub fn retag(&self, kind: StructureKind) -> Structure {
        let mut s = Structure::new(kind);
        s.label = self.label.clone();
        s.linenos = self.linenos.clone();
        s
    }

    /// Element structure of a sequence. Anything else yields `Unknown`.
    pub fn element(&self) -> Structure {
        match &self.kind {
            StructureKind::List(element) => element.as_ref().clone(),
            StructureKind::Tuple(items) => {
                let mut element = Structure::unknown();
                for item in items {
                    match merge(&element, item) {
                        Ok(merged) => element = merged,
                        Err(_) => return Structure::unknown(),
                    }
                }
                element
            }
            _ => Structure::unknown(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, StructureKind::Unknown)
    }

    pub fn merge(&self, other: &Structure) -> Result<Structure, MergeError> {
        merge(self, other)
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StructureKind::Unknown => f.write_str("<unknown>"),
            StructureKind::Scalar => f.write_str("<scalar>"),
            StructureKind::String => f.write_str("<string>"),
            StructureKind::Number => f.write_str("<number>"),
            StructureKind::Boolean => f.write_str("<boolean>"),
            StructureKind::List(element) => write!(f, "[{element}]"),
            StructureKind::Tuple(items) => {
                f.write_str("(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            StructureKind::Dictionary(fields) => {
                f.write_str("{")?;
                for (idx, (name, field)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {field}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Two structures that cannot describe the same value.
///
/// Holds the innermost pair that failed to merge.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeError {
    pub left: Box<Structure>,
    pub right: Box<Structure>,
}

impl MergeError {
    fn new(left: &Structure, right: &Structure) -> Self {
        MergeError {
            left: Box::new(left.clone()),
            right: Box::new(right.clone()),
        }
    }
}

struct Described<'a>(&'a Structure);

impl fmt::Display for Described<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        match &s.label {
            Some(label) => write!(f, "variable \"{label}\"")?,
            None => f.write_str("expression")?,
        }
        f.write_str(" (lines: ")?;
        for (idx, line) in s.linenos.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{line}")?;
        }
        write!(f, ", structure {s})")
    }
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} conflicts with {}",
            Described(&self.left),
            Described(&self.right)
        )
    }
}

impl std::error::Error for MergeError {}

fn merge_kinds(a: &Structure, b: &Structure) -> Result<StructureKind, MergeError> {
    use StructureKind::*;

    Ok(match (&a.kind, &b.kind) {
        (Unknown, kind) | (kind, Unknown) => kind.clone(),

        (Scalar, kind @ (Scalar | String | Number | Boolean))
        | (kind @ (String | Number | Boolean), Scalar) => kind.clone(),
        (String, String) => String,
        (Number, Number) => Number,
        (Boolean, Boolean) => Boolean,

        (List(x), List(y)) => List(Box::new(merge(x, y)?)),

        (Tuple(x), Tuple(y)) if x.len() == y.len() => {
            let mut items = Vec::with_capacity(x.len());
            for (l, r) in x.iter().zip(y.iter()) {
                items.push(merge(l, r)?);
            }
            Tuple(items)
        }

        (Dictionary(x), Dictionary(y)) => {
            let mut fields = x.clone();
            for (name, r) in y.iter() {
                let merged = match fields.get(name) {
                    Some(l) => merge(l, r)?,
                    None => r.clone(),
                };
                fields.insert(name.clone(), merged);
            }
            Dictionary(fields)
        }

        _ => return Err(MergeError::new(a, b)),
    })
}

/// Combine two requirements on the same value into one that satisfies both.
///
/// Neither operand is modified. Fails when the kinds are incompatible,
/// either at the top level or anywhere inside a container.
pub fn merge(a: &Structure, b: &Structure) -> Result<Structure, MergeError> {
    let kind = merge_kinds(a, b)?;

    let mut linenos = a.linenos.clone();
    linenos.extend(b.linenos.iter());

    Ok(Structure {
        kind,
        label: a.label.clone().or_else(|| b.label.clone()),
        linenos,
        used_with_default: a.used_with_default || b.used_with_default,
        default_value: a.default_value.clone().or_else(|| b.default_value.clone()),
        value: if a.value == b.value {
            a.value.clone()
        } else {
            None
        },
        constant: a.constant && b.constant,
    })
}
