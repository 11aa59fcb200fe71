// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Structure, StructureClass};

/// Which filters missing from the filter table may be skipped over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreUnknownFilters {
    All(bool),
    Names(BTreeSet<String>),
}

impl Default for IgnoreUnknownFilters {
    fn default() -> Self {
        IgnoreUnknownFilters::All(false)
    }
}

impl IgnoreUnknownFilters {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IgnoreUnknownFilters::Names(names.into_iter().map(Into::into).collect())
    }

    /// Whether an unknown filter with the given name is tolerated.
    pub fn tolerates(&self, name: &str) -> bool {
        match self {
            IgnoreUnknownFilters::All(all) => *all,
            IgnoreUnknownFilters::Names(names) => names.contains(name),
        }
    }
}

impl From<bool> for IgnoreUnknownFilters {
    fn from(all: bool) -> Self {
        IgnoreUnknownFilters::All(all)
    }
}

/// Container kind assumed for a value that is subscripted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    List,
    Tuple,
    Dictionary,
}

/// Configuration for structure inference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub ignore_unknown_filters: IgnoreUnknownFilters,
    /// Container assumed for `x[0]`.
    pub indexed_with_integer: ContainerKind,
    /// Container assumed for `x[key]` where `key` is not a literal.
    pub indexed_with_variable: ContainerKind,
    /// Largest literal index that gives a tuple a known arity. A tuple
    /// subscripted beyond it is left unknown.
    pub max_tuple_index: u32,
    /// Maximum number of nested visits. Every filter of a chain is one
    /// level, as is every argument, subscript and literal element.
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ignore_unknown_filters: IgnoreUnknownFilters::default(),
            indexed_with_integer: ContainerKind::List,
            indexed_with_variable: ContainerKind::Dictionary,
            max_tuple_index: 255,
            max_depth: 128,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> anyhow::Result<Config> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What the enclosing expression expects from the one being visited.
///
/// Cheap to clone; a new context is derived for every sub-expression.
#[derive(Clone, Debug)]
pub struct Context<'a> {
    pub predicted_struct: Structure,
    pub return_struct_cls: StructureClass,
    pub config: &'a Config,
    depth: u32,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config) -> Self {
        Context {
            predicted_struct: Structure::unknown(),
            return_struct_cls: StructureClass::Scalar,
            config,
            depth: 0,
        }
    }

    pub fn with_predicted(mut self, predicted: Structure) -> Self {
        self.predicted_struct = predicted;
        self
    }

    pub fn with_return_class(mut self, class: StructureClass) -> Self {
        self.return_struct_cls = class;
        self
    }

    /// Context for a sub-expression expected to have the given structure.
    pub fn descend(&self, predicted: Structure) -> Self {
        Context {
            predicted_struct: predicted,
            return_struct_cls: self.return_struct_cls,
            config: self.config,
            depth: self.depth + 1,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}
