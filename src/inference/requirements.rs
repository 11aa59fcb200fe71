// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use super::model::{merge, MergeError, Structure};

/// Variable name to the structure the template needs it to have.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Requirements {
    vars: BTreeMap<String, Structure>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: impl Into<String>, structure: Structure) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(name.into(), structure);
        Requirements { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Structure> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Structure> {
        self.vars.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Add a requirement, merging with whatever is already known about
    /// the variable.
    pub fn insert(&mut self, name: &str, structure: Structure) -> Result<(), MergeError> {
        let merged = match self.vars.get(name) {
            Some(existing) => merge(existing, &structure)?,
            None => structure,
        };
        self.vars.insert(name.to_string(), merged);
        Ok(())
    }

    /// Fold another set of requirements into this one.
    pub fn merge_in(&mut self, other: Requirements) -> Result<(), MergeError> {
        for (name, structure) in other.vars {
            self.insert(&name, structure)?;
        }
        Ok(())
    }

    pub fn merge(&self, other: &Requirements) -> Result<Requirements, MergeError> {
        let mut merged = self.clone();
        merged.merge_in(other.clone())?;
        Ok(merged)
    }

    /// The requirements viewed as the dictionary the template is rendered with.
    pub fn into_structure(self) -> Structure {
        let mut linenos = std::collections::BTreeSet::new();
        for s in self.vars.values() {
            linenos.extend(s.linenos.iter());
        }
        let mut structure = Structure::dictionary(self.vars);
        structure.linenos = linenos;
        structure
    }
}

impl IntoIterator for Requirements {
    type Item = (String, Structure);
    type IntoIter = btree_map::IntoIter<String, Structure>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

impl<'a> IntoIterator for &'a Requirements {
    type Item = (&'a String, &'a Structure);
    type IntoIter = btree_map::Iter<'a, String, Structure>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.clone().into_structure(), f)
    }
}
