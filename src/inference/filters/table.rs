// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use super::catalog::FilterCatalog;
use super::spec::{FilterSpec, FilterTableError};

const DEFAULT_FILTERS_JSON: &str = include_str!("./filters.json");

#[derive(Default)]
pub struct FilterTable {
    entries: BTreeMap<String, Arc<FilterSpec>>,
}

impl FilterTable {
    pub fn from_json(json: &str) -> Result<Self, FilterTableError> {
        let catalog: FilterCatalog = serde_json::from_str(json)?;

        let mut entries = BTreeMap::new();
        for group in catalog.groups.into_iter() {
            for filter in group.filters.iter() {
                let spec = Arc::new(FilterSpec::from_config(filter)?);
                for name in core::iter::once(&filter.name).chain(filter.aliases.iter()) {
                    if entries.insert(name.clone(), spec.clone()).is_some() {
                        return Err(FilterTableError::DuplicateFilter(name.clone()));
                    }
                }
            }
        }

        Ok(FilterTable { entries })
    }

    pub fn lookup(&self, name: &str) -> Option<&FilterSpec> {
        self.entries.get(name).map(|spec| spec.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    static ref DEFAULT_TABLE: FilterTable = FilterTable::from_json(DEFAULT_FILTERS_JSON)
        .expect("failed to load default filter specifications");
}

/// Filter table compiled into the crate.
pub fn default_table() -> &'static FilterTable {
    &DEFAULT_TABLE
}

pub fn lookup(name: &str) -> Option<&'static FilterSpec> {
    DEFAULT_TABLE.lookup(name)
}
