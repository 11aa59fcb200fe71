// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Contracts of the filters the inference understands.
//!
//! The table is described by `filters.json` and validated the first time it
//! is used.

mod catalog;
mod spec;
mod table;

pub use spec::{FilterSpec, FilterTableError, OutputRule, ParamRole, ParamSpec, StructureTemplate};
pub use table::{default_table, lookup, FilterTable};
