// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct FilterCatalog {
    #[serde(default)]
    pub(super) groups: Vec<FilterGroupConfig>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct FilterGroupConfig {
    #[allow(dead_code)]
    pub(super) name: String,
    #[serde(default)]
    pub(super) filters: Vec<FilterConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(super) struct FilterConfig {
    pub(super) name: String,
    #[serde(default)]
    pub(super) aliases: Vec<String>,
    #[serde(default)]
    pub(super) unsupported: bool,
    #[serde(default)]
    pub(super) params: Vec<ParamConfig>,
    /// Extra positional and keyword arguments are accepted.
    #[serde(default)]
    pub(super) variadic: bool,
    #[serde(default = "unknown_template")]
    pub(super) returns: String,
    #[serde(default = "unknown_template")]
    pub(super) input: String,
    #[serde(default)]
    pub(super) output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(super) struct ParamConfig {
    pub(super) name: String,
    #[serde(default)]
    pub(super) optional: bool,
    #[serde(default)]
    pub(super) keyword_only: bool,
    #[serde(default = "unknown_template")]
    pub(super) expects: String,
    #[serde(default)]
    pub(super) role: Option<RoleConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub(super) enum RoleConfig {
    DefaultValue,
    Attribute,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub(super) enum OutputConfig {
    #[default]
    Returns,
    ReturnClass,
    Input,
    Element,
    Wrap,
    Batch,
}

fn unknown_template() -> String {
    "unknown".to_string()
}
