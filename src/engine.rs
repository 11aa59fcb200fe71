// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::inference::json_schema::to_json_schema;
use crate::inference::*;
use crate::lexer::*;
use crate::parser::*;

use std::convert::AsRef;
use std::path::Path;

use anyhow::Result;

/// Infers the structure of the context a set of templates is rendered with.
#[derive(Clone)]
pub struct Engine {
    templates: Vec<Ref<Template>>,
    config: Config,
}

/// Create a default engine.
impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            templates: vec![],
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn add_template(&mut self, path: String, contents: String) -> Result<()> {
        let source = Source::from_contents(path, contents)?;
        let mut parser = Parser::new(&source)?;
        self.templates.push(Ref::new(parser.parse()?));
        Ok(())
    }

    pub fn add_template_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let source = Source::from_file(path)?;
        let mut parser = Parser::new(&source)?;
        self.templates.push(Ref::new(parser.parse()?));
        Ok(())
    }

    pub fn clear_templates(&mut self) {
        self.templates.clear();
    }

    /// Requirements of all added templates, as if they were rendered with
    /// the same context.
    pub fn infer(&self) -> Result<Requirements> {
        let mut reqs = Requirements::new();
        for template in self.templates.iter() {
            reqs.merge_in(infer_template(template, &self.config)?)
                .map_err(InferenceError::from)?;
        }
        Ok(reqs)
    }

    /// Requirements of a single template. Added templates are not consulted.
    pub fn infer_template_str(&self, path: &str, contents: &str) -> Result<Requirements> {
        let source = Source::from_contents(path.to_string(), contents.to_string())?;
        let mut parser = Parser::new(&source)?;
        let template = parser.parse()?;
        Ok(infer_template(&template, &self.config)?)
    }

    pub fn infer_json_schema(&self) -> Result<serde_json::Value> {
        Ok(to_json_schema(&self.infer()?))
    }
}
