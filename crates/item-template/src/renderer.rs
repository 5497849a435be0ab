//! Renders template instances into JSON items.

use crate::error::TemplateError;
use crate::template::Template;
use crate::vars::ItemVars;
use serde_json::{Map, Value};

/// One rendered item: a JSON object keyed by attribute name.
pub type RenderedItem = Map<String, Value>;

/// Renders successive items from a template.
///
/// Each call to [`ItemRenderer::next_item`] produces the next item in
/// sequence, with `$BUILD` counting up from 1.
pub struct ItemRenderer {
    template: Template,
    /// Minutes added to the clock for `$NOW`
    offset_minutes: i64,
    /// Number of items rendered so far
    index: u64,
}

impl ItemRenderer {
    /// Create a renderer starting at `$BUILD = 1` with no timestamp offset.
    pub fn new(template: Template) -> Self {
        Self {
            template,
            offset_minutes: 0,
            index: 0,
        }
    }

    /// Shift `$NOW` by the given number of minutes.
    pub fn with_offset_minutes(mut self, minutes: i64) -> Self {
        self.offset_minutes = minutes;
        self
    }

    /// Get the template being rendered.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Placeholder names in the template that no item can fill, each listed once.
    ///
    /// Rendering fails on the first of these; checking up front lets a caller
    /// report them before any item is produced.
    pub fn unsupported_placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.template.placeholders() {
            if !ItemVars::is_supported(name) && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Number of items rendered so far.
    pub fn current_index(&self) -> u64 {
        self.index
    }

    /// Render the next item in sequence.
    ///
    /// The index only advances on success, so a failed render can be
    /// retried with the same `$BUILD` value.
    pub fn next_item(&mut self) -> Result<RenderedItem, TemplateError> {
        let build = self.index + 1;
        let item = self.render(build)?;
        self.index = build;
        Ok(item)
    }

    /// Render the item with sequence number `build`.
    pub fn render(&self, build: u64) -> Result<RenderedItem, TemplateError> {
        let vars = ItemVars::for_build(build, self.offset_minutes);
        self.render_with(&vars)
    }

    /// Render an item from explicit variables.
    pub fn render_with(&self, vars: &ItemVars) -> Result<RenderedItem, TemplateError> {
        let text = self.template.substitute(|name| vars.get(name))?;

        let value: Value = serde_json::from_str(&text).map_err(|source| TemplateError::Json {
            index: vars.build,
            source,
        })?;

        match value {
            Value::Object(item) => Ok(item),
            _ => Err(TemplateError::NotAnObject { index: vars.build }),
        }
    }
}
