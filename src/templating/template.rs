//! Compiled templates.
//!
//! A [`Template`] owns a private handlebars registry holding the parsed
//! template and every partial it reaches. Partials are resolved and
//! registered by the [`Compiler`](super::compiler::Compiler), so rendering
//! never touches a partial provider or the filesystem.

use handlebars::Handlebars;
use serde_json::Value;
use std::fmt;
use std::io::Write;

use super::error::TemplateError;
use super::helpers::register_helpers;

/// Registry name of the template itself.
///
/// Partials share the registry namespace, so this lives under the reserved
/// `pagesmith/` prefix.
pub(crate) const ROOT_TEMPLATE: &str = "pagesmith/root";

/// A compiled, immutable template.
#[derive(Clone)]
pub struct Template {
    registry: Handlebars<'static>,
    partials: Vec<String>,
}

impl Template {
    pub(crate) fn new(root: handlebars::Template, partials: Vec<(String, handlebars::Template)>) -> Self {
        let mut registry = Handlebars::new();
        register_helpers(&mut registry);

        let names = partials.iter().map(|(name, _)| name.clone()).collect();
        for (name, partial) in partials {
            registry.register_template(&name, partial);
        }
        registry.register_template(ROOT_TEMPLATE, root);

        Self {
            registry,
            partials: names,
        }
    }

    /// Names of all partials reachable from this template, sorted.
    pub fn partial_names(&self) -> &[String] {
        &self.partials
    }

    /// Render against a single data value.
    pub fn render(&self, sink: &mut dyn Write, data: &Value) -> Result<(), TemplateError> {
        self.registry.render_to_write(ROOT_TEMPLATE, data, sink)?;
        Ok(())
    }

    /// Render against a single data value into a `String`.
    pub fn render_to_string(&self, data: &Value) -> Result<String, TemplateError> {
        Ok(self.registry.render(ROOT_TEMPLATE, data)?)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("partials", &self.partials).finish()
    }
}
