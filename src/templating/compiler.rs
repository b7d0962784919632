//! Template compiler.
//!
//! Parses handlebars source into a [`Template`]. Every `{{> name}}` the
//! parsed template reaches is resolved here, through the compiler's
//! [`PartialProvider`], and registered alongside it; a template that compiles
//! successfully can therefore never fail on a missing partial while rendering.

use handlebars::template::TemplateElement;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::TemplateError;
use super::partials::{PartialChain, PartialProvider};
use super::template::Template;
use crate::constants::MAX_PARTIAL_DEPTH;

/// Compiles template source, resolving partials through a shared provider.
///
/// The compiler is cheap to clone and holds no mutable state; the partial
/// provider is an explicit value rather than a process-wide registry.
#[derive(Debug, Clone)]
pub struct Compiler {
    partials: Arc<dyn PartialProvider>,
}

impl Compiler {
    /// Create a compiler resolving partials through `partials`.
    pub fn new(partials: Arc<dyn PartialProvider>) -> Self {
        Self {
            partials,
        }
    }

    /// A compiler for which every partial is missing.
    pub fn without_partials() -> Self {
        Self::new(Arc::new(PartialChain::default()))
    }

    /// The provider partial tags are resolved against.
    pub fn partials(&self) -> &Arc<dyn PartialProvider> {
        &self.partials
    }

    /// Compile template source.
    pub fn compile(&self, source: &str) -> Result<Template, TemplateError> {
        let root = handlebars::Template::compile(source)?;

        let mut resolved = BTreeMap::new();
        self.resolve_partials(&root, 0, &mut resolved)?;

        Ok(Template::new(root, resolved.into_iter().collect()))
    }

    /// Compile template source, tagging any error with the template's name.
    pub fn compile_named(&self, name: &str, source: &str) -> Result<Template, TemplateError> {
        self.compile(source).map_err(|e| {
            tracing::error!("Failed to compile template '{}': {}", name, e);
            e.in_template(name)
        })
    }

    /// Compile several named templates independently.
    ///
    /// A failure only affects its own entry; every other template is still
    /// compiled and returned.
    pub fn compile_batch<'s, I>(&self, sources: I) -> BTreeMap<String, Result<Template, TemplateError>>
    where
        I: IntoIterator<Item = (&'s str, &'s str)>,
    {
        sources
            .into_iter()
            .map(|(name, source)| (name.to_string(), self.compile_named(name, source)))
            .collect()
    }

    /// Resolve every partial `parsed` references, recursively.
    ///
    /// Each partial is fetched and parsed once; the walk still descends
    /// through it at every depth it appears, so a cycle ends at the depth
    /// limit.
    fn resolve_partials(
        &self,
        parsed: &handlebars::Template,
        depth: usize,
        resolved: &mut BTreeMap<String, handlebars::Template>,
    ) -> Result<(), TemplateError> {
        for name in partial_references(parsed) {
            if depth >= MAX_PARTIAL_DEPTH {
                return Err(TemplateError::PartialRecursion {
                    name,
                    depth: MAX_PARTIAL_DEPTH,
                });
            }

            let partial = match resolved.get(&name) {
                Some(partial) => partial.clone(),
                None => {
                    let source = self.partials.get(&name)?;
                    let partial = handlebars::Template::compile(&source)
                        .map_err(|e| TemplateError::from(e).in_template(name.as_str()))?;
                    resolved.insert(name.clone(), partial.clone());
                    partial
                }
            };

            self.resolve_partials(&partial, depth + 1, resolved)
                .map_err(|e| e.in_template(name.as_str()))?;
        }
        Ok(())
    }
}

/// Statically named partials referenced anywhere in `template`, deduplicated.
///
/// Dynamic partial names (`{{> (lookup ...)}}`) and `@partial-block` cannot
/// be resolved ahead of rendering and are skipped.
fn partial_references(template: &handlebars::Template) -> Vec<String> {
    let mut names = Vec::new();
    collect_references(template, &mut names);
    names.sort();
    names.dedup();
    names
}

fn collect_references(template: &handlebars::Template, names: &mut Vec<String>) {
    for element in &template.elements {
        match element {
            TemplateElement::PartialExpression(partial) | TemplateElement::PartialBlock(partial) => {
                if let Some(name) = partial.name.as_name() {
                    if !name.starts_with('@') {
                        names.push(name.to_string());
                    }
                }
                if let Some(inner) = &partial.template {
                    collect_references(inner, names);
                }
            }
            TemplateElement::DecoratorBlock(decorator) => {
                if let Some(inner) = &decorator.template {
                    collect_references(inner, names);
                }
            }
            TemplateElement::HelperBlock(helper) => {
                for inner in helper.template.iter().chain(helper.inverse.iter()) {
                    collect_references(inner, names);
                }
            }
            _ => {}
        }
    }
}
