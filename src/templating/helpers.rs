//! Handlebars helpers registered on every compiled template.

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext, html_escape};

/// Dump a value as compact, HTML-escaped JSON: `{{json this}}`.
///
/// Backs the built-in `pagesmith/debug` partial. Plain `{{this}}` would print
/// objects as `[object]`.
pub fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let json = h.param(0).map(|param| param.value().to_string()).unwrap_or_default();
    out.write(&html_escape(&json))?;
    Ok(())
}

/// Register the pagesmith helpers on a registry.
pub fn register_helpers(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper("json", Box::new(json_helper));
}
