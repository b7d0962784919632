//! Renderers turn a data value into response bytes.
//!
//! [`Renderer`] is a closed set of variants: a bare compiled template, a
//! template composed with a layout, a static byte blob and a no-op. Handlers
//! hold the current renderer behind an atomic pointer and swap in new ones
//! as the broker delivers them.

use serde_json::{Value, json};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use super::error::TemplateError;
use super::template::Template;

/// Name under which a layout receives the rendered page content.
///
/// Layouts reference it unescaped: `{{{content}}}`.
pub const CONTENT_KEY: &str = "content";

/// Something that can render a data value to an output sink.
#[derive(Clone, Default)]
pub enum Renderer {
    /// A compiled template rendered directly
    Template(Arc<Template>),
    /// A template rendered into the `content` slot of a layout
    Layout { template: Arc<Template>, layout: Arc<Template> },
    /// Fixed bytes written verbatim
    Static(Arc<[u8]>),
    /// Writes nothing
    #[default]
    Noop,
}

impl Renderer {
    /// Renderer for a single compiled template.
    pub fn template(template: Arc<Template>) -> Self {
        Self::Template(template)
    }

    /// Renderer composing `template` inside `layout`.
    pub fn layout(template: Arc<Template>, layout: Arc<Template>) -> Self {
        Self::Layout {
            template,
            layout,
        }
    }

    /// Renderer writing `bytes` regardless of the data.
    pub fn fixed(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Static(bytes.into())
    }

    /// Render `data` into `sink`.
    ///
    /// For layouts the inner template is rendered first; the layout then sees
    /// the page data with `content` set to that fragment, so it can still
    /// reach page fields such as a title.
    pub fn render(&self, sink: &mut dyn Write, data: &Value) -> Result<(), TemplateError> {
        match self {
            Self::Template(template) => template.render(sink, data),
            Self::Layout {
                template,
                layout,
            } => {
                let content = template.render_to_string(data)?;
                layout.render(sink, &layout_data(data, content))
            }
            Self::Static(bytes) => Ok(sink.write_all(bytes)?),
            Self::Noop => Ok(()),
        }
    }

    /// Render `data` into a freshly allocated buffer.
    pub fn render_to_vec(&self, data: &Value) -> Result<Vec<u8>, TemplateError> {
        let mut buf = Vec::new();
        self.render(&mut buf, data)?;
        Ok(buf)
    }

    /// Short variant name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Template(_) => "template",
            Self::Layout {
                ..
            } => "layout",
            Self::Static(_) => "static",
            Self::Noop => "noop",
        }
    }
}

/// Data a layout renders with: the page's object fields plus `content`.
///
/// Non-object page data (a backend array, say) is only reachable through the
/// rendered content.
fn layout_data(data: &Value, content: String) -> Value {
    match data {
        Value::Object(fields) => {
            let mut fields = fields.clone();
            fields.insert(CONTENT_KEY.to_string(), Value::String(content));
            Value::Object(fields)
        }
        _ => json!({ CONTENT_KEY: content }),
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(bytes) => write!(f, "Renderer::Static({} bytes)", bytes.len()),
            other => write!(f, "Renderer::{}", other.kind()),
        }
    }
}
