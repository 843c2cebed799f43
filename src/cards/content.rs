//! Content classification and the renderer seam for card bodies
//!
//! Display formatting belongs to the host. This module only decides what kind
//! of content a socket value is and turns it into text for a renderer the host
//! injects through [`ContentRenderers`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SocketError, SocketResult};

/// How a card body should be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Markdown,
    PlainText,
}

/// Values that display as nothing: null, false, zero and the empty string
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// A string that looks like a serialized JSON object or array
pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}')) || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Decide how a value displays. `None` means there is nothing to show.
pub fn classify(value: Option<&Value>, markdown_enabled: bool) -> Option<ContentKind> {
    let value = value.filter(|v| !is_blank(v))?;
    let kind = match value {
        Value::Object(_) | Value::Array(_) => ContentKind::Json,
        Value::String(text) if looks_like_json(text) => ContentKind::Json,
        Value::String(_) if markdown_enabled => ContentKind::Markdown,
        _ => ContentKind::PlainText,
    };
    Some(kind)
}

/// Turns a socket value into display text of one kind
pub trait ContentRenderer: Send + Sync {
    fn kind(&self) -> ContentKind;

    fn render(&self, value: &Value) -> SocketResult<String>;
}

/// Pretty-prints JSON. String values are parsed first.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ContentRenderer for JsonRenderer {
    fn kind(&self) -> ContentKind {
        ContentKind::Json
    }

    fn render(&self, value: &Value) -> SocketResult<String> {
        let pretty = match value {
            Value::String(text) => {
                let parsed: Value = serde_json::from_str(text)
                    .map_err(|e| SocketError::render(format!("invalid JSON content: {e}")))?;
                serde_json::to_string_pretty(&parsed)?
            }
            other => serde_json::to_string_pretty(other)?,
        };
        Ok(pretty)
    }
}

/// Produces Markdown source for the host's Markdown view
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl ContentRenderer for MarkdownRenderer {
    fn kind(&self) -> ContentKind {
        ContentKind::Markdown
    }

    fn render(&self, value: &Value) -> SocketResult<String> {
        match value {
            Value::String(text) => Ok(text.clone()),
            Value::Object(map) => match map.get("content") {
                Some(Value::String(content)) => Ok(content.clone()),
                _ => Ok(serde_json::to_string_pretty(value)?),
            },
            other => Ok(serde_json::to_string_pretty(other)?),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl ContentRenderer for PlainTextRenderer {
    fn kind(&self) -> ContentKind {
        ContentKind::PlainText
    }

    fn render(&self, value: &Value) -> SocketResult<String> {
        Ok(match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

/// Rendered card body. `error` is set when the renderer failed; the body is
/// then empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub kind: Option<ContentKind>,
    pub body: String,
    pub error: Option<String>,
}

impl RenderedContent {
    pub fn empty() -> Self {
        Self {
            kind: None,
            body: String::new(),
            error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// One renderer per content kind, injected into cards
pub struct ContentRenderers {
    json: Box<dyn ContentRenderer>,
    markdown: Box<dyn ContentRenderer>,
    plain_text: Box<dyn ContentRenderer>,
    markdown_enabled: bool,
}

impl Default for ContentRenderers {
    fn default() -> Self {
        Self {
            json: Box::new(JsonRenderer),
            markdown: Box::new(MarkdownRenderer),
            plain_text: Box::new(PlainTextRenderer),
            markdown_enabled: true,
        }
    }
}

impl std::fmt::Debug for ContentRenderers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRenderers")
            .field("markdown_enabled", &self.markdown_enabled)
            .finish_non_exhaustive()
    }
}

impl ContentRenderers {
    /// Replace the renderer for whatever kind `renderer` reports
    pub fn with_renderer(mut self, renderer: Box<dyn ContentRenderer>) -> Self {
        match renderer.kind() {
            ContentKind::Json => self.json = renderer,
            ContentKind::Markdown => self.markdown = renderer,
            ContentKind::PlainText => self.plain_text = renderer,
        }
        self
    }

    pub fn with_markdown_enabled(mut self, enabled: bool) -> Self {
        self.markdown_enabled = enabled;
        self
    }

    pub fn renderer(&self, kind: ContentKind) -> &dyn ContentRenderer {
        match kind {
            ContentKind::Json => self.json.as_ref(),
            ContentKind::Markdown => self.markdown.as_ref(),
            ContentKind::PlainText => self.plain_text.as_ref(),
        }
    }

    pub fn classify(&self, value: Option<&Value>) -> Option<ContentKind> {
        classify(value, self.markdown_enabled)
    }

    /// Classify and render. Blank values render as empty content.
    pub fn render(&self, value: Option<&Value>) -> SocketResult<RenderedContent> {
        let (Some(kind), Some(value)) = (self.classify(value), value) else {
            return Ok(RenderedContent::empty());
        };
        let body = self.renderer(kind).render(value)?;
        Ok(RenderedContent {
            kind: Some(kind),
            body,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification() {
        assert_eq!(classify(None, true), None);
        assert_eq!(classify(Some(&json!(null)), true), None);
        assert_eq!(classify(Some(&json!("")), true), None);
        assert_eq!(classify(Some(&json!(0)), true), None);
        assert_eq!(classify(Some(&json!(false)), true), None);

        assert_eq!(classify(Some(&json!({"a": 1})), true), Some(ContentKind::Json));
        assert_eq!(classify(Some(&json!([1, 2])), true), Some(ContentKind::Json));
        assert_eq!(classify(Some(&json!("  {\"a\": 1} ")), true), Some(ContentKind::Json));
        assert_eq!(classify(Some(&json!("[1]")), true), Some(ContentKind::Json));
        assert_eq!(classify(Some(&json!("# Title")), true), Some(ContentKind::Markdown));
        assert_eq!(classify(Some(&json!("# Title")), false), Some(ContentKind::PlainText));
        assert_eq!(classify(Some(&json!(3.5)), true), Some(ContentKind::PlainText));
        assert_eq!(classify(Some(&json!("{ unbalanced")), true), Some(ContentKind::Markdown));
    }

    #[test]
    fn test_json_renderer_pretty_prints_strings() {
        let out = JsonRenderer.render(&json!("{\"a\":1}")).unwrap();
        assert_eq!(out, "{\n  \"a\": 1\n}");
        assert!(JsonRenderer.render(&json!("{not json}")).is_err());
    }

    #[test]
    fn test_markdown_prefers_content_field() {
        assert_eq!(MarkdownRenderer.render(&json!({"content": "**hi**"})).unwrap(), "**hi**");
        assert_eq!(MarkdownRenderer.render(&json!("plain")).unwrap(), "plain");
    }

    #[test]
    fn test_custom_renderer_is_used() {
        struct Shouty;
        impl ContentRenderer for Shouty {
            fn kind(&self) -> ContentKind {
                ContentKind::Markdown
            }
            fn render(&self, value: &Value) -> SocketResult<String> {
                Ok(value.as_str().unwrap_or_default().to_uppercase())
            }
        }

        let renderers = ContentRenderers::default().with_renderer(Box::new(Shouty));
        let rendered = renderers.render(Some(&json!("hello"))).unwrap();
        assert_eq!(rendered.kind, Some(ContentKind::Markdown));
        assert_eq!(rendered.body, "HELLO");
    }

    #[test]
    fn test_blank_renders_empty() {
        let rendered = ContentRenderers::default().render(None).unwrap();
        assert!(rendered.is_empty());
        assert_eq!(rendered.kind, None);
    }
}
