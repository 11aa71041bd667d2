// src/formatting/rich_text.rs
//! Markdown markers for styled text runs.

use crate::model::{TextElement, TextStyle};

/// Renderer for text styles to Markdown.
pub struct MarkdownStyleRenderer;

impl MarkdownStyleRenderer {
    /// Wraps `content` in markers for each set flag.
    ///
    /// Inline code is applied innermost, then strikethrough, bold and
    /// italic. Underline and colors have no markdown form and are dropped.
    pub fn apply_styles(content: &str, style: &TextStyle) -> String {
        if content.trim().is_empty() {
            return content.to_string();
        }
        let mut result = content.to_string();

        if style.inline_code {
            result = format!("`{}`", result);
        }
        if style.strikethrough {
            result = format!("~~{}~~", result);
        }
        if style.bold {
            result = format!("**{}**", result);
        }
        if style.italic {
            result = format!("*{}*", result);
        }
        result
    }
}

/// Concatenates styled runs.
pub fn render_elements(elements: &[TextElement]) -> String {
    elements
        .iter()
        .map(|element| MarkdownStyleRenderer::apply_styles(&element.content, &element.style))
        .collect()
}

/// Like `render_elements`, ignoring bold; headings are already emphasized.
pub fn render_heading_elements(elements: &[TextElement]) -> String {
    elements
        .iter()
        .map(|element| {
            let style = TextStyle {
                bold: false,
                ..element.style.clone()
            };
            MarkdownStyleRenderer::apply_styles(&element.content, &style)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_order() {
        let style = TextStyle::plain()
            .with_inline_code()
            .with_strikethrough()
            .with_bold()
            .with_italic();
        assert_eq!(
            MarkdownStyleRenderer::apply_styles("x", &style),
            "***~~`x`~~***"
        );
    }

    #[test]
    fn test_whitespace_runs_are_not_wrapped() {
        let style = TextStyle::plain().with_bold();
        assert_eq!(MarkdownStyleRenderer::apply_styles(" ", &style), " ");
    }

    #[test]
    fn test_elements_concatenate() {
        let elements = vec![
            TextElement::new("Run ", TextStyle::plain()),
            TextElement::new("cargo", TextStyle::plain().with_inline_code()),
            TextElement::plain(" now, "),
            TextElement::mention("ou_1"),
        ];
        assert_eq!(render_elements(&elements), "Run `cargo` now, @ou_1");
    }
}
