//! Higher-level content built purely by concatenating block constructors.
//!
//! Nothing here performs I/O; the same inputs always produce the same blocks.

use super::blocks::{Block, TextElement, TextStyle};
use crate::types::{Color, ValidationError};
use indexmap::IndexMap;

/// A horizontal rule, written as a dashed paragraph.
pub fn divider() -> Block {
    Block::text("---", TextStyle::plain())
}

pub fn quote(content: &str) -> Block {
    Block::text(
        format!("> {}", content),
        TextStyle::plain().with_italic().with_text_color(Color::Gray),
    )
}

/// A highlighted paragraph with an optional leading emoji.
pub fn callout(content: &str, emoji: Option<&str>, background: Color) -> Block {
    let text = match emoji {
        Some(emoji) => format!("{} {}", emoji, content),
        None => content.to_string(),
    };
    Block::text(text, TextStyle::plain().with_background(background))
}

/// A checkbox item, written as a bullet with a `[ ]` / `[x]` prefix.
pub fn todo(content: &str, checked: bool) -> Block {
    let prefix = if checked { "[x] " } else { "[ ] " };
    Block::bullet(format!("{}{}", prefix, content), TextStyle::plain())
}

/// Link-styled text (underlined, blue). The target is not carried.
pub fn link(text: &str) -> Block {
    Block::text_runs(vec![TextElement::new(
        text,
        TextStyle::plain()
            .with_underline()
            .with_text_color(Color::Blue),
    )])
}

/// A paragraph consisting of a single user mention.
pub fn mention(user_id: &str) -> Block {
    Block::text_runs(vec![TextElement::mention(user_id)])
}

/// A code block followed by an italic gray caption when one is given.
pub fn code_with_caption(
    code: &str,
    language: &str,
    caption: Option<&str>,
) -> Result<Vec<Block>, ValidationError> {
    let mut blocks = vec![Block::code(code, language)?];
    if let Some(caption) = caption {
        blocks.push(Block::text(
            caption,
            TextStyle::plain().with_italic().with_text_color(Color::Gray),
        ));
    }
    Ok(blocks)
}

/// A level-2 heading followed by its content.
pub fn section(title: &str, content: Vec<Block>) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(content.len() + 1);
    blocks.push(heading_unchecked(title, 2));
    blocks.extend(content);
    blocks
}

/// One paragraph per entry: bold `term: ` followed by the definition.
pub fn definition_list(items: &IndexMap<String, String>) -> Vec<Block> {
    items
        .iter()
        .map(|(term, definition)| {
            Block::text_runs(vec![
                TextElement::new(format!("{}: ", term), TextStyle::plain().with_bold()),
                TextElement::plain(definition.as_str()),
            ])
        })
        .collect()
}

/// A "Metadata" level-3 heading followed by a definition list.
pub fn metadata_table(items: &IndexMap<String, String>) -> Vec<Block> {
    let mut blocks = vec![heading_unchecked("Metadata", 3)];
    blocks.extend(definition_list(items));
    blocks
}

/// Content for a table cell; header cells are written as level-1 headings.
pub fn table_cell(content: &str, is_header: bool) -> Block {
    if is_header {
        heading_unchecked(content, 1)
    } else {
        Block::text(content, TextStyle::plain())
    }
}

/// One section of a markdown-like document.
#[derive(Debug, Clone)]
pub struct Section {
    pub level: u8,
    pub heading: String,
    pub content: Vec<Block>,
}

impl Section {
    pub fn new(level: u8, heading: impl Into<String>, content: Vec<Block>) -> Self {
        Self {
            level,
            heading: heading.into(),
            content,
        }
    }
}

/// A level-1 title followed by each section's heading and content.
pub fn markdown_like_document(
    title: &str,
    sections: Vec<Section>,
) -> Result<Vec<Block>, ValidationError> {
    let mut blocks = vec![heading_unchecked(title, 1)];
    for section in sections {
        blocks.push(Block::heading(section.heading, section.level, None)?);
        blocks.extend(section.content);
    }
    Ok(blocks)
}

/// Reference documentation for one HTTP endpoint.
pub fn api_endpoint_doc(
    method: &str,
    path: &str,
    description: &str,
    parameters: Option<&IndexMap<String, String>>,
    example: Option<&str>,
) -> Result<Vec<Block>, ValidationError> {
    let mut blocks = vec![
        heading_unchecked(&format!("{} {}", method.to_uppercase(), path), 3),
        Block::text(description, TextStyle::plain()),
    ];

    if let Some(parameters) = parameters.filter(|p| !p.is_empty()) {
        blocks.push(heading_unchecked("Parameters", 4));
        for (name, desc) in parameters {
            blocks.push(Block::code(format!("{}: {}", name, desc), "bash")?);
        }
    }

    if let Some(example) = example {
        blocks.push(heading_unchecked("Example", 4));
        blocks.push(Block::code(example, "bash")?);
    }

    Ok(blocks)
}

/// Headings at literal levels known to be in range.
fn heading_unchecked(content: &str, level: u8) -> Block {
    match Block::heading(content, level, None) {
        Ok(block) => block,
        Err(_) => Block::text(content, TextStyle::plain().with_bold()),
    }
}
