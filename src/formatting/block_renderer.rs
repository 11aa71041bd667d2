// src/formatting/block_renderer.rs
//! Block rendering engine: converts document blocks to markdown-like text.
//!
//! Rendering is lossy and one-directional. Colors, underline and table
//! contents have no representation in the output.

use super::rich_text::{render_elements, render_heading_elements};
use super::state::FormatContext;
use crate::api::{AccessPath, FetchedResource};
use crate::constants::{CHARS_PER_BLOCK_ESTIMATE, INDENT_SPACES};
use crate::model::{Block, BlockForest};

/// Renders one block. An ordered item standing alone is numbered 1.
pub fn render_block(block: &Block) -> String {
    render_numbered(block, 1)
}

fn render_numbered(block: &Block, number: usize) -> String {
    match block {
        Block::Text { elements } => render_elements(elements),
        Block::Heading { level, elements } => format!(
            "{} {}",
            "#".repeat(usize::from(level.get())),
            render_heading_elements(elements)
        ),
        Block::Bullet { elements } => format!("- {}", render_elements(elements)),
        Block::Ordered { elements } => format!("{}. {}", number, render_elements(elements)),
        Block::Code { language, elements } => {
            let language = language.as_ref().map(|l| l.as_str()).unwrap_or_default();
            let code: String = elements.iter().map(|e| e.content.as_str()).collect();
            format!("```{}\n{}\n```", language, code)
        }
        Block::Image { token } => format!("![image]({})", token),
        Block::Equation { elements } => {
            let expression: String = elements.iter().map(|e| e.content.as_str()).collect();
            format!("$${}$$", expression)
        }
        Block::Table { rows, columns } => format!("[table {}x{}]", rows, columns),
        Block::Canvas => "[whiteboard]".to_string(),
        Block::Generic {
            block_type,
            elements,
        } => {
            let text = render_elements(elements);
            if text.is_empty() {
                format!("[{}]", block_type)
            } else {
                text
            }
        }
    }
}

/// Renders a flat sequence, one block per line, numbering ordered runs.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut lines = Vec::with_capacity(blocks.len());
    let mut context = FormatContext::new();

    for block in blocks {
        let (line, next) = render_in_context(block, 0, &context);
        lines.push(line);
        context = next;
    }

    lines.join("\n")
}

/// Renders a fetched tree; nested children are indented two spaces per level.
pub fn render_forest(forest: &BlockForest) -> String {
    let visits = forest.depth_first();
    let mut output = String::with_capacity(visits.len() * CHARS_PER_BLOCK_ESTIMATE);
    let mut context = FormatContext::new();

    log::debug!("Rendering block tree with {} blocks", visits.len());

    for (depth, fetched) in visits {
        let (rendered, next) = render_in_context(&fetched.block, depth, &context);
        context = next;
        let indent = " ".repeat(depth * INDENT_SPACES);
        for line in rendered.lines() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&indent);
            output.push_str(line);
        }
    }

    output
}

fn render_in_context(block: &Block, depth: usize, context: &FormatContext) -> (String, FormatContext) {
    match block {
        Block::Ordered { .. } => {
            let (number, next) = context.next_ordered(depth);
            (render_numbered(block, number), next)
        }
        _ => (render_block(block), context.other_block(depth)),
    }
}

/// A readable summary of a fetched share link.
pub fn render_resource(resource: &FetchedResource) -> String {
    let access = match resource.access() {
        AccessPath::Public => "public",
        AccessPath::Authenticated => "authenticated",
    };
    match resource {
        FetchedResource::Wiki { node, .. } => {
            let (title, token) = node
                .as_ref()
                .map(|n| (n.title.as_str(), n.node_token.as_str()))
                .unwrap_or(("N/A", "N/A"));
            format!(
                "# Wiki Page\nTitle: {}\nNode Token: {}\nAccess: {}",
                title, token, access
            )
        }
        FetchedResource::Document {
            document, blocks, ..
        } => {
            let (title, id) = document
                .as_ref()
                .map(|d| (d.title.as_str(), d.document_id.as_str()))
                .unwrap_or(("N/A", "N/A"));
            let content: Vec<Block> = blocks.iter().map(|b| b.block.clone()).collect();
            let mut output = format!(
                "# Document\nTitle: {}\nDocument ID: {}\nAccess: {}\n\n## Content ({} blocks)",
                title,
                id,
                access,
                blocks.len()
            );
            if !content.is_empty() {
                output.push_str("\n\n");
                output.push_str(&render_blocks(&content));
            }
            output
        }
    }
}
