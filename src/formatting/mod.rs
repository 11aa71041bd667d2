// src/formatting/mod.rs
//! Renders document blocks into markdown-like text.

pub mod block_renderer;
mod rich_text;
mod state;

pub use self::block_renderer::{render_block, render_blocks, render_forest, render_resource};
pub use self::rich_text::MarkdownStyleRenderer;
