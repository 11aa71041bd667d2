//! Document content: typed blocks, composition helpers, server records and
//! the assembled block tree.

pub mod blocks;
pub mod compose;
pub mod resources;
pub mod tree;

pub use blocks::{Block, DocumentBlock, TextElement, TextStyle, UserMention};
pub use resources::*;
pub use tree::BlockForest;
