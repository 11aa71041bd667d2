// src/model/tree.rs
//! Caller-side assembly of fetched blocks into a tree.
//!
//! The service only ever returns one level of children per call. A
//! `BlockForest` collects those levels, keyed by parent, and walks them
//! back in document order.

use super::blocks::DocumentBlock;
use crate::constants::BLOCK_MAX_TREE_DEPTH;
use crate::types::BlockId;
use indexmap::IndexMap;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct BlockForest {
    root: BlockId,
    children: IndexMap<BlockId, Vec<DocumentBlock>>,
}

impl BlockForest {
    /// An empty forest whose top-level blocks hang off `root`.
    pub fn new(root: BlockId) -> Self {
        Self {
            root,
            children: IndexMap::new(),
        }
    }

    pub fn root(&self) -> &BlockId {
        &self.root
    }

    /// Records the children of `parent` in server order, replacing any
    /// earlier listing for the same parent.
    pub fn insert_children(&mut self, parent: BlockId, blocks: Vec<DocumentBlock>) {
        self.children.insert(parent, blocks);
    }

    pub fn children_of(&self, parent: &BlockId) -> &[DocumentBlock] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn top_level(&self) -> &[DocumentBlock] {
        self.children_of(&self.root)
    }

    /// Number of blocks recorded across all parents.
    pub fn len(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-order traversal with nesting depth (top level is 0).
    ///
    /// A block id seen twice is skipped, and nothing deeper than
    /// `BLOCK_MAX_TREE_DEPTH` is visited.
    pub fn depth_first(&self) -> Vec<(usize, &DocumentBlock)> {
        let mut out = Vec::with_capacity(self.len());
        let mut seen: HashSet<&BlockId> = HashSet::new();
        let mut stack: Vec<(usize, &DocumentBlock)> = self
            .top_level()
            .iter()
            .rev()
            .map(|block| (0, block))
            .collect();

        while let Some((depth, block)) = stack.pop() {
            if !seen.insert(&block.block_id) {
                continue;
            }
            out.push((depth, block));
            if depth + 1 >= BLOCK_MAX_TREE_DEPTH {
                continue;
            }
            for child in self.children_of(&block.block_id).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::blocks::{Block, TextStyle};

    fn fetched(id: &str, parent: &str, text: &str) -> DocumentBlock {
        DocumentBlock {
            block_id: BlockId::new(id).unwrap(),
            parent_id: Some(BlockId::new(parent).unwrap()),
            children: Vec::new(),
            block: Block::text(text, TextStyle::plain()),
        }
    }

    #[test]
    fn test_depth_first_follows_document_order() {
        let root = BlockId::new("doc").unwrap();
        let mut forest = BlockForest::new(root.clone());
        forest.insert_children(
            root,
            vec![fetched("a", "doc", "A"), fetched("b", "doc", "B")],
        );
        forest.insert_children(BlockId::new("a").unwrap(), vec![fetched("a1", "a", "A1")]);

        let order: Vec<(usize, String)> = forest
            .depth_first()
            .into_iter()
            .map(|(depth, block)| (depth, block.block.plain_text()))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, "A".to_string()),
                (1, "A1".to_string()),
                (0, "B".to_string())
            ]
        );
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn test_self_referencing_children_do_not_loop() {
        let root = BlockId::new("doc").unwrap();
        let mut forest = BlockForest::new(root.clone());
        forest.insert_children(root, vec![fetched("a", "doc", "A")]);
        forest.insert_children(BlockId::new("a").unwrap(), vec![fetched("a", "a", "A")]);
        assert_eq!(forest.depth_first().len(), 1);
    }
}
