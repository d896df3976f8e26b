use std::collections::{HashSet, VecDeque};

use generational_arena::{Arena, Index};
use tracing::{instrument, warn};

use crate::domain::{CodeEntry, CodeId};

/// Tree node in the arena-based subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeNode {
    pub entry: CodeEntry,
    /// Index of parent node in the arena, None for the subtree root
    pub parent: Option<Index>,
    /// Indices of child nodes, ordered by (sequence, id)
    pub children: Vec<Index>,
}

/// A code entry together with its live descendants.
///
/// Nodes live in a generational arena and refer to each other by index, so the
/// subtree carries no ownership cycles.
#[derive(Debug, Clone)]
pub struct CodeTree {
    arena: Arena<CodeNode>,
    root: Index,
}

impl CodeTree {
    /// Materialise the subtree below `root`.
    ///
    /// `children_of` returns the direct children of an entry. Entries already
    /// seen are skipped, so malformed parent links cannot make this loop.
    pub fn build<F>(root: CodeEntry, mut children_of: F) -> Self
    where
        F: FnMut(CodeId) -> Vec<CodeEntry>,
    {
        let mut arena = Arena::new();
        let root_id = root.id;
        let root_idx = arena.insert(CodeNode {
            entry: root,
            parent: None,
            children: Vec::new(),
        });

        let mut seen = HashSet::from([root_id]);
        let mut queue = VecDeque::from([(root_idx, root_id)]);

        while let Some((parent_idx, parent_id)) = queue.pop_front() {
            let mut children = children_of(parent_id);
            children.sort_by_key(|c| (c.sequence, c.id));
            for child in children {
                if !seen.insert(child.id) {
                    warn!("skipping #{} below #{}: already in subtree", child.id, parent_id);
                    continue;
                }
                let child_id = child.id;
                let child_idx = arena.insert(CodeNode {
                    entry: child,
                    parent: Some(parent_idx),
                    children: Vec::new(),
                });
                if let Some(parent) = arena.get_mut(parent_idx) {
                    parent.children.push(child_idx);
                }
                queue.push_back((child_idx, child_id));
            }
        }

        Self {
            arena,
            root: root_idx,
        }
    }

    /// Subtree consisting of the entry alone.
    pub fn leaf(entry: CodeEntry) -> Self {
        Self::build(entry, |_| Vec::new())
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_entry(&self) -> &CodeEntry {
        // The root index is inserted at construction and nodes are never removed.
        &self.arena[self.root].entry
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&CodeNode> {
        self.arena.get(idx)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Direct children of the subtree root.
    pub fn children(&self) -> Vec<&CodeEntry> {
        self.arena[self.root]
            .children
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .map(|node| &node.entry)
            .collect()
    }

    /// Pre-order traversal, children in sequence order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn find(&self, code: &str) -> Option<&CodeEntry> {
        self.iter()
            .map(|(_, node)| &node.entry)
            .find(|entry| entry.code == code)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Codes of all entries without children.
    pub fn leaf_codes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.entry.code.clone())
            .collect()
    }

    /// Render for terminal display.
    pub fn to_termtree(&self) -> termtree::Tree<String> {
        self.render(self.root)
    }

    fn render(&self, idx: Index) -> termtree::Tree<String> {
        let node = &self.arena[idx];
        termtree::Tree::new(node.entry.to_string())
            .with_leaves(node.children.iter().map(|&child| self.render(child)))
    }
}

pub struct TreeIterator<'a> {
    tree: &'a CodeTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a CodeTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a CodeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
