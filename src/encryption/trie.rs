//! Path trie over declared encrypted fields
//!
//! Each declared path is inserted segment by segment. A node either holds a
//! declared field (leaf) or has children, never both. Overlapping
//! declarations are rejected:
//! - the same path declared twice
//! - one path a strict prefix of another ("a.b" and "a.b.c")
//!
//! Paths are inserted in sorted segment order, so the verdict and the
//! reported pair do not depend on declaration order.

use std::collections::BTreeMap;

use super::errors::{CompileError, CompileResult};
use super::types::EncryptedField;

/// One segment position in the trie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTrieNode {
    children: BTreeMap<String, PathTrieNode>,
    leaf: Option<EncryptedField>,
}

impl PathTrieNode {
    /// The declared field ending at this node, if any
    pub fn leaf(&self) -> Option<&EncryptedField> {
        self.leaf.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    /// Children in segment order
    pub fn children(&self) -> impl Iterator<Item = (&str, &PathTrieNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn child(&self, segment: &str) -> Option<&PathTrieNode> {
        self.children.get(segment)
    }

    /// First declared path at or below this node, in segment order
    fn first_leaf_path(&self) -> Option<&str> {
        if let Some(field) = &self.leaf {
            return Some(&field.path);
        }
        self.children.values().find_map(PathTrieNode::first_leaf_path)
    }

    fn leaf_count(&self) -> usize {
        usize::from(self.is_leaf()) + self.children.values().map(PathTrieNode::leaf_count).sum::<usize>()
    }
}

/// Trie of declared encrypted paths. The root itself is never a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTrie {
    root: PathTrieNode,
}

impl PathTrie {
    /// Builds the trie, failing on the first overlapping pair.
    pub fn build(fields: &[EncryptedField]) -> CompileResult<Self> {
        let mut ordered: Vec<(Vec<&str>, &EncryptedField)> =
            fields.iter().map(|f| (f.segments().collect(), f)).collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let mut trie = PathTrie::default();
        for (segments, field) in ordered {
            trie.insert(&segments, field)?;
        }
        Ok(trie)
    }

    fn insert(&mut self, segments: &[&str], field: &EncryptedField) -> CompileResult<()> {
        let mut node = &mut self.root;

        for segment in segments {
            if let Some(existing) = &node.leaf {
                // Extending a path through a declared leaf
                return Err(CompileError::conflict(existing.path.clone(), field.path.clone()));
            }
            node = node.children.entry((*segment).to_string()).or_default();
        }

        if let Some(existing) = &node.leaf {
            return Err(CompileError::conflict(existing.path.clone(), field.path.clone()));
        }
        if let Some(existing) = node.first_leaf_path() {
            // Placing a leaf above already declared paths
            return Err(CompileError::conflict(existing.to_string(), field.path.clone()));
        }

        node.leaf = Some(field.clone());
        Ok(())
    }

    pub fn root(&self) -> &PathTrieNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Number of declared fields held
    pub fn len(&self) -> usize {
        self.root.leaf_count()
    }
}
