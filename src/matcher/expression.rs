//! Predicate tree
//!
//! A compiled encrypted-field schema is a tree of `PredicateNode`s. The tree
//! is immutable once built and carries no interior state, so a single tree
//! may be evaluated from any number of threads.

use std::fmt;

use crate::encryption::BsonType;

/// A dotted field path, resolved one segment at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits a dotted path into segments
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    /// A path of exactly one segment
    pub fn single(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the dotted form
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Boolean predicate over a document.
///
/// Field-keyed variants resolve their path against the document they are
/// evaluated on; inside an `ObjectMatch` subtree that is the matched
/// sub-object, not the root.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// Matches every document
    AlwaysTrue,
    /// All children match (empty = true)
    And(Vec<PredicateNode>),
    /// At least one child matches (empty = false)
    Or(Vec<PredicateNode>),
    /// Logical negation
    Not(Box<PredicateNode>),
    /// The path resolves to nothing (absent or null)
    NotExists(FieldPath),
    /// The path holds an encrypted payload of a stored FLE2 scheme whose
    /// original type is `expected`
    TypeCheck { path: FieldPath, expected: BsonType },
    /// The path holds an object (binaries excluded)
    IsObject(FieldPath),
    /// The path does not hold an array
    IsNotArray(FieldPath),
    /// The path holds an object and `subtree` matches it
    ObjectMatch {
        path: FieldPath,
        subtree: Box<PredicateNode>,
    },
}

/// Kind of a field-keyed predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPredicateKind {
    NotExists,
    EncryptedType,
    IsObject,
    IsNotArray,
    ObjectMatch,
}

/// Borrowed view of a field-keyed predicate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPredicate<'a> {
    pub kind: FieldPredicateKind,
    pub path: &'a FieldPath,
    /// Set for `EncryptedType`
    pub expected_type: Option<BsonType>,
    /// Set for `ObjectMatch`
    pub subtree: Option<&'a PredicateNode>,
}

/// Structural view of a node, for collaborators that render the tree into
/// their own expression syntax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeShape<'a> {
    AlwaysTrue,
    And(&'a [PredicateNode]),
    Or(&'a [PredicateNode]),
    Not(&'a PredicateNode),
    Field(FieldPredicate<'a>),
}

impl PredicateNode {
    pub fn not(inner: PredicateNode) -> Self {
        PredicateNode::Not(Box::new(inner))
    }

    pub fn type_check(path: FieldPath, expected: BsonType) -> Self {
        PredicateNode::TypeCheck { path, expected }
    }

    pub fn object_match(path: FieldPath, subtree: PredicateNode) -> Self {
        PredicateNode::ObjectMatch {
            path,
            subtree: Box::new(subtree),
        }
    }

    /// Returns the structural view of this node
    pub fn shape(&self) -> NodeShape<'_> {
        match self {
            PredicateNode::AlwaysTrue => NodeShape::AlwaysTrue,
            PredicateNode::And(children) => NodeShape::And(children),
            PredicateNode::Or(children) => NodeShape::Or(children),
            PredicateNode::Not(inner) => NodeShape::Not(&**inner),
            PredicateNode::NotExists(path) => plain_field(FieldPredicateKind::NotExists, path),
            PredicateNode::IsObject(path) => plain_field(FieldPredicateKind::IsObject, path),
            PredicateNode::IsNotArray(path) => plain_field(FieldPredicateKind::IsNotArray, path),
            PredicateNode::TypeCheck { path, expected } => NodeShape::Field(FieldPredicate {
                kind: FieldPredicateKind::EncryptedType,
                path,
                expected_type: Some(*expected),
                subtree: None,
            }),
            PredicateNode::ObjectMatch { path, subtree } => NodeShape::Field(FieldPredicate {
                kind: FieldPredicateKind::ObjectMatch,
                path,
                expected_type: None,
                subtree: Some(&**subtree),
            }),
        }
    }

    /// Number of nodes in this tree, including `self`
    pub fn node_count(&self) -> usize {
        match self.shape() {
            NodeShape::AlwaysTrue => 1,
            NodeShape::And(children) | NodeShape::Or(children) => {
                1 + children.iter().map(PredicateNode::node_count).sum::<usize>()
            }
            NodeShape::Not(inner) => 1 + inner.node_count(),
            NodeShape::Field(fp) => 1 + fp.subtree.map_or(0, PredicateNode::node_count),
        }
    }
}

fn plain_field(kind: FieldPredicateKind, path: &FieldPath) -> NodeShape<'_> {
    NodeShape::Field(FieldPredicate {
        kind,
        path,
        expected_type: None,
        subtree: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_parse() {
        let path = FieldPath::parse("a.b.c");
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "a.b.c");
        assert_eq!(FieldPath::single("x"), FieldPath::parse("x"));
    }

    #[test]
    fn test_shape_of_type_check() {
        let node = PredicateNode::type_check(FieldPath::single("ssn"), BsonType::String);
        match node.shape() {
            NodeShape::Field(fp) => {
                assert_eq!(fp.kind, FieldPredicateKind::EncryptedType);
                assert_eq!(fp.path.dotted(), "ssn");
                assert_eq!(fp.expected_type, Some(BsonType::String));
                assert!(fp.subtree.is_none());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_shape_of_object_match_exposes_subtree() {
        let node = PredicateNode::object_match(FieldPath::single("a"), PredicateNode::AlwaysTrue);
        match node.shape() {
            NodeShape::Field(fp) => {
                assert_eq!(fp.kind, FieldPredicateKind::ObjectMatch);
                assert_eq!(fp.subtree, Some(&PredicateNode::AlwaysTrue));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_node_count() {
        let node = PredicateNode::Or(vec![
            PredicateNode::NotExists(FieldPath::single("a")),
            PredicateNode::not(PredicateNode::IsObject(FieldPath::single("a"))),
            PredicateNode::object_match(FieldPath::single("a"), PredicateNode::And(vec![])),
        ]);
        assert_eq!(node.node_count(), 1 + 1 + 2 + 2);
    }
}
