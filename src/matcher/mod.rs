//! Document matching for encrypted-field predicates
//!
//! - `expression`: the immutable predicate tree and its structural view
//! - `evaluate`: pure, total evaluation against a JSON document
//! - `render`: the match-expression form consumed by the query layer

mod evaluate;
mod expression;
pub mod render;

pub use evaluate::{evaluate, is_encrypted_as, resolve, Resolved};
pub use expression::{FieldPath, FieldPredicate, FieldPredicateKind, NodeShape, PredicateNode};
pub use render::to_match_expression;
