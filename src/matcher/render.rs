//! Rendering into the match-expression dialect
//!
//! Produces the JSON form the query layer stores as a collection's implicit
//! validator. Built purely from `PredicateNode::shape`, the same walk any
//! other host representation would use.

use serde_json::{json, Map, Value};

use super::expression::{FieldPredicate, FieldPredicateKind, NodeShape, PredicateNode};
use crate::encryption::BsonType;

/// Renders `node` as a match expression.
pub fn to_match_expression(node: &PredicateNode) -> Value {
    match node.shape() {
        NodeShape::AlwaysTrue => json!({"$alwaysTrue": 1}),
        NodeShape::And(children) => json!({"$and": render_all(children)}),
        NodeShape::Or(children) => json!({"$or": render_all(children)}),
        NodeShape::Not(inner) => match inner.shape() {
            NodeShape::Field(fp) => {
                let (path, op) = field_operator(&fp);
                field_expression(path, json!({"$not": op}))
            }
            _ => json!({"$nor": [to_match_expression(inner)]}),
        },
        NodeShape::Field(fp) => {
            let (path, op) = field_operator(&fp);
            field_expression(path, op)
        }
    }
}

fn render_all(children: &[PredicateNode]) -> Vec<Value> {
    children.iter().map(to_match_expression).collect()
}

fn field_expression(path: String, op: Value) -> Value {
    let mut obj = Map::new();
    obj.insert(path, op);
    Value::Object(obj)
}

fn schema_type(t: BsonType) -> Value {
    json!({"$_internalSchemaType": [t.code()]})
}

/// Operator document for a field predicate, keyed by its dotted path
fn field_operator(fp: &FieldPredicate<'_>) -> (String, Value) {
    let op = match fp.kind {
        FieldPredicateKind::NotExists => json!({"$not": {"$exists": true}}),
        FieldPredicateKind::EncryptedType => {
            let codes: Vec<i32> = fp.expected_type.iter().map(BsonType::code).collect();
            json!({"$_internalSchemaBinDataFLE2EncryptedType": codes})
        }
        FieldPredicateKind::IsObject => schema_type(BsonType::Object),
        FieldPredicateKind::IsNotArray => json!({"$not": schema_type(BsonType::Array)}),
        FieldPredicateKind::ObjectMatch => {
            let sub = fp
                .subtree
                .map_or_else(|| json!({"$alwaysTrue": 1}), to_match_expression);
            json!({"$_internalSchemaObjectMatch": sub})
        }
    };
    (fp.path.dotted(), op)
}
