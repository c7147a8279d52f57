//! Reader for the parsed Source AST.
//!
//! The parser is an external collaborator; its output arrives as the
//! mainstream `type`-tagged JSON shape. This layer wraps `serde_json::Value`
//! with typed accessors and normalises the minor spelling variants between
//! parser families (`Literal` vs `NumericLiteral`/`StringLiteral`/...), so
//! the lowerer matches on one canonical kind set.

use crate::il::Span;
use serde_json::Value;

/// A borrowed view of one Source AST node.
#[derive(Debug, Clone, Copy)]
pub struct SourceNode<'a> {
    value: &'a Value,
}

impl<'a> SourceNode<'a> {
    /// Wrap a JSON value; `None` unless it is an object carrying a `type`.
    pub fn from_value(value: &'a Value) -> Option<SourceNode<'a>> {
        match value.get("type") {
            Some(Value::String(_)) => Some(SourceNode { value }),
            _ => None,
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The parser's own `type` tag, unnormalised.
    pub fn raw_kind(&self) -> &'a str {
        self.value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The canonical node kind. Per-literal tags collapse onto `Literal`;
    /// property spellings (`ClassProperty`) collapse onto their ESTree names.
    pub fn kind(&self) -> &'a str {
        match self.raw_kind() {
            "NumericLiteral" | "StringLiteral" | "BooleanLiteral" | "NullLiteral"
            | "RegExpLiteral" | "BigIntLiteral" => "Literal",
            "ClassProperty" => "PropertyDefinition",
            "ObjectProperty" => "Property",
            other => other,
        }
    }

    /// A single child node field (e.g. `callee`, `body`).
    pub fn child(&self, field: &str) -> Option<SourceNode<'a>> {
        self.value.get(field).and_then(SourceNode::from_value)
    }

    /// An array-valued field as nodes; non-node entries (array holes) are
    /// skipped.
    pub fn children(&self, field: &str) -> Vec<SourceNode<'a>> {
        match self.value.get(field) {
            Some(Value::Array(items)) => {
                items.iter().filter_map(SourceNode::from_value).collect()
            }
            _ => Vec::new(),
        }
    }

    /// An array-valued field preserving holes (`null` elements).
    pub fn children_with_holes(&self, field: &str) -> Vec<Option<SourceNode<'a>>> {
        match self.value.get(field) {
            Some(Value::Array(items)) => items.iter().map(SourceNode::from_value).collect(),
            _ => Vec::new(),
        }
    }

    pub fn str_field(&self, field: &str) -> Option<&'a str> {
        self.value.get(field).and_then(Value::as_str)
    }

    pub fn bool_field(&self, field: &str) -> bool {
        self.value
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn f64_field(&self, field: &str) -> Option<f64> {
        self.value.get(field).and_then(Value::as_f64)
    }

    /// Does the field exist and hold a non-null value?
    pub fn has(&self, field: &str) -> bool {
        matches!(self.value.get(field), Some(v) if !v.is_null())
    }

    /// The identifier name, for `Identifier` / `PrivateName` nodes.
    pub fn name(&self) -> Option<&'a str> {
        match self.raw_kind() {
            "PrivateName" => self.child("id").and_then(|id| id.name()),
            _ => self.str_field("name"),
        }
    }

    /// Source location, when the parser attached one.
    pub fn span(&self) -> Option<Span> {
        let start = self.value.get("loc")?.get("start")?;
        let line = start.get("line")?.as_u64()? as u32;
        let col = start.get("column")?.as_u64()? as u32;
        Some(Span::new(line, col))
    }

    /// The raw `value` of a literal node.
    pub fn literal_value(&self) -> Option<&'a Value> {
        self.value.get("value")
    }

    /// The big-int digits of a literal, across parser families: Babel keeps
    /// them in `value`, ESPrima-likes in `bigint`.
    pub fn bigint_digits(&self) -> Option<&'a str> {
        if self.raw_kind() == "BigIntLiteral" {
            return self.str_field("value").or_else(|| self.str_field("bigint"));
        }
        self.str_field("bigint")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_normalises_literal_spellings() {
        let espree = json!({"type": "Literal", "value": 7});
        let babel = json!({"type": "NumericLiteral", "value": 7});
        assert_eq!(SourceNode::from_value(&espree).unwrap().kind(), "Literal");
        assert_eq!(SourceNode::from_value(&babel).unwrap().kind(), "Literal");
        assert_eq!(
            SourceNode::from_value(&babel).unwrap().raw_kind(),
            "NumericLiteral"
        );
    }

    #[test]
    fn test_non_node_values_are_rejected() {
        let not_a_node = json!({"value": 1});
        assert!(SourceNode::from_value(&not_a_node).is_none());
        assert!(SourceNode::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_children_skip_holes_unless_asked() {
        let arr = json!({
            "type": "ArrayExpression",
            "elements": [{"type": "Literal", "value": 1}, null, {"type": "Literal", "value": 3}]
        });
        let node = SourceNode::from_value(&arr).unwrap();
        assert_eq!(node.children("elements").len(), 2);
        let with_holes = node.children_with_holes("elements");
        assert_eq!(with_holes.len(), 3);
        assert!(with_holes[1].is_none());
    }

    #[test]
    fn test_span_reads_loc() {
        let ident = json!({
            "type": "Identifier",
            "name": "x",
            "loc": {"start": {"line": 12, "column": 4}, "end": {"line": 12, "column": 5}}
        });
        let node = SourceNode::from_value(&ident).unwrap();
        assert_eq!(node.span(), Some(Span::new(12, 4)));
        assert_eq!(node.name(), Some("x"));
    }

    #[test]
    fn test_bigint_digits_both_spellings() {
        let babel = json!({"type": "BigIntLiteral", "value": "255"});
        let espree = json!({"type": "Literal", "bigint": "255", "value": null});
        assert_eq!(
            SourceNode::from_value(&babel).unwrap().bigint_digits(),
            Some("255")
        );
        assert_eq!(
            SourceNode::from_value(&espree).unwrap().bigint_digits(),
            Some("255")
        );
    }
}
