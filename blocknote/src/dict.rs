//! Converts between blocks and plain nested data.
//!
//! The dict form is what gets stored or sent over an API: a list of records
//! with `id`, `type`, `props`, `content` and `children` keys.  Encoding is a
//! structural mirror of the block tree, decoding validates every record.
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::{Error, IndexPath, ValidationError, ValidationErrorKind};
use crate::schema::{value_kind, Block, BlockType, Props};
use crate::value::{Map, Value};

/// Decodes a list of block records.
pub fn from_dict(data: &Value) -> Result<Vec<Block>, Error> {
    let records = match data {
        Value::Array(records) => records,
        other => {
            return Err(Error::Type {
                expected: "a list of block records",
                found: value_kind(other).to_string(),
            })
        }
    };

    let blocks = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            if !record.is_object() {
                return Err(Error::Type {
                    expected: "a mapping",
                    found: format!("{} at index {}", value_kind(record), index),
                });
            }
            Ok(block_from_record(record, IndexPath::root(index))?)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    tracing::debug!(blocks = blocks.len(), "decoded dict document");
    Ok(blocks)
}

/// Encodes blocks into a list of records.
pub fn to_dict(blocks: &[Block]) -> Value {
    Value::Array(blocks.iter().map(block_to_record).collect())
}

fn block_from_record(record: &Value, path: IndexPath) -> Result<Block, ValidationError> {
    let fail = |kind: ValidationErrorKind| ValidationError {
        path: path.clone(),
        kind,
    };
    let record = match record.as_object() {
        Some(record) => record,
        None => {
            return Err(fail(ValidationErrorKind::WrongShape {
                key: "children",
                expected: "a list of mappings",
                found: value_kind(record),
            }))
        }
    };

    let id = match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => {
            return Err(fail(ValidationErrorKind::WrongShape {
                key: "id",
                expected: "a string",
                found: value_kind(other),
            }))
        }
        None => return Err(fail(ValidationErrorKind::MissingKey("id"))),
    };

    let block_type: BlockType = match record.get("type") {
        Some(Value::String(name)) => name
            .parse()
            .map_err(|_| fail(ValidationErrorKind::InvalidBlockType(name.clone())))?,
        Some(other) => {
            return Err(fail(ValidationErrorKind::InvalidBlockType(
                other.to_string(),
            )))
        }
        None => return Err(fail(ValidationErrorKind::MissingKey("type"))),
    };

    let block =
        Block::build(id, block_type, record.get("content")).map_err(|err| fail(err.into()))?;

    let props = match record.get("props") {
        None => Props::new(),
        Some(Value::Object(props)) => props.clone(),
        Some(other) => {
            return Err(fail(ValidationErrorKind::WrongShape {
                key: "props",
                expected: "a mapping",
                found: value_kind(other),
            }))
        }
    };

    let children = match record.get("children") {
        None => Vec::new(),
        Some(Value::Array(children)) => children
            .iter()
            .enumerate()
            .map(|(index, child)| block_from_record(child, path.child(index)))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(fail(ValidationErrorKind::WrongShape {
                key: "children",
                expected: "a list",
                found: value_kind(other),
            }))
        }
    };

    Ok(block.with_props(props).with_children(children))
}

fn block_to_record(block: &Block) -> Value {
    let mut record = Map::new();
    record.insert("id".into(), block.id().into());
    record.insert("type".into(), block.block_type().as_str().into());
    record.insert("props".into(), Value::Object(block.props().clone()));
    record.insert("content".into(), block.content().to_value());
    record.insert(
        "children".into(),
        Value::Array(block.children().iter().map(block_to_record).collect()),
    );
    Value::Object(record)
}

/// Formats a validation error without the top-level index.
///
/// A single deserialized block does not know its position in the document.
fn relative_message(err: &ValidationError) -> String {
    let nested = err.path.indices().get(1..).unwrap_or_default();
    if nested.is_empty() {
        return format!("invalid block: {}", err.kind);
    }
    let path: Vec<_> = nested
        .iter()
        .map(|index| format!("children[{}]", index))
        .collect();
    format!("invalid block at {}: {}", path.join("."), err.kind)
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        block_to_record(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = Value::deserialize(deserializer)?;
        block_from_record(&record, IndexPath::root(0))
            .map_err(|err| de::Error::custom(relative_message(&err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Content, InlineContent, Style, Styles};
    use crate::value::value;

    fn validation_kind(err: Error) -> ValidationErrorKind {
        match err {
            Error::Validation(err) => err.kind,
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_keys() {
        let err = from_dict(&value!([{"type": "paragraph"}])).unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::MissingKey("id"));

        let err = from_dict(&value!([{"id": "1"}])).unwrap_err();
        assert_eq!(validation_kind(err), ValidationErrorKind::MissingKey("type"));
    }

    #[test]
    fn test_invalid_block_type() {
        let err = from_dict(&value!([{"id": "1", "type": "bogus"}])).unwrap_err();
        assert_eq!(err.to_string(), "invalid block at [0]: invalid block type `bogus`");
    }

    #[test]
    fn test_nested_errors_carry_path() {
        let err = from_dict(&value!([
            {"id": "1", "type": "paragraph"},
            {"id": "2", "type": "bulletListItem", "children": [
                {"id": "3", "type": "paragraph"},
                {"id": "4", "type": "paragraph", "props": []}
            ]}
        ]))
        .unwrap_err();
        match err {
            Error::Validation(err) => {
                assert_eq!(err.path.indices(), &[1, 1]);
                assert_eq!(err.path.to_string(), "[1].children[1]");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_wrong_top_level_shape() {
        assert!(matches!(
            from_dict(&value!({"id": "1"})),
            Err(Error::Type { .. })
        ));
        assert!(matches!(from_dict(&value!(["nope"])), Err(Error::Type { .. })));
    }

    #[test]
    fn test_defaults() {
        let blocks = from_dict(&value!([{"id": "1", "type": "paragraph", "content": "Hi"}])).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].props().is_empty());
        assert!(blocks[0].children().is_empty());
        assert_eq!(
            blocks[0].content(),
            &Content::Inline(vec![InlineContent::text("Hi")])
        );
    }

    #[test]
    fn test_encode_shape() {
        let block = Block::new("1", BlockType::Paragraph).with_inline(vec![InlineContent::styled(
            "Hello",
            Styles::new().with(Style::Bold),
        )]);
        assert_eq!(
            to_dict(&[block]),
            value!([{
                "id": "1",
                "type": "paragraph",
                "props": {},
                "content": [{"type": "text", "text": "Hello", "styles": {"bold": true}}],
                "children": []
            }])
        );
    }

    #[test]
    fn test_content_is_checked_before_children() {
        let err = from_dict(&value!([{"id": "1", "type": "paragraph", "content": 42, "children": [
            {"id": "2", "type": "bogus"}
        ]}]))
        .unwrap_err();
        match err {
            Error::Validation(err) => {
                assert_eq!(err.path.indices(), &[0]);
                assert!(matches!(err.kind, ValidationErrorKind::Schema(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_serde_errors_do_not_invent_an_index() {
        let err = serde_json::from_str::<Vec<Block>>(
            r#"[{"id": "a", "type": "paragraph"}, {"id": "b", "type": "bogus"}]"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("invalid block: invalid block type `bogus`"));
        assert!(!msg.contains("[0]"));

        let err = serde_json::from_str::<Block>(
            r#"{"id": "a", "type": "quote", "children": [{"id": "b"}, {"type": "quote"}]}"#,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("invalid block at children[0]: missing required key `type`"));
    }

    #[test]
    fn test_serde_uses_wire_form() {
        let blocks: Vec<Block> = serde_json::from_str(
            r#"[{"id": "a", "type": "heading", "props": {"level": 2}, "content": "Title"}]"#,
        )
        .unwrap();
        assert_eq!(blocks[0].heading_level(), 2);
        assert_eq!(serde_json::to_value(&blocks).unwrap(), to_dict(&blocks));
    }
}
