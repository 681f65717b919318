use blocknote::dict::{from_dict, to_dict};
use blocknote::error::Error;
use blocknote::schema::{BlockType, Style};
use blocknote::value::value;

#[test]
fn test_roundtrip_full_records() {
    let data = value!([
        {
            "id": "h",
            "type": "heading",
            "props": {"level": 2, "textAlignment": "center"},
            "content": [{"type": "text", "text": "Title", "styles": {}}],
            "children": []
        },
        {
            "id": "l",
            "type": "bulletListItem",
            "props": {},
            "content": [],
            "children": [
                {
                    "id": "c1",
                    "type": "paragraph",
                    "props": {},
                    "content": [{"type": "text", "text": "x", "styles": {"bold": true, "shadow": "soft"}}],
                    "children": []
                }
            ]
        },
        {
            "id": "t",
            "type": "table",
            "props": {},
            "content": {"type": "tableContent", "rows": [{"cells": ["a", "b"]}]},
            "children": []
        }
    ]);

    let blocks = from_dict(&data).unwrap();
    assert_eq!(blocks[0].heading_level(), 2);
    assert_eq!(blocks[1].children()[0].block_type(), BlockType::Paragraph);
    let styles = &blocks[1].children()[0].inline_content()[0].styles;
    assert!(styles.is_set(Style::Bold));
    assert_eq!(styles.get("shadow"), Some(&value!("soft")));
    assert_eq!(blocks[2].block_type(), BlockType::Table);

    assert_eq!(to_dict(&blocks), data);
}

#[test]
fn test_content_is_normalized() {
    let blocks = from_dict(&value!([
        {"id": "a", "type": "quote", "content": "Quoted"},
        {"id": "b", "type": "checkListItem", "props": {"checked": true}, "content": ["x", {"text": "y"}]}
    ]))
    .unwrap();
    assert_eq!(
        to_dict(&blocks),
        value!([
            {
                "id": "a",
                "type": "quote",
                "props": {},
                "content": [{"type": "text", "text": "Quoted", "styles": {}}],
                "children": []
            },
            {
                "id": "b",
                "type": "checkListItem",
                "props": {"checked": true},
                "content": [
                    {"type": "text", "text": "x", "styles": {}},
                    {"type": "text", "text": "y", "styles": {}}
                ],
                "children": []
            }
        ])
    );
}

#[test]
fn test_invalid_records() {
    let err = from_dict(&value!([{"id": "a", "type": "paragraph", "content": 42}])).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid block at [0]: content for paragraph must be a string or a list of inline content, got number"
    );

    let err = from_dict(&value!([
        {"id": "a", "type": "paragraph", "content": [{"type": "link", "text": "x"}]}
    ]))
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = from_dict(&value!("not a list")).unwrap_err();
    assert!(matches!(err, Error::Type { .. }));
}

#[test]
fn test_empty_document() {
    assert!(from_dict(&value!([])).unwrap().is_empty());
    assert_eq!(to_dict(&[]), value!([]));
}
