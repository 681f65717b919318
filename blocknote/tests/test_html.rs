use std::collections::HashSet;

use blocknote::html::{from_html, to_html};
use blocknote::schema::{Block, BlockType, InlineContent, Style, Styles};
use blocknote::value::Value;

#[test]
fn test_decode_heading_and_paragraph() {
    let blocks = from_html("<h1>Main Title</h1>\n<p>This is a paragraph.</p>").unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].block_type(), BlockType::Heading);
    assert_eq!(blocks[0].heading_level(), 1);
    assert_eq!(blocks[0].plain_text(), "Main Title");
    assert_eq!(blocks[1].block_type(), BlockType::Paragraph);
    assert_eq!(blocks[1].plain_text(), "This is a paragraph.");
}

#[test]
fn test_decode_styles() {
    let blocks = from_html("<p><strong>Bold text</strong> and <em>italic text</em></p>").unwrap();
    assert_eq!(
        blocks[0].inline_content(),
        &[
            InlineContent::styled("Bold text", Styles::new().with(Style::Bold)),
            InlineContent::text(" and "),
            InlineContent::styled("italic text", Styles::new().with(Style::Italic)),
        ]
    );
}

#[test]
fn test_decode_lists() {
    let blocks = from_html("<ol><li>one</li><li>two</li></ol><ul><li>three</li></ul>").unwrap();
    let types: Vec<_> = blocks.iter().map(|x| x.block_type()).collect();
    assert_eq!(
        types,
        vec![
            BlockType::NumberedListItem,
            BlockType::NumberedListItem,
            BlockType::BulletListItem
        ]
    );
    assert_eq!(blocks[1].plain_text(), "two");

    let blocks = from_html("<li>stray</li>").unwrap();
    assert_eq!(blocks[0].block_type(), BlockType::BulletListItem);
}

#[test]
fn test_decode_generic_blocks() {
    let blocks = from_html(
        "<div class=\"blocknote-toggleListItem\">toggle</div><div>plain</div><span>dropped</span>",
    )
    .unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].block_type(), BlockType::ToggleListItem);
    assert_eq!(blocks[1].block_type(), BlockType::Paragraph);
    assert_eq!(blocks[1].plain_text(), "plain");
}

#[test]
fn test_decode_is_lenient() {
    assert!(from_html("").unwrap().is_empty());
    assert!(from_html("  \n ").unwrap().is_empty());
    let blocks = from_html("<p>never closed <b>bold</p></b><p>next</p>").unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].plain_text(), "next");
    assert!(blocks[1].inline_content()[0].styles.is_empty());
}

#[test]
fn test_mismatched_block_end_finishes_block() {
    let blocks = from_html("<h1>Title</h2><p>next</p>").unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].block_type(), BlockType::Heading);
    assert_eq!(blocks[0].plain_text(), "Title");
    assert_eq!(blocks[1].plain_text(), "next");

    let blocks = from_html("<p>Hello</div>").unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].block_type(), BlockType::Paragraph);
    assert_eq!(blocks[0].plain_text(), "Hello");
}

#[test]
fn test_decoded_ids_are_unique() {
    let blocks = from_html("<p>a</p><p>b</p><h2>c</h2><blockquote>d</blockquote>").unwrap();
    let ids: HashSet<_> = blocks.iter().map(|x| x.id()).collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.iter().all(|id| !id.is_empty()));
}

#[test]
fn test_encode_basics() {
    let blocks = vec![
        Block::heading(2, "Title"),
        Block::new("p", BlockType::Paragraph).with_inline(vec![
            InlineContent::text("a < b & 'c' "),
            InlineContent::styled("x", Styles::new().with(Style::Bold).with(Style::Code)),
        ]),
    ];
    insta::assert_snapshot!(to_html(&blocks).unwrap(), @r###"
    <h2>Title</h2>
    <p>a &lt; b &amp; &#x27;c&#x27; <code><strong>x</strong></code></p>
    "###);
}

#[test]
fn test_encode_clamps_heading_level() {
    for level in &[0, 7, 10, -1] {
        let html = to_html(&[Block::heading(*level, "x")]).unwrap();
        assert_eq!(html, "<h1>x</h1>");
    }
    let block = Block::new("h", BlockType::Heading)
        .with_prop("level", "3")
        .with_text("x");
    assert_eq!(to_html(&[block]).unwrap(), "<h1>x</h1>");
}

#[test]
fn test_encode_empty() {
    assert_eq!(to_html(&[]).unwrap(), "");
}

#[test]
fn test_encode_lists_and_tables() {
    let list = Block::new("l", BlockType::BulletListItem).with_children(vec![
        Block::paragraph("First"),
        Block::heading(1, "skipped"),
        Block::paragraph("Second"),
    ]);
    let single = Block::new("n", BlockType::NumberedListItem).with_text("Only");
    let table = Block::new("t", BlockType::Table).with_text("<cell>");
    insta::assert_snapshot!(to_html(&[list, single, table]).unwrap(), @r###"
    <ul><li>First</li><li>Second</li></ul>
    <ol><li>Only</li></ol>
    <div class='table-placeholder'>&lt;cell&gt;</div>
    "###);
}

#[test]
fn test_encode_colors() {
    let block = Block::new("p", BlockType::Paragraph).with_inline(vec![InlineContent::styled(
        "hot",
        Styles::new()
            .with(Style::Italic)
            .with_color(Style::TextColor, "red")
            .with_color(Style::BackgroundColor, "yellow"),
    )]);
    assert_eq!(
        to_html(&[block]).unwrap(),
        "<p><span style=\"color: red\"><span style=\"background-color: yellow\"><em>hot</em></span></span></p>"
    );
}

#[test]
fn test_roundtrip() {
    let blocks = vec![
        Block::heading(3, "Heading"),
        Block::new("p", BlockType::Paragraph).with_inline(vec![
            InlineContent::text("plain & 'quoted' "),
            InlineContent::styled(
                "colored",
                Styles::new()
                    .with(Style::Bold)
                    .with(Style::Underline)
                    .with_color(Style::TextColor, "#ff0000"),
            ),
        ]),
        Block::new("q", BlockType::Quote).with_text("A quote"),
        Block::new("c", BlockType::CheckListItem)
            .with_prop("checked", true)
            .with_text("done"),
        Block::new("u", BlockType::CheckListItem).with_text("todo"),
    ];

    let decoded = from_html(&to_html(&blocks).unwrap()).unwrap();
    assert_eq!(decoded.len(), blocks.len());
    for (before, after) in blocks.iter().zip(decoded.iter()) {
        assert_eq!(before.block_type(), after.block_type());
        assert_eq!(before.inline_content(), after.inline_content());
    }
    assert_eq!(decoded[0].props().get("level"), Some(&Value::from(3)));
    assert!(decoded[3].is_checked());
    assert_eq!(decoded[4].props().get("checked"), Some(&Value::Bool(false)));
}
