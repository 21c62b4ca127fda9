//! Recipe text rendering
//!
//! Generated recipes come back as Markdown-flavoured text. This module
//! parses them into a small block structure (headings, paragraphs, lists)
//! with pulldown-cmark and formats those blocks for the terminal.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Serialize;

/// One structural piece of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    /// `start` is the first number of an ordered list, `None` for bullets
    List { start: Option<u64>, items: Vec<String> },
}

/// Collapse runs of whitespace into single spaces
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn flush_item(buffer: &mut String, items: &mut Vec<String>) {
    let item = normalize(buffer);
    if !item.is_empty() {
        items.push(item);
    }
    buffer.clear();
}

/// Parse recipe text into blocks. Nested lists are flattened into their
/// outermost list.
pub fn parse_recipe(text: &str) -> Vec<RecipeBlock> {
    let mut blocks = Vec::new();
    let mut buffer = String::new();
    let mut heading: Option<u8> = None;
    let mut list_start: Option<u64> = None;
    let mut list_items: Vec<String> = Vec::new();
    let mut list_depth = 0usize;

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some(level as u8);
                buffer.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(level) = heading.take() {
                    let text = normalize(&buffer);
                    if !text.is_empty() {
                        blocks.push(RecipeBlock::Heading { level, text });
                    }
                }
                buffer.clear();
            }
            Event::Start(Tag::Paragraph) if list_depth == 0 => buffer.clear(),
            Event::End(TagEnd::Paragraph) => {
                if list_depth == 0 {
                    let text = normalize(&buffer);
                    if !text.is_empty() {
                        blocks.push(RecipeBlock::Paragraph { text });
                    }
                    buffer.clear();
                } else {
                    buffer.push(' ');
                }
            }
            Event::Start(Tag::List(start)) => {
                if list_depth == 0 {
                    list_start = start;
                    list_items.clear();
                } else {
                    flush_item(&mut buffer, &mut list_items);
                }
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    flush_item(&mut buffer, &mut list_items);
                    if !list_items.is_empty() {
                        blocks.push(RecipeBlock::List {
                            start: list_start,
                            items: std::mem::take(&mut list_items),
                        });
                    }
                }
            }
            Event::Start(Tag::Item) | Event::End(TagEnd::Item) => {
                flush_item(&mut buffer, &mut list_items);
            }
            Event::Text(text) | Event::Code(text) => buffer.push_str(&text),
            Event::SoftBreak | Event::HardBreak => buffer.push(' '),
            _ => {}
        }
    }

    blocks
}

/// Plain-text rendering: underlined headings, numbered or dashed list items,
/// blank lines between blocks.
pub fn format_for_terminal(blocks: &[RecipeBlock]) -> String {
    let rendered: Vec<String> = blocks
        .iter()
        .map(|block| match block {
            RecipeBlock::Heading { level, text } => {
                let rule = if *level == 1 { '=' } else { '-' };
                let underline: String = std::iter::repeat(rule)
                    .take(text.chars().count())
                    .collect();
                format!("{}\n{}", text, underline)
            }
            RecipeBlock::Paragraph { text } => text.clone(),
            RecipeBlock::List { start, items } => items
                .iter()
                .enumerate()
                .map(|(i, item)| match start {
                    Some(first) => format!("{}. {}", first + i as u64, item),
                    None => format!("- {}", item),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect();

    rendered.join("\n\n")
}
