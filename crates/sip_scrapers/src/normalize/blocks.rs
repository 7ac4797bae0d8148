use std::collections::HashSet;

use ego_tree::NodeId;
use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};

use super::inline::InlineFormatter;
use super::normalize_whitespace;
use crate::scrapers::utils::element_text;

lazy_static! {
    static ref LIST_ITEM: Selector = Selector::parse("li").unwrap();
    static ref TABLE_ROW: Selector = Selector::parse("tr").unwrap();
}

/// Paragraphs this short are layout noise.
const MIN_PARAGRAPH_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Heading,
    Paragraph,
    List,
    Table,
    Break,
}

impl BlockKind {
    fn classify(tag: &str) -> Option<Self> {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(BlockKind::Heading),
            "p" => Some(BlockKind::Paragraph),
            "ul" | "ol" => Some(BlockKind::List),
            "table" => Some(BlockKind::Table),
            "br" => Some(BlockKind::Break),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Block<'a> {
    kind: BlockKind,
    element: ElementRef<'a>,
}

/// Turns a content root into normalized text: headings as `**heading**`
/// lines, paragraphs separated by blank lines, list items as `• ` bullets
/// and table rows as ` | ` separated cells.
#[derive(Debug, Clone)]
pub struct Linearizer {
    inline: InlineFormatter,
}

impl Linearizer {
    pub fn new(inline: InlineFormatter) -> Self {
        Self { inline }
    }

    pub fn linearize(&self, root: ElementRef) -> String {
        let mut out = String::new();
        for block in schedule(root) {
            self.render(block, &mut out);
        }
        normalize_whitespace(&out)
    }

    fn render(&self, block: Block, out: &mut String) {
        match block.kind {
            BlockKind::Heading => {
                let text = element_text(block.element);
                if !text.is_empty() && !self.inline.rules().is_boilerplate(&text) {
                    out.push_str(&format!("\n**{}**\n", text));
                }
            }
            BlockKind::Paragraph => {
                let text = self.inline.format(block.element);
                if text.chars().count() > MIN_PARAGRAPH_CHARS {
                    out.push_str(&text);
                    out.push_str("\n\n");
                }
            }
            BlockKind::List => {
                for item in block.element.select(&LIST_ITEM) {
                    let text = self.inline.format(item);
                    if !text.is_empty() {
                        out.push_str(&format!("• {}\n", text));
                    }
                }
                out.push('\n');
            }
            BlockKind::Table => {
                let rows = table_rows(block.element);
                if !rows.is_empty() {
                    out.push_str(&format!("\n{}\n\n", rows.join("\n")));
                }
            }
            BlockKind::Break => out.push('\n'),
        }
    }
}

/// Flat, document-ordered list of the top-level blocks under `root`.
/// Anything inside an already scheduled block is consumed with it; other
/// wrappers such as `div` or `section` are transparent.
fn schedule(root: ElementRef) -> Vec<Block> {
    let mut consumed: HashSet<NodeId> = HashSet::new();
    let mut blocks = Vec::new();

    for node in root.descendants().skip(1) {
        let inside_block = node
            .parent()
            .map_or(false, |parent| consumed.contains(&parent.id()));
        if inside_block {
            consumed.insert(node.id());
            continue;
        }
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if let Some(kind) = BlockKind::classify(element.value().name()) {
            consumed.insert(node.id());
            blocks.push(Block { kind, element });
        }
    }
    blocks
}

/// Rows that belong to `table` itself, not to a table nested in a cell.
fn table_rows(table: ElementRef) -> Vec<String> {
    table
        .select(&TABLE_ROW)
        .filter(|row| nearest_table(*row) == Some(table.id()))
        .filter_map(|row| {
            let cells: Vec<String> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(element_text)
                .collect();
            (!cells.is_empty()).then(|| cells.join(" | "))
        })
        .collect()
}

fn nearest_table(row: ElementRef) -> Option<NodeId> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
        .map(|table| table.id())
}
