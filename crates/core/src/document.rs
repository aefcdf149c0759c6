//! In-memory word-processing document.
//!
//! Blocks are appended in reading order; [`crate::ooxml`] turns the finished
//! document into a package. Keeping the model separate from the package format
//! lets the structure of a rendered proposal be inspected directly.

use std::fmt;

use crate::template::{style_ids, Alignment, StyleSheet};

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Image(Image),
    TableOfContents { placeholder: String },
    PageBreak,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub style: Option<String>,
    pub text: String,
    pub alignment: Option<Alignment>,
}

impl Paragraph {
    /// `0` for the title style, `n` for `Heading{n}`.
    pub fn heading_level(&self) -> Option<u8> {
        let style = self.style.as_deref()?;
        if style == style_ids::TITLE {
            return Some(0);
        }
        style.strip_prefix("Heading").and_then(|level| level.parse().ok())
    }

    pub fn is_bullet(&self) -> bool {
        self.style.as_deref() == Some(style_ids::LIST_BULLET)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub style: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

#[derive(Clone, PartialEq)]
pub struct Image {
    pub description: String,
    pub extension: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub width_emu: u64,
    pub height_emu: u64,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("description", &self.description)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .field("width_emu", &self.width_emu)
            .field("height_emu", &self.height_emu)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    styles: StyleSheet,
    title: String,
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(styles: StyleSheet) -> Self {
        Self { styles, title: String::new(), blocks: Vec::new() }
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn add_paragraph(&mut self, text: impl Into<String>, style: Option<&str>) {
        self.push_paragraph(text.into(), style.map(str::to_string), None);
    }

    pub fn add_centered(&mut self, text: impl Into<String>, style: Option<&str>) {
        self.push_paragraph(text.into(), style.map(str::to_string), Some(Alignment::Center));
    }

    /// Level `0` uses the title style.
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) {
        let style = if level == 0 { style_ids::TITLE.to_string() } else { style_ids::heading(level) };
        self.push_paragraph(text.into(), Some(style), None);
    }

    pub fn add_bullet(&mut self, text: impl Into<String>) {
        self.push_paragraph(text.into(), Some(style_ids::LIST_BULLET.to_string()), None);
    }

    /// Rows are padded or truncated to the header width.
    pub fn add_table(&mut self, style: &str, header: &[&str], rows: Vec<Vec<String>>) {
        let columns = header.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(columns, String::new());
                row
            })
            .collect();
        self.blocks.push(Block::Table(Table {
            style: style.to_string(),
            header: header.iter().map(|cell| cell.to_string()).collect(),
            rows,
        }));
    }

    pub fn add_image(&mut self, image: Image) {
        self.blocks.push(Block::Image(image));
    }

    pub fn add_table_of_contents(&mut self, placeholder: impl Into<String>) {
        self.blocks.push(Block::TableOfContents { placeholder: placeholder.into() });
    }

    pub fn add_page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    pub fn page_count(&self) -> usize {
        1 + self.blocks.iter().filter(|block| matches!(block, Block::PageBreak)).count()
    }

    pub fn headings(&self) -> Vec<(u8, &str)> {
        self.paragraphs()
            .filter_map(|paragraph| {
                paragraph.heading_level().map(|level| (level, paragraph.text.as_str()))
            })
            .collect()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        })
    }

    pub fn tables(&self) -> Vec<&Table> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<&Image> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Image(image) => Some(image),
                _ => None,
            })
            .collect()
    }

    /// Bullet texts appearing under the heading with the given text, up to the next heading.
    pub fn bullets_under(&self, heading: &str) -> Vec<&str> {
        let mut inside = false;
        let mut bullets = Vec::new();
        for paragraph in self.paragraphs() {
            if paragraph.heading_level().is_some() {
                inside = paragraph.text == heading;
                continue;
            }
            if inside && paragraph.is_bullet() {
                bullets.push(paragraph.text.as_str());
            }
        }
        bullets
    }

    fn push_paragraph(&mut self, text: String, style: Option<String>, alignment: Option<Alignment>) {
        self.blocks.push(Block::Paragraph(Paragraph { style, text, alignment }));
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, Document};
    use crate::template::StyleSheet;

    #[test]
    fn page_count_grows_with_page_breaks() {
        let mut document = Document::new(StyleSheet::base());
        assert_eq!(document.page_count(), 1);

        document.add_heading("Executive Summary", 1);
        document.add_page_break();
        document.add_heading("Customer Requirements", 1);
        document.add_page_break();

        assert_eq!(document.page_count(), 3);
    }

    #[test]
    fn table_rows_are_normalized_to_header_width() {
        let mut document = Document::new(StyleSheet::base());
        document.add_table(
            "TableGrid",
            &["Task", "Effort (days)"],
            vec![vec!["Design".to_string()], vec!["a".into(), "b".into(), "c".into()]],
        );

        let tables = document.tables();
        assert_eq!(tables[0].rows[0], vec!["Design".to_string(), String::new()]);
        assert_eq!(tables[0].rows[1].len(), 2);
    }

    #[test]
    fn headings_report_levels_in_order() {
        let mut document = Document::new(StyleSheet::base());
        document.add_heading("Proposal", 0);
        document.add_paragraph("body", None);
        document.add_heading("Project Scope", 1);
        document.add_heading("In Scope", 2);

        assert_eq!(
            document.headings(),
            vec![(0, "Proposal"), (1, "Project Scope"), (2, "In Scope")]
        );
        assert!(matches!(document.blocks()[1], Block::Paragraph(ref p) if p.style.is_none()));
    }

    #[test]
    fn bullets_under_stops_at_next_heading() {
        let mut document = Document::new(StyleSheet::base());
        document.add_heading("Risks", 2);
        document.add_bullet("Vendor delay");
        document.add_heading("Assumptions", 2);
        document.add_bullet("Access granted");

        assert_eq!(document.bullets_under("Risks"), vec!["Vendor delay"]);
        assert_eq!(document.bullets_under("Assumptions"), vec!["Access granted"]);
        assert!(document.bullets_under("Issues").is_empty());
    }
}
