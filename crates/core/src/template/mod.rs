//! Style templates for proposal documents.
//!
//! A [`Template`] is the set of named style definitions read from a `.docx`
//! style artifact or synthesized by [`builder::TemplateBuilder`], plus the
//! table style generated tables are assigned.
//! A [`StyleSheet`] is the style set of one output document.

pub mod builder;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::PackageError;
use crate::ooxml;

pub mod style_ids {
    pub const NORMAL: &str = "Normal";
    pub const TITLE: &str = "Title";
    pub const SUBTITLE: &str = "Subtitle";
    pub const LIST_BULLET: &str = "ListBullet";
    pub const TABLE_GRID: &str = "TableGrid";

    pub fn heading(level: u8) -> String {
        format!("Heading{level}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Character => "character",
            Self::Table => "table",
        }
    }

    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(Self::Paragraph),
            "character" => Some(Self::Character),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
        }
    }

    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "both" | "distribute" => Some(Self::Justify),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let value = value.trim().trim_start_matches('#');
        if value.len() != 6 || !value.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&value[range], 16).ok();
        Some(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// One named style. Sizes are kept in half-points and spacing in twentieths of a
/// point, the units the package format stores them in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    pub id: String,
    pub name: String,
    pub kind: StyleKind,
    pub based_on: Option<String>,
    pub next: Option<String>,
    pub is_default: bool,
    pub font: Option<String>,
    pub size_half_points: Option<u32>,
    pub bold: bool,
    pub color: Option<Rgb>,
    pub alignment: Option<Alignment>,
    pub space_before_twips: Option<u32>,
    pub space_after_twips: Option<u32>,
    pub outline_level: Option<u8>,
    pub bullet_list: bool,
    pub grid_borders: bool,
}

impl StyleDefinition {
    pub fn new(kind: StyleKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            based_on: None,
            next: None,
            is_default: false,
            font: None,
            size_half_points: None,
            bold: false,
            color: None,
            alignment: None,
            space_before_twips: None,
            space_after_twips: None,
            outline_level: None,
            bullet_list: false,
            grid_borders: false,
        }
    }

    pub fn paragraph(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(StyleKind::Paragraph, id, name)
    }

    pub fn table(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(StyleKind::Table, id, name)
    }

    pub fn based_on(mut self, parent: impl Into<String>) -> Self {
        self.based_on = Some(parent.into());
        self
    }

    pub fn next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn default_style(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn font(mut self, family: impl Into<String>) -> Self {
        self.font = Some(family.into());
        self
    }

    pub fn size_pt(mut self, points: f32) -> Self {
        self.size_half_points = Some((points * 2.0).round().max(0.0) as u32);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn spacing_pt(mut self, before: Option<u32>, after: Option<u32>) -> Self {
        self.space_before_twips = before.map(|points| points * 20);
        self.space_after_twips = after.map(|points| points * 20);
        self
    }

    pub fn outline(mut self, level: u8) -> Self {
        self.outline_level = Some(level);
        self
    }

    pub fn bullets(mut self) -> Self {
        self.bullet_list = true;
        self
    }

    pub fn grid(mut self) -> Self {
        self.grid_borders = true;
        self
    }

    pub fn size_points(&self) -> Option<f32> {
        self.size_half_points.map(|half| half as f32 / 2.0)
    }

    /// Styles are the same style when either the id or the display name matches;
    /// names compare case-insensitively (`heading 1` and `Heading 1` are one style).
    pub fn is_named(&self, id_or_name: &str) -> bool {
        self.id == id_or_name || self.name.eq_ignore_ascii_case(id_or_name)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSheet {
    styles: Vec<StyleDefinition>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Style set of a blank document: the styles every rendered proposal relies on,
    /// with plain formatting.
    pub fn base() -> Self {
        let mut sheet = Self::new();
        sheet.insert(StyleDefinition::paragraph(style_ids::NORMAL, "Normal").default_style());
        sheet.insert(
            StyleDefinition::paragraph(style_ids::TITLE, "Title")
                .based_on(style_ids::NORMAL)
                .next(style_ids::NORMAL)
                .size_pt(28.0)
                .spacing_pt(None, Some(4)),
        );
        sheet.insert(
            StyleDefinition::paragraph(style_ids::SUBTITLE, "Subtitle")
                .based_on(style_ids::NORMAL)
                .next(style_ids::NORMAL)
                .size_pt(15.0),
        );
        for (level, size) in [(1u8, 14.0f32), (2, 13.0), (3, 11.0)] {
            sheet.insert(
                StyleDefinition::paragraph(style_ids::heading(level), format!("heading {level}"))
                    .based_on(style_ids::NORMAL)
                    .next(style_ids::NORMAL)
                    .size_pt(size)
                    .bold()
                    .spacing_pt(Some(12), Some(4))
                    .outline(level - 1),
            );
        }
        sheet.insert(
            StyleDefinition::paragraph(style_ids::LIST_BULLET, "List Bullet")
                .based_on(style_ids::NORMAL)
                .bullets(),
        );
        sheet.insert(StyleDefinition::table(style_ids::TABLE_GRID, "Table Grid").grid());
        sheet
    }

    /// Branded fallback used when no template is supplied.
    pub fn defaults() -> Self {
        builder::TemplateBuilder::default().style_sheet()
    }

    pub fn styles(&self) -> &[StyleDefinition] {
        &self.styles
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn get(&self, id_or_name: &str) -> Option<&StyleDefinition> {
        self.styles.iter().find(|style| style.is_named(id_or_name))
    }

    pub fn contains(&self, id_or_name: &str) -> bool {
        self.get(id_or_name).is_some()
    }

    /// Adds `style` unless a style with the same id or name is already present.
    /// Returns whether the style was added.
    pub fn insert(&mut self, style: StyleDefinition) -> bool {
        if self.contains(&style.id) || self.contains(&style.name) {
            return false;
        }
        self.styles.push(style);
        true
    }

    /// Copies styles in, first definition wins. Returns how many were added.
    pub fn merge<I>(&mut self, styles: I) -> usize
    where
        I: IntoIterator<Item = StyleDefinition>,
    {
        styles.into_iter().filter(|style| self.insert(style.clone())).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub styles: Vec<StyleDefinition>,
    /// Grid-line table style every generated table is assigned.
    pub table_style: Option<String>,
}

impl Template {
    pub fn from_styles(styles: Vec<StyleDefinition>) -> Self {
        let table_style = styles
            .iter()
            .find(|style| style.kind == StyleKind::Table && style.is_default && style.grid_borders)
            .map(|style| style.id.clone());
        Self { styles, table_style }
    }

    pub fn load(path: &Path) -> Result<Self, PackageError> {
        let styles = ooxml::read_styles(path)?;
        Ok(Self::from_styles(styles))
    }
}
