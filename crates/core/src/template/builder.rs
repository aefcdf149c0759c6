use std::fs;
use std::path::Path;

use tracing::info;

use crate::document::Document;
use crate::domain::section::Section;
use crate::errors::PackageError;
use crate::ooxml;
use crate::template::{style_ids, Alignment, Rgb, StyleDefinition, StyleSheet, Template};

pub const BRAND_FONT: &str = "Arial";
pub const BRAND_COLOR: Rgb = Rgb(0, 120, 200);
pub const BRAND_TABLE_STYLE: &str = "ProposalTable";

const TEMPLATE_TITLE: &str = "Project Proposal";
const TEMPLATE_SUBTITLE: &str = "TEMPLATE DOCUMENT - DO NOT MODIFY";
const SECTION_PLACEHOLDER: &str = "This section will be populated by the proposal generator.";

/// Brand constants a style template is synthesized from.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateBuilder {
    font_family: String,
    brand_color: Rgb,
    title_size_pt: f32,
    body_size_pt: f32,
    heading_levels: u8,
    section_headings: Vec<String>,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self {
            font_family: BRAND_FONT.to_string(),
            brand_color: BRAND_COLOR,
            title_size_pt: 24.0,
            body_size_pt: 11.0,
            heading_levels: 3,
            section_headings: Section::content_headings().into_iter().map(String::from).collect(),
        }
    }
}

impl TemplateBuilder {
    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn brand_color(mut self, color: Rgb) -> Self {
        self.brand_color = color;
        self
    }

    /// Heading sizes fall linearly: level `n` is `16 - 2n` points.
    pub fn heading_size_pt(level: u8) -> f32 {
        (16.0 - 2.0 * f32::from(level)).max(8.0)
    }

    pub fn style_sheet(&self) -> StyleSheet {
        let mut sheet = StyleSheet::new();
        sheet.insert(
            StyleDefinition::paragraph(style_ids::NORMAL, "Normal")
                .default_style()
                .font(&self.font_family)
                .size_pt(self.body_size_pt)
                .spacing_pt(None, Some(10)),
        );
        sheet.insert(
            StyleDefinition::paragraph(style_ids::TITLE, "Title")
                .based_on(style_ids::NORMAL)
                .next(style_ids::NORMAL)
                .font(&self.font_family)
                .size_pt(self.title_size_pt)
                .bold()
                .color(self.brand_color)
                .align(Alignment::Center)
                .spacing_pt(None, Some(24)),
        );
        sheet.insert(
            StyleDefinition::paragraph(style_ids::SUBTITLE, "Subtitle")
                .based_on(style_ids::NORMAL)
                .next(style_ids::NORMAL)
                .font(&self.font_family)
                .size_pt(Self::heading_size_pt(1))
                .color(self.brand_color)
                .align(Alignment::Center),
        );
        for level in 1..=self.heading_levels {
            sheet.insert(
                StyleDefinition::paragraph(style_ids::heading(level), format!("heading {level}"))
                    .based_on(style_ids::NORMAL)
                    .next(style_ids::NORMAL)
                    .font(&self.font_family)
                    .size_pt(Self::heading_size_pt(level))
                    .bold()
                    .color(self.brand_color)
                    .spacing_pt(Some(12), Some(6))
                    .outline(level - 1),
            );
        }
        sheet.insert(
            StyleDefinition::paragraph(style_ids::LIST_BULLET, "List Bullet")
                .based_on(style_ids::NORMAL)
                .font(&self.font_family)
                .size_pt(self.body_size_pt)
                .bullets(),
        );
        sheet.insert(
            StyleDefinition::table(BRAND_TABLE_STYLE, "Proposal Table").default_style().grid(),
        );
        sheet.merge(StyleSheet::base().styles().iter().cloned());
        sheet
    }

    pub fn build(&self) -> Template {
        Template {
            styles: self.style_sheet().styles().to_vec(),
            table_style: Some(BRAND_TABLE_STYLE.to_string()),
        }
    }

    /// Sample document laid out with the template's own styles.
    pub fn sample_document(&self) -> Document {
        let mut document = Document::new(self.style_sheet());
        document.set_title(TEMPLATE_TITLE);
        document.add_heading(TEMPLATE_TITLE, 0);
        document.add_paragraph(TEMPLATE_SUBTITLE, Some(style_ids::SUBTITLE));
        for heading in &self.section_headings {
            document.add_heading(heading, 1);
            document.add_paragraph(SECTION_PLACEHOLDER, Some(style_ids::NORMAL));
            document.add_paragraph("", None);
        }
        document
    }

    /// Persists the template as a `.docx` style artifact, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<Template, PackageError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        ooxml::save(&self.sample_document(), path)?;
        info!(
            event_name = "template.write.completed",
            path = %path.display(),
            font = %self.font_family,
            "style template written"
        );
        Ok(self.build())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{TemplateBuilder, BRAND_COLOR, BRAND_FONT, BRAND_TABLE_STYLE};
    use crate::domain::section::Section;
    use crate::template::{style_ids, Alignment, Template};

    #[test]
    fn heading_ladder_is_linear() {
        assert_eq!(TemplateBuilder::heading_size_pt(1), 14.0);
        assert_eq!(TemplateBuilder::heading_size_pt(2), 12.0);
        assert_eq!(TemplateBuilder::heading_size_pt(3), 10.0);
    }

    #[test]
    fn style_sheet_brands_headings_and_title() {
        let sheet = TemplateBuilder::default().style_sheet();

        let title = sheet.get(style_ids::TITLE).expect("title style");
        assert_eq!(title.size_points(), Some(24.0));
        assert_eq!(title.alignment, Some(Alignment::Center));
        assert!(title.bold);

        for level in 1..=3u8 {
            let heading = sheet.get(&style_ids::heading(level)).expect("heading style");
            assert_eq!(heading.font.as_deref(), Some(BRAND_FONT));
            assert_eq!(heading.color, Some(BRAND_COLOR));
            assert!(heading.bold);
        }

        assert!(sheet.contains(style_ids::TABLE_GRID), "base grid style should be retained");
        assert!(sheet.get(BRAND_TABLE_STYLE).is_some_and(|style| style.is_default));
    }

    #[test]
    fn sample_document_lists_every_section_heading() {
        let builder = TemplateBuilder::default();
        let document = builder.sample_document();
        let headings: Vec<&str> = document
            .headings()
            .into_iter()
            .filter(|(level, _)| *level == 1)
            .map(|(_, text)| text)
            .collect();

        assert_eq!(headings, Section::content_headings());
    }

    #[test]
    fn written_template_loads_back_with_designated_table_style() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("templates").join("proposal_template.docx");

        let built = TemplateBuilder::default().write(&path).expect("template should be written");
        let loaded = Template::load(&path).expect("template should load");

        assert_eq!(loaded.table_style.as_deref(), Some(BRAND_TABLE_STYLE));
        assert_eq!(loaded.styles, built.styles);
    }
}
