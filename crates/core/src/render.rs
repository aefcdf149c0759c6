//! Proposal rendering.
//!
//! [`ProposalRenderer`] resolves the style set once, then lays a
//! [`ContentSchema`] out section by section in canonical order. Each section
//! operation on [`ProposalDocument`] appends its heading and body in place and
//! closes the section with a page break, except for the final effort table.

use std::fs;
use std::path::Path;

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::{Document, Image};
use crate::domain::content::{
    non_empty_or, ContentSchema, License, Requirement, Resource, Task, DEFAULT_LICENSING,
    DEFAULT_TITLE,
};
use crate::domain::section::{
    Section, IN_SCOPE_HEADING, LICENSES_HEADING, LICENSE_COLUMNS, LICENSING_HEADING,
    OUT_OF_SCOPE_HEADING, OUT_OF_SCOPE_STATEMENT, PROJECT_DELIVERABLES_HEADING, RAID_HEADINGS,
    REQUIREMENT_COLUMNS, RESOURCE_COLUMNS, RESOURCE_COSTS_HEADING, STANDARD_DELIVERABLES_HEADING,
    TABLE_OF_CONTENTS_HINT, TASK_COLUMNS,
};
use crate::errors::RenderError;
use crate::ooxml;
use crate::template::{style_ids, StyleSheet, Template};

pub const DEFAULT_OUTPUT_PATH: &str = "proposal.docx";

const EMU_PER_INCH: u64 = 914_400;
/// Embedded diagrams are scaled to this width with their aspect ratio kept.
pub const DIAGRAM_WIDTH_EMU: u64 = 6 * EMU_PER_INCH;

#[derive(Clone, Debug, Default)]
pub struct ProposalRenderer {
    template: Option<Template>,
}

impl ProposalRenderer {
    /// A missing template path falls back to the default styles with a warning;
    /// a template that exists but cannot be read is an error.
    pub fn new(template_path: Option<&Path>) -> Result<Self, RenderError> {
        let Some(path) = template_path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            warn!(
                event_name = "render.template.missing",
                path = %path.display(),
                "style template not found, using default styles"
            );
            return Ok(Self::default());
        }

        let template = Template::load(path)
            .map_err(|source| RenderError::Template { path: path.to_path_buf(), source })?;
        info!(
            event_name = "render.template.loaded",
            path = %path.display(),
            styles = template.styles.len(),
            table_style = template.table_style.as_deref().unwrap_or(style_ids::TABLE_GRID),
            "style template loaded"
        );
        Ok(Self::with_template(template))
    }

    pub fn with_template(template: Template) -> Self {
        Self { template: Some(template) }
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// An empty document carrying the resolved style set.
    pub fn start(&self) -> ProposalDocument {
        let Some(template) = &self.template else {
            return ProposalDocument::new(StyleSheet::defaults(), style_ids::TABLE_GRID.to_string());
        };

        let mut styles = StyleSheet::base();
        let added = styles.merge(template.styles.iter().cloned());
        let table_style = template
            .table_style
            .as_deref()
            .and_then(|designated| styles.get(designated))
            .map(|style| style.id.clone())
            .unwrap_or_else(|| style_ids::TABLE_GRID.to_string());
        debug!(
            event_name = "render.styles.merged",
            added,
            skipped = template.styles.len() - added,
            table_style = %table_style,
            "template styles merged"
        );
        ProposalDocument::new(styles, table_style)
    }

    pub fn render(&self, content: ContentSchema) -> ProposalDocument {
        let mut document = self.start();
        document.add_title_page(
            content.display_title(),
            &content.subtitle,
            content.customer.as_deref(),
            content.date.as_deref(),
        );
        document.add_table_of_contents();
        document.add_executive_summary(&content.executive_summary);
        document.add_requirements_table(&content.requirements);
        document.add_scope_sections(&content.in_scope, &content.out_scope);
        document.add_solution_summary(&content.solution_summary, content.diagram.as_deref());
        document.add_deliverables(
            &content.standard_deliverables,
            &content.project_specific_deliverables,
        );
        document.add_costs_section(
            &content.resources,
            &content.licenses,
            content.display_licensing(),
        );
        document.add_raid_section(
            &content.risks,
            &content.assumptions,
            &content.issues,
            &content.dependencies,
        );
        document.add_effort_breakdown(&content.tasks);
        document
    }

    pub fn render_to_path(
        &self,
        content: ContentSchema,
        path: &Path,
    ) -> Result<ProposalDocument, RenderError> {
        let document = self.render(content);
        document.save(path)?;
        Ok(document)
    }

    pub fn render_to_bytes(&self, content: ContentSchema) -> Result<Vec<u8>, RenderError> {
        self.render(content).to_bytes()
    }
}

/// A proposal being assembled. Owns its document exclusively until saved.
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalDocument {
    document: Document,
    table_style: String,
}

impl ProposalDocument {
    pub fn new(styles: StyleSheet, table_style: String) -> Self {
        Self { document: Document::new(styles), table_style }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn table_style(&self) -> &str {
        &self.table_style
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn add_title_page(
        &mut self,
        title: &str,
        subtitle: &str,
        customer: Option<&str>,
        date: Option<&str>,
    ) {
        let title = non_empty_or(title, DEFAULT_TITLE);
        self.document.set_title(title);
        self.document.add_heading(title, 0);
        if !subtitle.trim().is_empty() {
            self.document.add_centered(subtitle, Some(style_ids::SUBTITLE));
        }
        if let Some(customer) = customer.filter(|value| !value.trim().is_empty()) {
            self.document.add_centered(format!("Prepared for: {customer}"), None);
        }
        if let Some(date) = date.filter(|value| !value.trim().is_empty()) {
            self.document.add_centered(format!("Date: {date}"), None);
        }
        self.finish(Section::TitlePage);
    }

    pub fn add_table_of_contents(&mut self) {
        self.open(Section::TableOfContents);
        self.document.add_table_of_contents(TABLE_OF_CONTENTS_HINT);
        self.finish(Section::TableOfContents);
    }

    pub fn add_executive_summary(&mut self, text: &str) {
        self.open(Section::ExecutiveSummary);
        self.add_text(text);
        self.finish(Section::ExecutiveSummary);
    }

    pub fn add_requirements_table(&mut self, requirements: &[Requirement]) {
        self.open(Section::Requirements);
        self.add_table(&REQUIREMENT_COLUMNS, requirements.iter().map(Requirement::cells).collect());
        self.finish(Section::Requirements);
    }

    /// The out-of-scope list always closes with the catch-all statement.
    pub fn add_scope_sections(&mut self, in_scope: &[String], out_scope: &[String]) {
        self.open(Section::Scope);
        self.document.add_heading(IN_SCOPE_HEADING, 2);
        self.add_bullets(in_scope);
        self.document.add_heading(OUT_OF_SCOPE_HEADING, 2);
        self.add_bullets(out_scope);
        self.document.add_bullet(OUT_OF_SCOPE_STATEMENT);
        self.finish(Section::Scope);
    }

    /// The diagram is embedded only when the path exists; otherwise the section
    /// is text-only.
    pub fn add_solution_summary(&mut self, text: &str, diagram: Option<&Path>) {
        self.open(Section::SolutionSummary);
        self.add_text(text);
        if let Some(path) = diagram {
            self.add_diagram(path);
        }
        self.finish(Section::SolutionSummary);
    }

    pub fn add_deliverables(&mut self, standard: &[String], project_specific: &[String]) {
        self.open(Section::Deliverables);
        self.document.add_heading(STANDARD_DELIVERABLES_HEADING, 2);
        self.add_bullets(standard);
        self.document.add_heading(PROJECT_DELIVERABLES_HEADING, 2);
        self.add_bullets(project_specific);
        self.finish(Section::Deliverables);
    }

    /// The license table is only added when there are licenses to list.
    pub fn add_costs_section(&mut self, resources: &[Resource], licenses: &[License], licensing: &str) {
        self.open(Section::Costs);
        self.document.add_heading(RESOURCE_COSTS_HEADING, 2);
        self.add_table(&RESOURCE_COLUMNS, resources.iter().map(Resource::cells).collect());
        if !licenses.is_empty() {
            self.document.add_heading(LICENSES_HEADING, 2);
            self.add_table(&LICENSE_COLUMNS, licenses.iter().map(License::cells).collect());
        }
        self.document.add_heading(LICENSING_HEADING, 2);
        self.document.add_paragraph(non_empty_or(licensing, DEFAULT_LICENSING), None);
        self.finish(Section::Costs);
    }

    pub fn add_raid_section(
        &mut self,
        risks: &[String],
        assumptions: &[String],
        issues: &[String],
        dependencies: &[String],
    ) {
        self.open(Section::Raid);
        for (heading, items) in RAID_HEADINGS.iter().zip([risks, assumptions, issues, dependencies]) {
            self.document.add_heading(*heading, 2);
            self.add_bullets(items);
        }
        self.finish(Section::Raid);
    }

    pub fn add_effort_breakdown(&mut self, tasks: &[Task]) {
        self.open(Section::Effort);
        self.add_table(&TASK_COLUMNS, tasks.iter().map(Task::cells).collect());
        self.finish(Section::Effort);
    }

    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        ooxml::save(&self.document, path)
            .map_err(|source| RenderError::OutputWrite { path: path.to_path_buf(), source })?;
        info!(
            event_name = "render.document.saved",
            path = %path.display(),
            pages = self.page_count(),
            tables = self.document.tables().len(),
            images = self.document.images().len(),
            "proposal document saved"
        );
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        ooxml::to_bytes(&self.document).map_err(RenderError::Serialize)
    }

    fn open(&mut self, section: Section) {
        if let Some(heading) = section.heading() {
            self.document.add_heading(heading, 1);
        }
    }

    fn finish(&mut self, section: Section) {
        if !section.is_final() {
            self.document.add_page_break();
        }
        debug!(event_name = "render.section.added", section = %section, "section rendered");
    }

    fn add_text(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.document.add_paragraph(text, None);
        }
    }

    fn add_bullets(&mut self, items: &[String]) {
        for item in items {
            self.document.add_bullet(item.as_str());
        }
    }

    fn add_table(&mut self, columns: &[&str], rows: Vec<Vec<String>>) {
        let style = self.table_style.clone();
        self.document.add_table(&style, columns, rows);
    }

    fn add_diagram(&mut self, path: &Path) {
        if !path.exists() {
            debug!(
                event_name = "render.diagram.absent",
                path = %path.display(),
                "diagram not found, solution summary is text-only"
            );
            return;
        }
        match load_diagram(path) {
            Ok(image) => self.document.add_image(image),
            Err(error) => warn!(
                event_name = "render.diagram.skipped",
                path = %path.display(),
                error = %error,
                "diagram could not be embedded"
            ),
        }
    }
}

#[derive(Debug, Error)]
enum DiagramError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported image format {0:?}")]
    Unsupported(ImageFormat),
    #[error("unrecognized image format")]
    Unrecognized,
    #[error("image has no area")]
    Empty,
}

/// The format is sniffed from the file header, so the extension does not matter.
fn load_diagram(path: &Path) -> Result<Image, DiagramError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let (extension, content_type) = match reader.format() {
        Some(ImageFormat::Png) => ("png", "image/png"),
        Some(ImageFormat::Jpeg) => ("jpeg", "image/jpeg"),
        Some(ImageFormat::Gif) => ("gif", "image/gif"),
        Some(other) => return Err(DiagramError::Unsupported(other)),
        None => return Err(DiagramError::Unrecognized),
    };
    let (width, height) = reader.into_dimensions()?;
    if width == 0 || height == 0 {
        return Err(DiagramError::Empty);
    }
    let bytes = fs::read(path)?;

    Ok(Image {
        description: diagram_description(path),
        extension,
        content_type,
        bytes,
        width_emu: DIAGRAM_WIDTH_EMU,
        height_emu: DIAGRAM_WIDTH_EMU * u64::from(height) / u64::from(width),
    })
}

fn diagram_description(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "diagram".to_string())
}
