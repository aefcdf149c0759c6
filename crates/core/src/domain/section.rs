use serde::{Deserialize, Serialize};

pub const OUT_OF_SCOPE_STATEMENT: &str =
    "Anything not specifically mentioned in the In-Scope section is considered Out of Scope.";
pub const TABLE_OF_CONTENTS_HINT: &str =
    "Right-click and select \"Update Field\" to update this table of contents";

pub const REQUIREMENT_COLUMNS: [&str; 3] = ["Requirement ID", "Description", "Priority"];
pub const RESOURCE_COLUMNS: [&str; 5] =
    ["Activity", "Role Type", "Quantity (days)", "Unit Cost", "Total Cost"];
pub const LICENSE_COLUMNS: [&str; 3] = ["License", "Quantity", "Cost"];
pub const TASK_COLUMNS: [&str; 4] = ["Task", "Description", "Role", "Effort (days)"];

pub const IN_SCOPE_HEADING: &str = "In Scope";
pub const OUT_OF_SCOPE_HEADING: &str = "Out of Scope";
pub const STANDARD_DELIVERABLES_HEADING: &str = "Standard Deliverables";
pub const PROJECT_DELIVERABLES_HEADING: &str = "Project-Specific Deliverables";
pub const RESOURCE_COSTS_HEADING: &str = "Resource Costs";
pub const LICENSES_HEADING: &str = "Required Licenses";
pub const LICENSING_HEADING: &str = "Licensing";
pub const RAID_HEADINGS: [&str; 4] = ["Risks", "Assumptions", "Issues", "Dependencies"];

/// Sections of a proposal in the order they are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    TitlePage,
    TableOfContents,
    ExecutiveSummary,
    Requirements,
    Scope,
    SolutionSummary,
    Deliverables,
    Costs,
    Raid,
    Effort,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::TitlePage,
        Section::TableOfContents,
        Section::ExecutiveSummary,
        Section::Requirements,
        Section::Scope,
        Section::SolutionSummary,
        Section::Deliverables,
        Section::Costs,
        Section::Raid,
        Section::Effort,
    ];

    /// Top-level heading; the title page is headed by the proposal title instead.
    pub fn heading(self) -> Option<&'static str> {
        match self {
            Self::TitlePage => None,
            Self::TableOfContents => Some("Table of Contents"),
            Self::ExecutiveSummary => Some("Executive Summary"),
            Self::Requirements => Some("Customer Requirements"),
            Self::Scope => Some("Project Scope"),
            Self::SolutionSummary => Some("Solution Summary"),
            Self::Deliverables => Some("Deliverables"),
            Self::Costs => Some("Costs and Resources"),
            Self::Raid => Some("RAID Analysis"),
            Self::Effort => Some("Effort Breakdown"),
        }
    }

    pub fn is_final(self) -> bool {
        self == Self::Effort
    }

    /// Headings of the content sections, the list a style template is laid out with.
    pub fn content_headings() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|section| !matches!(section, Self::TitlePage | Self::TableOfContents))
            .filter_map(|section| section.heading())
            .collect()
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.heading() {
            Some(heading) => f.write_str(heading),
            None => f.write_str("Title Page"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Section;

    #[test]
    fn only_the_effort_section_is_final() {
        let finals: Vec<Section> =
            Section::ALL.iter().copied().filter(|section| section.is_final()).collect();
        assert_eq!(finals, vec![Section::Effort]);
        assert_eq!(Section::ALL.last(), Some(&Section::Effort));
    }

    #[test]
    fn content_headings_follow_canonical_order() {
        assert_eq!(
            Section::content_headings(),
            vec![
                "Executive Summary",
                "Customer Requirements",
                "Project Scope",
                "Solution Summary",
                "Deliverables",
                "Costs and Resources",
                "RAID Analysis",
                "Effort Breakdown",
            ]
        );
    }
}
