//! Per-section content backends.
//!
//! A [`ContentSource`] drafts one proposal section at a time from a
//! [`ProposalBrief`]. The mock source answers deterministically from the brief;
//! the language-model source asks an [`LlmClient`] for a JSON object holding the
//! section's fields and reads it with the same lenient parser used for content
//! files.

use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use proposal_core::domain::content::{
    format_number, ContentSchema, License, Requirement, Resource, Task,
};

use crate::llm::LlmClient;

/// What the customer asked for, as collected upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposalBrief {
    pub project: String,
    pub customer: String,
    pub requirements: String,
}

impl ProposalBrief {
    pub fn new(
        project: impl Into<String>,
        customer: impl Into<String>,
        requirements: impl Into<String>,
    ) -> Self {
        Self { project: project.into(), customer: customer.into(), requirements: requirements.into() }
    }

    /// Non-empty requirement lines with list markers removed.
    pub fn requirement_lines(&self) -> Vec<&str> {
        self.requirements
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Content sections drafted upstream, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DraftSection {
    ExecutiveSummary,
    Requirements,
    Scope,
    SolutionSummary,
    Deliverables,
    Costs,
    Raid,
    Effort,
}

impl DraftSection {
    pub const ALL: [DraftSection; 8] = [
        DraftSection::ExecutiveSummary,
        DraftSection::Requirements,
        DraftSection::Scope,
        DraftSection::SolutionSummary,
        DraftSection::Deliverables,
        DraftSection::Costs,
        DraftSection::Raid,
        DraftSection::Effort,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "executive_summary",
            Self::Requirements => "requirements",
            Self::Scope => "scope",
            Self::SolutionSummary => "solution_summary",
            Self::Deliverables => "deliverables",
            Self::Costs => "costs",
            Self::Raid => "raid",
            Self::Effort => "effort",
        }
    }

    /// JSON shape the language model is asked to answer with.
    fn instructions(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => {
                r#"Write a concise executive summary. Fields: {"executive_summary": string}"#
            }
            Self::Requirements => {
                r#"List the customer requirements. Fields: {"requirements": [{"id": string, "description": string, "priority": "High"|"Medium"|"Low"}]}"#
            }
            Self::Scope => {
                r#"Define the project scope. Fields: {"in_scope": [string], "out_scope": [string]}"#
            }
            Self::SolutionSummary => {
                r#"Summarize the proposed technical solution. Fields: {"solution_summary": string}"#
            }
            Self::Deliverables => {
                r#"List the deliverables. Fields: {"standard_deliverables": [string], "project_specific_deliverables": [string]}"#
            }
            Self::Costs => {
                r#"Estimate resources and licensing. Fields: {"resources": [{"activity": string, "role": string, "type": string, "quantity": number, "unit_cost": string, "total_cost": string}], "licenses": [{"name": string, "quantity": number, "cost": string}], "licensing": string}"#
            }
            Self::Raid => {
                r#"Identify risks, assumptions, issues and dependencies. Fields: {"risks": [string], "assumptions": [string], "issues": [string], "dependencies": [string]}"#
            }
            Self::Effort => {
                r#"Break the work into tasks. Fields: {"tasks": [{"task": string, "description": string, "role": string, "effort": number}]}"#
            }
        }
    }
}

impl fmt::Display for DraftSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of one drafted section.
#[derive(Clone, Debug, PartialEq)]
pub enum SectionDraft {
    ExecutiveSummary(String),
    Requirements(Vec<Requirement>),
    Scope { in_scope: Vec<String>, out_scope: Vec<String> },
    SolutionSummary(String),
    Deliverables { standard: Vec<String>, project_specific: Vec<String> },
    Costs { resources: Vec<Resource>, licenses: Vec<License>, licensing: String },
    Raid {
        risks: Vec<String>,
        assumptions: Vec<String>,
        issues: Vec<String>,
        dependencies: Vec<String>,
    },
    Effort(Vec<Task>),
}

impl SectionDraft {
    /// Picks the fields belonging to `section` out of partially filled content.
    pub fn from_content(section: DraftSection, content: ContentSchema) -> Self {
        match section {
            DraftSection::ExecutiveSummary => Self::ExecutiveSummary(content.executive_summary),
            DraftSection::Requirements => Self::Requirements(content.requirements),
            DraftSection::Scope => {
                Self::Scope { in_scope: content.in_scope, out_scope: content.out_scope }
            }
            DraftSection::SolutionSummary => Self::SolutionSummary(content.solution_summary),
            DraftSection::Deliverables => Self::Deliverables {
                standard: content.standard_deliverables,
                project_specific: content.project_specific_deliverables,
            },
            DraftSection::Costs => Self::Costs {
                resources: content.resources,
                licenses: content.licenses,
                licensing: content.licensing,
            },
            DraftSection::Raid => Self::Raid {
                risks: content.risks,
                assumptions: content.assumptions,
                issues: content.issues,
                dependencies: content.dependencies,
            },
            DraftSection::Effort => Self::Effort(content.tasks),
        }
    }

    pub fn section(&self) -> DraftSection {
        match self {
            Self::ExecutiveSummary(_) => DraftSection::ExecutiveSummary,
            Self::Requirements(_) => DraftSection::Requirements,
            Self::Scope { .. } => DraftSection::Scope,
            Self::SolutionSummary(_) => DraftSection::SolutionSummary,
            Self::Deliverables { .. } => DraftSection::Deliverables,
            Self::Costs { .. } => DraftSection::Costs,
            Self::Raid { .. } => DraftSection::Raid,
            Self::Effort(_) => DraftSection::Effort,
        }
    }

    pub fn apply_to(self, content: &mut ContentSchema) {
        match self {
            Self::ExecutiveSummary(text) => content.executive_summary = text,
            Self::Requirements(rows) => content.requirements = rows,
            Self::Scope { in_scope, out_scope } => {
                content.in_scope = in_scope;
                content.out_scope = out_scope;
            }
            Self::SolutionSummary(text) => content.solution_summary = text,
            Self::Deliverables { standard, project_specific } => {
                content.standard_deliverables = standard;
                content.project_specific_deliverables = project_specific;
            }
            Self::Costs { resources, licenses, licensing } => {
                content.resources = resources;
                content.licenses = licenses;
                content.licensing = licensing;
            }
            Self::Raid { risks, assumptions, issues, dependencies } => {
                content.risks = risks;
                content.assumptions = assumptions;
                content.issues = issues;
                content.dependencies = dependencies;
            }
            Self::Effort(tasks) => content.tasks = tasks,
        }
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn draft(&self, brief: &ProposalBrief, section: DraftSection) -> Result<SectionDraft>;
}

/// Canned content derived from the brief; used offline and in tests.
#[derive(Clone, Debug, Default)]
pub struct MockContentSource;

impl MockContentSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentSource for MockContentSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn draft(&self, brief: &ProposalBrief, section: DraftSection) -> Result<SectionDraft> {
        Ok(mock_draft(brief, section))
    }
}

fn mock_draft(brief: &ProposalBrief, section: DraftSection) -> SectionDraft {
    let project = if brief.project.trim().is_empty() { "the project" } else { brief.project.trim() };
    let customer =
        if brief.customer.trim().is_empty() { "the customer" } else { brief.customer.trim() };
    let strings = |items: &[&str]| items.iter().map(|item| item.to_string()).collect::<Vec<_>>();

    match section {
        DraftSection::ExecutiveSummary => SectionDraft::ExecutiveSummary(format!(
            "{customer} has asked for {project}. This proposal sets out the scope, solution, \
             costs and delivery plan for the engagement."
        )),
        DraftSection::Requirements => {
            let mut lines = brief.requirement_lines();
            if lines.is_empty() {
                lines.push("Deliver the project as described in the brief");
            }
            SectionDraft::Requirements(
                lines
                    .into_iter()
                    .enumerate()
                    .map(|(index, line)| Requirement {
                        id: format!("REQ-{:03}", index + 1),
                        description: line.to_string(),
                        priority: if index == 0 { "High" } else { "Medium" }.to_string(),
                    })
                    .collect(),
            )
        }
        DraftSection::Scope => SectionDraft::Scope {
            in_scope: vec![
                format!("Design and build of {project}"),
                "Testing and user acceptance support".to_string(),
                "Knowledge transfer to the support team".to_string(),
            ],
            out_scope: strings(&["Hardware procurement", "Ongoing managed service"]),
        },
        DraftSection::SolutionSummary => SectionDraft::SolutionSummary(format!(
            "{project} will be delivered in phases, starting with discovery and design, \
             followed by build, migration and hypercare."
        )),
        DraftSection::Deliverables => SectionDraft::Deliverables {
            standard: strings(&["Project plan", "High-level design", "Test plan", "Handover pack"]),
            project_specific: vec![format!("{project} configuration workbook")],
        },
        DraftSection::Costs => SectionDraft::Costs {
            resources: vec![
                mock_resource("Project management", "Project Manager", 5.0, 850),
                mock_resource("Design and build", "Technical Consultant", 10.0, 950),
                mock_resource("Testing", "Technical Consultant", 3.0, 950),
            ],
            licenses: Vec::new(),
            licensing: String::new(),
        },
        DraftSection::Raid => SectionDraft::Raid {
            risks: strings(&["Key stakeholders unavailable during design workshops"]),
            assumptions: vec![format!("{customer} provides timely access to systems and staff")],
            issues: Vec::new(),
            dependencies: strings(&["Availability of test environments"]),
        },
        DraftSection::Effort => SectionDraft::Effort(vec![
            mock_task("Discovery", "Confirm requirements and constraints", "Project Manager", 2.0),
            mock_task("Design", "Produce the high-level design", "Technical Consultant", 3.0),
            mock_task("Build", "Configure and integrate the solution", "Technical Consultant", 7.0),
            mock_task("Test", "Support user acceptance testing", "Technical Consultant", 3.0),
            mock_task("Handover", "Hand over to support", "Project Manager", 1.5),
        ]),
    }
}

fn mock_resource(activity: &str, role: &str, days: f64, day_rate: u32) -> Resource {
    Resource {
        activity: activity.to_string(),
        role: role.to_string(),
        kind: "Remote".to_string(),
        quantity: format_number(days),
        unit_cost: format!("£{day_rate}"),
        total_cost: format!("£{}", format_number(days * f64::from(day_rate))),
    }
}

fn mock_task(task: &str, description: &str, role: &str, effort: f64) -> Task {
    Task {
        task: task.to_string(),
        description: description.to_string(),
        role: role.to_string(),
        effort: Some(effort),
    }
}

/// Drafts each section with one completion request.
#[derive(Clone, Debug)]
pub struct LlmContentSource<C> {
    client: C,
}

impl<C: LlmClient> LlmContentSource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    fn prompt(brief: &ProposalBrief, section: DraftSection) -> String {
        format!(
            "Project: {project}\nCustomer: {customer}\nCustomer requirements:\n{requirements}\n\n\
             Section: {section}\n{instructions}\nRespond with one JSON object using exactly these fields.",
            project = brief.project.trim(),
            customer = brief.customer.trim(),
            requirements = brief.requirements.trim(),
            instructions = section.instructions(),
        )
    }
}

#[async_trait]
impl<C: LlmClient> ContentSource for LlmContentSource<C> {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn draft(&self, brief: &ProposalBrief, section: DraftSection) -> Result<SectionDraft> {
        let reply = self.client.complete(&Self::prompt(brief, section)).await?;
        let partial = ContentSchema::from_json_str(extract_json(&reply))
            .with_context(|| format!("model reply for `{section}` is not usable content"))?;
        Ok(SectionDraft::from_content(section, partial))
    }
}

/// The JSON object inside a reply, tolerating code fences and surrounding prose.
pub fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
