use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use proposal_core::config::{AppConfig, ContentBackend, ContentConfig};
use proposal_core::domain::content::{ContentSchema, DEFAULT_TITLE};
use tracing::info;

use crate::llm::OpenAiClient;
use crate::source::{
    ContentSource, DraftSection, LlmContentSource, MockContentSource, ProposalBrief,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Pause between consecutive section requests.
    pub step_delay: Duration,
    pub date: Option<String>,
    pub diagram: Option<PathBuf>,
}

impl OrchestratorConfig {
    pub fn from_content(config: &ContentConfig) -> Self {
        Self { step_delay: Duration::from_millis(config.step_delay_ms), ..Self::default() }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_diagram(mut self, diagram: Option<PathBuf>) -> Self {
        self.diagram = diagram;
        self
    }
}

/// Requests every content section in order and assembles the finished content.
pub struct ProposalOrchestrator {
    source: Box<dyn ContentSource>,
    config: OrchestratorConfig,
}

impl ProposalOrchestrator {
    pub fn new(source: Box<dyn ContentSource>, config: OrchestratorConfig) -> Self {
        Self { source, config }
    }

    /// Builds the source named by `content.backend`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source: Box<dyn ContentSource> = match config.content.backend {
            ContentBackend::Mock => Box::new(MockContentSource::new()),
            ContentBackend::OpenAi => {
                let client = OpenAiClient::from_config(&config.content)?;
                Box::new(LlmContentSource::new(client))
            }
        };
        let mut orchestrator_config = OrchestratorConfig::from_content(&config.content)
            .with_diagram(config.render.diagram_path.clone());
        // The mock backend is never paced.
        if matches!(config.content.backend, ContentBackend::Mock) {
            orchestrator_config.step_delay = Duration::ZERO;
        }
        Ok(Self::new(source, orchestrator_config))
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.config.date = Some(date.into());
        self
    }

    pub fn backend(&self) -> &'static str {
        self.source.name()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub async fn assemble(&self, brief: &ProposalBrief) -> Result<ContentSchema> {
        let project = brief.project.trim();
        let customer = brief.customer.trim();

        let mut content = ContentSchema {
            title: if project.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                format!("{DEFAULT_TITLE} - {project}")
            },
            subtitle: if customer.is_empty() {
                String::new()
            } else {
                format!("Prepared for {customer}")
            },
            customer: (!customer.is_empty()).then(|| customer.to_string()),
            date: self.config.date.clone(),
            diagram: self.config.diagram.clone(),
            ..ContentSchema::default()
        };

        for (step, section) in DraftSection::ALL.into_iter().enumerate() {
            if step > 0 && !self.config.step_delay.is_zero() {
                tokio::time::sleep(self.config.step_delay).await;
            }
            info!(
                event_name = "orchestrator.section.requested",
                backend = self.source.name(),
                section = %section,
                step = step + 1,
                "requesting section content"
            );
            let draft = self
                .source
                .draft(brief, section)
                .await
                .with_context(|| format!("failed to draft section `{section}`"))?;
            draft.apply_to(&mut content);
        }

        content.validate()?;
        info!(
            event_name = "orchestrator.content.assembled",
            backend = self.source.name(),
            requirements = content.requirements.len(),
            tasks = content.tasks.len(),
            "proposal content assembled"
        );
        Ok(content)
    }
}
