use std::fs;
use std::path::PathBuf;

use chrono::Local;
use proposal_agent::orchestrator::ProposalOrchestrator;
use proposal_agent::source::ProposalBrief;
use proposal_core::config::ConfigOverrides;
use proposal_core::render::ProposalRenderer;
use tracing::info;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "generate";
const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Clone, Debug, Default)]
pub struct GenerateArgs {
    pub project: String,
    pub customer: String,
    /// Text file holding the customer requirements, one per line.
    pub brief: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub step_delay_ms: Option<u64>,
}

pub fn run(args: GenerateArgs) -> CommandResult {
    let overrides = ConfigOverrides {
        output_path: args.output,
        template_path: args.template,
        step_delay_ms: args.step_delay_ms,
        ..ConfigOverrides::default()
    };
    let config = match load_config(COMMAND, overrides) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let requirements = match &args.brief {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    "brief_read",
                    format!("could not read brief `{}`: {error}", path.display()),
                    3,
                );
            }
        },
        None => String::new(),
    };
    let brief = ProposalBrief::new(args.project, args.customer, requirements);

    let orchestrator = match ProposalOrchestrator::from_config(&config) {
        Ok(orchestrator) => orchestrator.with_date(Local::now().format(DATE_FORMAT).to_string()),
        Err(error) => {
            return CommandResult::failure(COMMAND, "content_backend", format!("{error:#}"), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let content = match runtime.block_on(orchestrator.assemble(&brief)) {
        Ok(content) => content,
        Err(error) => {
            return CommandResult::failure(COMMAND, "content_generation", format!("{error:#}"), 4);
        }
    };

    let renderer = match ProposalRenderer::new(config.render.template_path.as_deref()) {
        Ok(renderer) => renderer,
        Err(error) => return CommandResult::failure(COMMAND, "template_load", error.to_string(), 4),
    };

    let output_path = config.render.output_path;
    match renderer.render_to_path(content, &output_path) {
        Ok(document) => {
            info!(
                event_name = "cli.generate.completed",
                backend = orchestrator.backend(),
                output = %output_path.display(),
                "generate command completed"
            );
            CommandResult::success(
                COMMAND,
                format!(
                    "generated proposal with the {} backend at `{}` ({} pages)",
                    orchestrator.backend(),
                    output_path.display(),
                    document.page_count()
                ),
            )
        }
        Err(error) => CommandResult::failure(COMMAND, "output_write", error.to_string(), 5),
    }
}
