use std::path::PathBuf;

use proposal_core::config::ConfigOverrides;
use proposal_core::domain::content::ContentSchema;
use proposal_core::render::ProposalRenderer;
use tracing::info;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "render";

#[derive(Clone, Debug, Default)]
pub struct RenderArgs {
    pub content: PathBuf,
    pub template: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub diagram: Option<PathBuf>,
}

/// An explicit `--diagram` wins over the content's own diagram, which wins over
/// the configured `render.diagram_path`.
pub fn run(args: RenderArgs) -> CommandResult {
    let explicit_diagram = args.diagram.clone();
    let overrides = ConfigOverrides {
        output_path: args.output,
        template_path: args.template,
        diagram_path: args.diagram,
        ..ConfigOverrides::default()
    };
    let config = match load_config(COMMAND, overrides) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let mut content = match ContentSchema::from_json_file(&args.content) {
        Ok(content) => content,
        Err(error) => return CommandResult::failure(COMMAND, "content_invalid", error.to_string(), 3),
    };
    content.diagram = explicit_diagram
        .or_else(|| content.diagram.take())
        .or_else(|| config.render.diagram_path.clone());

    let renderer = match ProposalRenderer::new(config.render.template_path.as_deref()) {
        Ok(renderer) => renderer,
        Err(error) => return CommandResult::failure(COMMAND, "template_load", error.to_string(), 4),
    };

    let output_path = config.render.output_path;
    match renderer.render_to_path(content, &output_path) {
        Ok(document) => {
            info!(
                event_name = "cli.render.completed",
                content = %args.content.display(),
                output = %output_path.display(),
                "render command completed"
            );
            CommandResult::success(
                COMMAND,
                format!(
                    "wrote proposal to `{}` ({} pages)",
                    output_path.display(),
                    document.page_count()
                ),
            )
        }
        Err(error) => CommandResult::failure(COMMAND, "output_write", error.to_string(), 5),
    }
}
