use std::path::PathBuf;

use proposal_core::config::ConfigOverrides;
use proposal_core::template::builder::TemplateBuilder;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "template";
const FALLBACK_TEMPLATE_PATH: &str = "templates/proposal_template.docx";

#[derive(Clone, Debug, Default)]
pub struct TemplateArgs {
    /// Defaults to the configured `render.template_path`.
    pub output: Option<PathBuf>,
    pub font: Option<String>,
}

pub fn run(args: TemplateArgs) -> CommandResult {
    let config = match load_config(COMMAND, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let path = args
        .output
        .or(config.render.template_path)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_TEMPLATE_PATH));

    let mut builder = TemplateBuilder::default();
    if let Some(font) = args.font.filter(|font| !font.trim().is_empty()) {
        builder = builder.font_family(font.trim());
    }

    match builder.write(&path) {
        Ok(template) => CommandResult::success(
            COMMAND,
            format!(
                "wrote style template to `{}` ({} styles, table style `{}`)",
                path.display(),
                template.styles.len(),
                template.table_style.as_deref().unwrap_or("none")
            ),
        ),
        Err(error) => CommandResult::failure(
            COMMAND,
            "template_write",
            format!("could not write style template to `{}`: {error}", path.display()),
            4,
        ),
    }
}
