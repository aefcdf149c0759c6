pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use proposal_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

use crate::commands::generate::GenerateArgs;
use crate::commands::render::RenderArgs;
use crate::commands::template::TemplateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "proposal",
    about = "IT project proposal generator",
    long_about = "Render structured proposal content into a styled Word document, build the style template, and inspect runtime configuration.",
    after_help = "Examples:\n  proposal render --content content.json --output proposal.docx\n  proposal generate --project \"CRM Integration\" --customer Fabrikam --brief brief.txt\n  proposal doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Render a content JSON file into a .docx proposal")]
    Render {
        #[arg(long, help = "Path to the content JSON file")]
        content: PathBuf,
        #[arg(long, help = "Style template (.docx); defaults to render.template_path")]
        template: Option<PathBuf>,
        #[arg(long, help = "Output path; defaults to render.output_path")]
        output: Option<PathBuf>,
        #[arg(long, help = "Architecture diagram image embedded in the solution summary")]
        diagram: Option<PathBuf>,
    },
    #[command(about = "Write the branded style template document")]
    Template {
        #[arg(long, help = "Output path; defaults to render.template_path")]
        output: Option<PathBuf>,
        #[arg(long, help = "Font family used by every style")]
        font: Option<String>,
    },
    #[command(about = "Draft proposal content with the configured backend and render it")]
    Generate {
        #[arg(long, help = "Project name")]
        project: String,
        #[arg(long, help = "Customer name")]
        customer: String,
        #[arg(long, help = "Text file with the customer requirements, one per line")]
        brief: Option<PathBuf>,
        #[arg(long, help = "Output path; defaults to render.output_path")]
        output: Option<PathBuf>,
        #[arg(long, help = "Style template (.docx); defaults to render.template_path")]
        template: Option<PathBuf>,
        #[arg(long, help = "Pause between section requests in milliseconds")]
        step_delay_ms: Option<u64>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(
        about = "Validate config, template availability, output directory, and content backend"
    )]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Render { content, template, output, diagram } => {
            commands::render::run(RenderArgs { content, template, output, diagram })
        }
        Command::Template { output, font } => {
            commands::template::run(TemplateArgs { output, font })
        }
        Command::Generate { project, customer, brief, output, template, step_delay_ms } => {
            commands::generate::run(GenerateArgs {
                project,
                customer,
                brief,
                output,
                template,
                step_delay_ms,
            })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command outcome. A config
/// that fails to load falls back to default logging; the command itself
/// reports the failure.
fn init_logging() {
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    let level = logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
