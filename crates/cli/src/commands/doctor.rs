use std::fs;
use std::path::Path;

use proposal_core::config::{AppConfig, ContentBackend, LoadOptions};
use proposal_core::template::Template;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_template(&config));
            checks.push(check_output_directory(&config));
            checks.push(check_content_backend(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["template_availability", "output_directory", "content_backend"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_template(config: &AppConfig) -> DoctorCheck {
    let name = "template_availability";
    let Some(path) = config.render.template_path.as_deref() else {
        return DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: "no template configured; built-in styles are used".to_string(),
        };
    };

    if !path.exists() {
        return DoctorCheck {
            name,
            status: CheckStatus::Warn,
            details: format!(
                "`{}` not found; built-in styles are used (run `proposal template` to create it)",
                path.display()
            ),
        };
    }

    match Template::load(path) {
        Ok(template) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!(
                "`{}` loaded with {} styles, table style `{}`",
                path.display(),
                template.styles.len(),
                template.table_style.as_deref().unwrap_or("TableGrid")
            ),
        },
        Err(error) => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("`{}` is not a usable template: {error}", path.display()),
        },
    }
}

fn check_output_directory(config: &AppConfig) -> DoctorCheck {
    let name = "output_directory";
    let directory = config
        .render
        .output_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    match fs::metadata(directory) {
        Ok(metadata) if !metadata.is_dir() => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("`{}` is not a directory", directory.display()),
        },
        Ok(metadata) if metadata.permissions().readonly() => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("`{}` is read-only", directory.display()),
        },
        Ok(_) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("`{}` is writable", directory.display()),
        },
        Err(error) => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("`{}` is not accessible: {error}", directory.display()),
        },
    }
}

fn check_content_backend(config: &AppConfig) -> DoctorCheck {
    let name = "content_backend";
    match config.content.backend {
        ContentBackend::Mock => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: "mock backend selected; no credentials required".to_string(),
        },
        ContentBackend::OpenAi => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!(
                "openai backend selected with model `{}` at `{}`",
                config.content.model, config.content.base_url
            ),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
