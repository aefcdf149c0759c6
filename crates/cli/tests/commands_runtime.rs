use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use image::{ImageFormat, RgbImage};

use proposal_cli::commands::generate::{self, GenerateArgs};
use proposal_cli::commands::render::{self, RenderArgs};
use proposal_cli::commands::template::{self, TemplateArgs};
use proposal_cli::commands::{config, doctor};
use proposal_core::template::Template;
use serde_json::Value;
use tempfile::TempDir;
use zip::ZipArchive;

const CONTENT: &str = r#"{
  "title": "IT Project Proposal - Data Platform",
  "subtitle": "Prepared for Contoso",
  "customer": "Contoso",
  "executive_summary": "Contoso needs a governed data platform.",
  "requirements": [{"id": "REQ-001", "description": "Nightly ingestion", "priority": "High"}],
  "in_scope": ["Ingestion pipelines"],
  "out_scope": ["Legacy decommissioning"],
  "resources": [{"activity": "Build", "role": "Engineer", "type": "Offshore", "days": 20, "unit_cost": "£400", "cost": "£8,000"}],
  "tasks": [{"name": "Discovery", "description": "Workshops", "role": "Architect", "effort": 5}]
}"#;

#[test]
fn render_writes_a_docx_package_from_content_json() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let content_path = dir.path().join("content.json");
        fs::write(&content_path, CONTENT).expect("content written");
        let output = dir.path().join("proposal.docx");

        let result = render::run(RenderArgs {
            content: content_path,
            output: Some(output.clone()),
            ..RenderArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected render success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "render");
        assert_eq!(payload["status"], "ok");
        assert!(payload["message"].as_str().unwrap_or_default().contains("10 pages"));

        let bytes = fs::read(&output).expect("output exists");
        assert!(bytes.starts_with(b"PK"), "docx output is a zip package");
    });
}

#[test]
fn render_rejects_malformed_content() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let content_path = dir.path().join("content.json");
        fs::write(&content_path, "{\"requirements\": ").expect("content written");

        let result = render::run(RenderArgs {
            content: content_path,
            output: Some(dir.path().join("proposal.docx")),
            ..RenderArgs::default()
        });
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "content_invalid");
    });
}

#[test]
fn render_reports_unwritable_output() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let content_path = dir.path().join("content.json");
        fs::write(&content_path, CONTENT).expect("content written");

        let result = render::run(RenderArgs {
            content: content_path,
            output: Some(dir.path().join("missing").join("proposal.docx")),
            ..RenderArgs::default()
        });
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "output_write");
    });
}

#[test]
fn explicit_diagram_wins_over_the_content_diagram() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let diagram = dir.path().join("architecture.png");
        RgbImage::new(64, 32).save_with_format(&diagram, ImageFormat::Png).expect("diagram written");

        let mut content: Value = serde_json::from_str(CONTENT).expect("content json");
        content["diagram"] = Value::from("/nonexistent/old.png");
        let content_path = dir.path().join("content.json");
        fs::write(&content_path, content.to_string()).expect("content written");
        let output = dir.path().join("proposal.docx");

        let result = render::run(RenderArgs {
            content: content_path,
            output: Some(output.clone()),
            diagram: Some(diagram),
            ..RenderArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected render success: {}", result.output);
        assert!(media_entries(&output).iter().any(|name| name.ends_with(".png")));
    });
}

#[test]
fn content_diagram_wins_over_the_configured_diagram() {
    with_env(&[("PROPOSAL_RENDER_DIAGRAM_PATH", "/nonexistent/configured.png")], || {
        let dir = TempDir::new().expect("temp dir");
        let diagram = dir.path().join("architecture.png");
        RgbImage::new(64, 32).save_with_format(&diagram, ImageFormat::Png).expect("diagram written");

        let mut content: Value = serde_json::from_str(CONTENT).expect("content json");
        content["diagram"] = Value::from(diagram.display().to_string());
        let content_path = dir.path().join("content.json");
        fs::write(&content_path, content.to_string()).expect("content written");
        let output = dir.path().join("proposal.docx");

        let result = render::run(RenderArgs {
            content: content_path,
            output: Some(output.clone()),
            ..RenderArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected render success: {}", result.output);
        assert_eq!(media_entries(&output).len(), 1);
    });
}

#[test]
fn render_uses_a_template_written_by_the_template_command() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let template_path = dir.path().join("styles").join("template.docx");

        let written = template::run(TemplateArgs {
            output: Some(template_path.clone()),
            font: Some("Calibri".to_string()),
        });
        assert_eq!(written.exit_code, 0, "expected template success: {}", written.output);
        assert_eq!(parse_payload(&written.output)["command"], "template");

        let loaded = Template::load(&template_path).expect("template reloads");
        assert_eq!(loaded.table_style.as_deref(), Some("ProposalTable"));

        let content_path = dir.path().join("content.json");
        fs::write(&content_path, CONTENT).expect("content written");
        let result = render::run(RenderArgs {
            content: content_path,
            template: Some(template_path),
            output: Some(dir.path().join("proposal.docx")),
            ..RenderArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected render success: {}", result.output);
    });
}

#[test]
fn generate_with_mock_backend_writes_a_document() {
    with_env(&[("PROPOSAL_CONTENT_BACKEND", "mock")], || {
        let dir = TempDir::new().expect("temp dir");
        let brief = dir.path().join("brief.txt");
        fs::write(&brief, "- Single sign-on\n- Nightly sync\n").expect("brief written");
        let output = dir.path().join("generated.docx");

        let result = generate::run(GenerateArgs {
            project: "CRM Integration".to_string(),
            customer: "Fabrikam".to_string(),
            brief: Some(brief),
            output: Some(output.clone()),
            step_delay_ms: Some(0),
            ..GenerateArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected generate success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "generate");
        assert!(payload["message"].as_str().unwrap_or_default().contains("mock backend"));
        assert!(output.exists());
    });
}

#[test]
fn generate_reports_missing_brief_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let result = generate::run(GenerateArgs {
            project: "CRM Integration".to_string(),
            customer: "Fabrikam".to_string(),
            brief: Some(dir.path().join("absent.txt")),
            output: Some(dir.path().join("generated.docx")),
            step_delay_ms: Some(0),
            ..GenerateArgs::default()
        });
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "brief_read");
    });
}

#[test]
fn generate_requires_an_api_key_for_the_openai_backend() {
    with_env(&[("PROPOSAL_CONTENT_BACKEND", "openai")], || {
        let dir = TempDir::new().expect("temp dir");
        let result = generate::run(GenerateArgs {
            project: "CRM Integration".to_string(),
            customer: "Fabrikam".to_string(),
            output: Some(dir.path().join("generated.docx")),
            step_delay_ms: Some(0),
            ..GenerateArgs::default()
        });
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().unwrap_or_default().contains("api_key"));
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_keys() {
    with_env(
        &[
            ("PROPOSAL_CONTENT_MODEL", "gpt-4o"),
            ("OPENAI_API_KEY", "sk-live-abcdef"),
        ],
        || {
            let output = config::run();

            assert!(output.starts_with("effective config"));
            assert!(output
                .contains("- content.model = gpt-4o (source: env (PROPOSAL_CONTENT_MODEL))"));
            assert!(output.contains("- content.api_key = sk-*** (source: env (OPENAI_API_KEY))"));
            assert!(output.contains("- server.port = 5000 (source: default)"));
            assert!(!output.contains("abcdef"));
        },
    );
}

#[test]
fn doctor_passes_with_default_configuration() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected doctor pass: {}", result.output);

        let report: Value = serde_json::from_str(&result.output).expect("doctor json");
        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        let names: Vec<&str> = checks.iter().filter_map(|check| check["name"].as_str()).collect();
        assert_eq!(
            names,
            ["config_validation", "template_availability", "output_directory", "content_backend"]
        );
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("PROPOSAL_CONTENT_BACKEND", "carrier-pigeon")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] content_backend"));
    });
}

fn media_entries(docx: &Path) -> Vec<String> {
    let file = fs::File::open(docx).expect("docx opens");
    let archive = ZipArchive::new(file).expect("docx is a zip package");
    archive.file_names().filter(|name| name.starts_with("word/media/")).map(String::from).collect()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PROPOSAL_RENDER_OUTPUT_PATH",
        "PROPOSAL_RENDER_TEMPLATE_PATH",
        "PROPOSAL_RENDER_DIAGRAM_PATH",
        "PROPOSAL_CONTENT_BACKEND",
        "PROPOSAL_CONTENT_API_KEY",
        "OPENAI_API_KEY",
        "PROPOSAL_CONTENT_BASE_URL",
        "PROPOSAL_CONTENT_MODEL",
        "PROPOSAL_CONTENT_TEMPERATURE",
        "PROPOSAL_CONTENT_TIMEOUT_SECS",
        "PROPOSAL_CONTENT_STEP_DELAY_MS",
        "PROPOSAL_SERVER_BIND_ADDRESS",
        "PROPOSAL_SERVER_PORT",
        "PROPOSAL_LOGGING_LEVEL",
        "PROPOSAL_LOGGING_FORMAT",
        "PROPOSAL_LOG_LEVEL",
        "PROPOSAL_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
