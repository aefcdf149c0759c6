use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ContentError;

pub const DEFAULT_TITLE: &str = "IT Project Proposal";
pub const DEFAULT_LICENSING: &str = "No additional licensing required";

/// Everything one proposal document carries.
///
/// Produced once by the upstream content pipeline (or read from a JSON file)
/// and handed to the renderer by value. Absent sequences deserialize as empty
/// and absent cells as empty strings, so partially filled content still renders.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSchema {
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub subtitle: String,
    #[serde(deserialize_with = "optional_text")]
    pub customer: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub date: Option<String>,
    #[serde(deserialize_with = "text")]
    pub executive_summary: String,
    #[serde(deserialize_with = "rows")]
    pub requirements: Vec<Requirement>,
    #[serde(deserialize_with = "text_list")]
    pub in_scope: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub out_scope: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub solution_summary: String,
    pub diagram: Option<PathBuf>,
    #[serde(deserialize_with = "text_list")]
    pub standard_deliverables: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub project_specific_deliverables: Vec<String>,
    #[serde(deserialize_with = "rows")]
    pub resources: Vec<Resource>,
    #[serde(deserialize_with = "rows")]
    pub licenses: Vec<License>,
    #[serde(deserialize_with = "text")]
    pub licensing: String,
    #[serde(deserialize_with = "text_list")]
    pub risks: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub assumptions: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub issues: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub dependencies: Vec<String>,
    #[serde(deserialize_with = "rows")]
    pub tasks: Vec<Task>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    #[serde(alias = "requirement", deserialize_with = "cell")]
    pub id: String,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub priority: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    #[serde(deserialize_with = "cell")]
    pub activity: String,
    #[serde(alias = "role_type", deserialize_with = "cell")]
    pub role: String,
    #[serde(rename = "type", deserialize_with = "cell")]
    pub kind: String,
    #[serde(alias = "days", deserialize_with = "cell")]
    pub quantity: String,
    #[serde(deserialize_with = "cell")]
    pub unit_cost: String,
    #[serde(alias = "cost", deserialize_with = "cell")]
    pub total_cost: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    #[serde(deserialize_with = "cell")]
    pub name: String,
    #[serde(deserialize_with = "cell")]
    pub quantity: String,
    #[serde(deserialize_with = "cell")]
    pub cost: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    #[serde(alias = "name", deserialize_with = "cell")]
    pub task: String,
    #[serde(deserialize_with = "cell")]
    pub description: String,
    #[serde(deserialize_with = "cell")]
    pub role: String,
    /// Effort in days.
    #[serde(deserialize_with = "days")]
    pub effort: Option<f64>,
}

impl ContentSchema {
    pub fn from_json_str(raw: &str) -> Result<Self, ContentError> {
        let content: Self =
            serde_json::from_str(raw).map_err(|error| ContentError::Parse(error.to_string()))?;
        content.validate()?;
        Ok(content)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path).map_err(|error| ContentError::ReadFile {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        for (index, task) in self.tasks.iter().enumerate() {
            if let Some(effort) = task.effort {
                if !effort.is_finite() || effort < 0.0 {
                    return Err(ContentError::InvalidField {
                        field: format!("tasks[{index}].effort"),
                        reason: format!("expected a non-negative number of days, found {effort}"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn display_title(&self) -> &str {
        non_empty_or(&self.title, DEFAULT_TITLE)
    }

    pub fn display_licensing(&self) -> &str {
        non_empty_or(&self.licensing, DEFAULT_LICENSING)
    }
}

impl Requirement {
    pub fn cells(&self) -> Vec<String> {
        vec![self.id.clone(), self.description.clone(), self.priority.clone()]
    }
}

impl Resource {
    /// Role followed by the engagement type, e.g. `Architect (Onshore)`.
    pub fn role_type(&self) -> String {
        match (self.role.trim(), self.kind.trim()) {
            (role, "") => role.to_string(),
            ("", kind) => format!("({kind})"),
            (role, kind) => format!("{role} ({kind})"),
        }
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.activity.clone(),
            self.role_type(),
            self.quantity.clone(),
            self.unit_cost.clone(),
            self.total_cost.clone(),
        ]
    }
}

impl License {
    pub fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.quantity.clone(), self.cost.clone()]
    }
}

impl Task {
    pub fn effort_label(&self) -> String {
        self.effort.map(format_number).unwrap_or_default()
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.task.clone(),
            self.description.clone(),
            self.role.clone(),
            self.effort_label(),
        ]
    }
}

pub(crate) fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Integral day counts render without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn coerce(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                integer.to_string()
            } else if let Some(integer) = number.as_u64() {
                integer.to_string()
            } else {
                number.as_f64().map(format_number).unwrap_or_default()
            }
        }
        other => other.to_string(),
    }
}

fn cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(coerce)
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    cell(deserializer)
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = cell(deserializer)?;
    Ok(if value.trim().is_empty() { None } else { Some(value) })
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.into_iter().map(coerce).collect()),
        Value::String(single) => Ok(vec![single]),
        other => Err(de::Error::custom(format!("expected a list of text items, found {other}"))),
    }
}

fn rows<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> Deserialize<'a>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(de::Error::custom))
            .collect(),
        other => Err(de::Error::custom(format!("expected a list of rows, found {other}"))),
    }
}

fn days<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(raw) if raw.trim().is_empty() => Ok(None),
        Value::String(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a number of days, found `{raw}`"))),
        other => Err(de::Error::custom(format!("expected a number of days, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentSchema, Resource, Task, DEFAULT_LICENSING, DEFAULT_TITLE};
    use crate::errors::ContentError;

    #[test]
    fn empty_object_parses_to_empty_schema() {
        let content = ContentSchema::from_json_str("{}").expect("empty object should parse");

        assert_eq!(content, ContentSchema::default());
        assert_eq!(content.display_title(), DEFAULT_TITLE);
        assert_eq!(content.display_licensing(), DEFAULT_LICENSING);
    }

    #[test]
    fn upstream_aliases_are_accepted() {
        let content = ContentSchema::from_json_str(
            r#"{
                "requirements": [{"requirement": "REQ-1", "description": "Single sign-on"}],
                "resources": [{"activity": "Build", "role_type": "Engineer", "days": 10, "cost": "£5,000"}],
                "tasks": [{"name": "Design", "effort": "3"}]
            }"#,
        )
        .expect("aliased content should parse");

        assert_eq!(content.requirements[0].id, "REQ-1");
        assert_eq!(content.requirements[0].priority, "");
        assert_eq!(content.resources[0].role, "Engineer");
        assert_eq!(content.resources[0].quantity, "10");
        assert_eq!(content.resources[0].total_cost, "£5,000");
        assert_eq!(content.tasks[0].task, "Design");
        assert_eq!(content.tasks[0].effort, Some(3.0));
    }

    #[test]
    fn cells_coerce_scalars_to_text() {
        let content = ContentSchema::from_json_str(
            r#"{
                "title": null,
                "in_scope": ["Portal", 42, null],
                "licenses": [{"name": "Gateway", "quantity": 2.5, "cost": true}]
            }"#,
        )
        .expect("scalar cells should coerce");

        assert_eq!(content.title, "");
        assert_eq!(content.in_scope, vec!["Portal", "42", ""]);
        assert_eq!(content.licenses[0].quantity, "2.5");
        assert_eq!(content.licenses[0].cost, "true");
    }

    #[test]
    fn negative_effort_fails_validation() {
        let error = ContentSchema::from_json_str(r#"{"tasks": [{"task": "Test", "effort": -1}]}"#)
            .expect_err("negative effort should be rejected");

        assert!(matches!(
            error,
            ContentError::InvalidField { ref field, .. } if field == "tasks[0].effort"
        ));
    }

    #[test]
    fn non_numeric_effort_is_a_parse_error() {
        let error = ContentSchema::from_json_str(r#"{"tasks": [{"task": "Test", "effort": "lots"}]}"#)
            .expect_err("non-numeric effort should be rejected");

        assert!(matches!(error, ContentError::Parse(ref message) if message.contains("lots")));
    }

    #[test]
    fn role_type_joins_role_and_engagement_type() {
        let mut resource = Resource { role: "Architect".to_string(), ..Resource::default() };
        assert_eq!(resource.role_type(), "Architect");

        resource.kind = "Onshore".to_string();
        assert_eq!(resource.role_type(), "Architect (Onshore)");
    }

    #[test]
    fn effort_label_drops_fraction_for_whole_days() {
        let whole = Task { effort: Some(5.0), ..Task::default() };
        let partial = Task { effort: Some(2.5), ..Task::default() };
        let missing = Task::default();

        assert_eq!(whole.effort_label(), "5");
        assert_eq!(partial.effort_label(), "2.5");
        assert_eq!(missing.effort_label(), "");
    }
}
