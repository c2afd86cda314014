//! Form step and field descriptors, and the YAML UI definition they come from.
//!
//! A package's UI definition looks like:
//!
//! ```yaml
//! Version: 2
//! Application:
//!   "?": {type: io.murano.apps.Apache}
//!   name: $.appConfiguration.name
//! Forms:
//!   - appConfiguration:
//!       fields:
//!         - {name: name, type: string, label: Application Name}
//!   - instanceConfiguration:
//!       skipWhen: {step: appConfiguration, field: advanced, equals: false}
//!       fields:
//!         - {name: flavor, type: choice, choices: [m1.small, m1.large]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use utoipa::ToSchema;

use super::FormError;

/// Kind of input a field takes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Password,
    Integer,
    Boolean,
    Choice,
    Text,
}

/// One input of a wizard step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub initial: Option<Value>,
    #[serde(default)]
    pub choices: Vec<String>,
}

fn default_required() -> bool {
    true
}

impl FieldDescriptor {
    /// True if `value` counts as "not answered" for a required field
    pub fn is_blank(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            // An unchecked box (false) is a valid answer
            Some(_) => false,
        }
    }
}

/// Skip a step when an earlier answer equals a given value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkipCondition {
    pub step: String,
    pub field: String,
    #[schema(value_type = Object)]
    pub equals: Value,
}

/// One page of a deployment wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StepDescriptor {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, rename = "skipWhen")]
    pub skip_when: Option<SkipCondition>,
}

impl StepDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
    #[serde(default, rename = "skipWhen")]
    skip_when: Option<SkipCondition>,
}

#[derive(Deserialize)]
struct RawUiDefinition {
    #[serde(rename = "Version", default)]
    version: Option<Value>,
    #[serde(rename = "Application", default)]
    application: Option<Value>,
    #[serde(rename = "Forms", default)]
    forms: Vec<BTreeMap<String, RawStep>>,
}

/// Parsed UI definition of one package
#[derive(Debug, Clone, PartialEq)]
pub struct UiDefinition {
    pub version: Option<Value>,
    /// Attribute template with `$.<step>.<field>` references
    pub application: Option<Value>,
    pub steps: Vec<StepDescriptor>,
}

impl UiDefinition {
    pub fn from_yaml(yaml: &str) -> Result<Self, FormError> {
        let raw: RawUiDefinition = serde_yaml::from_str(yaml)?;

        let mut steps = Vec::new();
        for entry in raw.forms {
            if entry.len() != 1 {
                return Err(FormError::Invalid(format!(
                    "each Forms entry must name exactly one step, found {}",
                    entry.len()
                )));
            }
            for (name, step) in entry {
                steps.push(StepDescriptor {
                    name,
                    title: step.title,
                    fields: step.fields,
                    skip_when: step.skip_when,
                });
            }
        }

        let definition = Self {
            version: raw.version,
            application: raw.application,
            steps,
        };
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), FormError> {
        if self.steps.is_empty() {
            return Err(FormError::Invalid("UI definition has no forms".to_string()));
        }

        let mut step_names = HashSet::new();
        for step in &self.steps {
            if !step_names.insert(step.name.as_str()) {
                return Err(FormError::Invalid(format!(
                    "duplicate step '{}'",
                    step.name
                )));
            }
            let mut field_names = HashSet::new();
            for field in &step.fields {
                if !field_names.insert(field.name.as_str()) {
                    return Err(FormError::Invalid(format!(
                        "duplicate field '{}' in step '{}'",
                        field.name, step.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const APACHE_UI: &str = r#"
Version: 2
Application:
  "?":
    type: io.murano.apps.Apache
  name: $.appConfiguration.name
  instance:
    "?":
      type: io.murano.resources.LinuxInstance
    flavor: $.instanceConfiguration.flavor
Forms:
  - appConfiguration:
      title: Configure
      fields:
        - name: name
          label: Application Name
          initial: Apache
        - name: advanced
          type: boolean
          required: false
  - instanceConfiguration:
      skipWhen:
        step: appConfiguration
        field: advanced
        equals: false
      fields:
        - name: flavor
          type: choice
          choices: [m1.small, m1.large]
"#;

    #[test]
    fn test_parse_steps_in_order() {
        let ui = UiDefinition::from_yaml(APACHE_UI).unwrap();
        let names: Vec<&str> = ui.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["appConfiguration", "instanceConfiguration"]);

        let first = &ui.steps[0];
        assert_eq!(first.title.as_deref(), Some("Configure"));
        assert!(first.field("name").unwrap().required);
        assert_eq!(first.field("name").unwrap().initial, Some(json!("Apache")));
        assert_eq!(first.field("advanced").unwrap().field_type, FieldType::Boolean);
        assert!(!first.field("advanced").unwrap().required);
    }

    #[test]
    fn test_parse_skip_condition_and_template() {
        let ui = UiDefinition::from_yaml(APACHE_UI).unwrap();
        let skip = ui.steps[1].skip_when.as_ref().unwrap();
        assert_eq!(skip.step, "appConfiguration");
        assert_eq!(skip.equals, json!(false));

        let app = ui.application.unwrap();
        assert_eq!(app["?"]["type"], json!("io.murano.apps.Apache"));
        assert_eq!(app["instance"]["flavor"], json!("$.instanceConfiguration.flavor"));
        assert_eq!(ui.version, Some(json!(2)));
    }

    #[test]
    fn test_empty_forms_rejected() {
        let err = UiDefinition::from_yaml("Version: 2\nForms: []\n").unwrap_err();
        assert!(matches!(err, FormError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let yaml = "Forms:\n  - a: {fields: []}\n  - a: {fields: []}\n";
        let err = UiDefinition::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate step 'a'"));
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let err = UiDefinition::from_yaml("Forms: [").unwrap_err();
        assert!(matches!(err, FormError::Yaml(_)));
    }

    #[test]
    fn test_blank_detection() {
        let field = FieldDescriptor {
            name: "n".to_string(),
            field_type: FieldType::String,
            label: None,
            description: None,
            required: true,
            initial: None,
            choices: Vec::new(),
        };
        assert!(field.is_blank(None));
        assert!(field.is_blank(Some(&json!("  "))));
        assert!(!field.is_blank(Some(&json!("x"))));
        assert!(!field.is_blank(Some(&json!(false))));
        assert!(!field.is_blank(Some(&json!(0))));
    }
}
