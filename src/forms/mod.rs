//! Dynamic per-application forms.
//!
//! Wizard steps are not compiled in: every package ships a YAML UI
//! definition that is fetched again on each wizard request, so edits to a
//! package show up in wizards that are already in flight.

pub mod attributes;
pub mod schema;

pub use attributes::{extract_attributes, insert_hidden_ids, HIDDEN_KEY};
pub use schema::{FieldDescriptor, FieldType, SkipCondition, StepDescriptor, UiDefinition};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, PackageClient};

/// Submitted values of one step, by field name
pub type StepData = Map<String, Value>;

/// Submitted values of a whole wizard, by step name
pub type WizardData = BTreeMap<String, StepData>;

/// Decides whether a step is skipped given everything submitted so far
pub type SkipPredicate = Arc<dyn Fn(&str, &WizardData) -> bool + Send + Sync>;

/// Step used for packages that ship no UI definition
pub const DEFAULT_STEP_NAME: &str = "appConfiguration";

#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid UI definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid UI definition: {0}")]
    Invalid(String),
}

/// Steps, skip predicate and attribute template read from one version of a
/// UI definition
pub struct FormSchema {
    pub steps: Vec<StepDescriptor>,
    pub skip: SkipPredicate,
    pub template: Option<Value>,
}

impl From<UiDefinition> for FormSchema {
    fn from(ui: UiDefinition) -> Self {
        Self {
            skip: skip_predicate_for(&ui.steps),
            steps: ui.steps,
            template: ui.application,
        }
    }
}

/// Source of the per-application wizard schema
#[async_trait]
pub trait FormSchemaProvider: Send + Sync {
    /// The whole schema at once.
    ///
    /// Providers that can read the definition in one go should override this
    /// so a request never mixes parts of two versions.
    async fn get_schema(&self, app_id: &str) -> Result<FormSchema, FormError> {
        Ok(FormSchema {
            steps: self.get_steps(app_id).await?,
            skip: self.get_skip_predicate(app_id).await?,
            template: self.attribute_template(app_id).await?,
        })
    }

    /// Ordered steps for the application's wizard
    async fn get_steps(&self, app_id: &str) -> Result<Vec<StepDescriptor>, FormError>;

    /// Predicate telling which steps to skip for the current answers
    async fn get_skip_predicate(&self, app_id: &str) -> Result<SkipPredicate, FormError>;

    /// Attribute template, if the application defines one
    async fn attribute_template(&self, app_id: &str) -> Result<Option<Value>, FormError>;
}

/// Build a skip predicate from the steps' `skipWhen` conditions
pub fn skip_predicate_for(steps: &[StepDescriptor]) -> SkipPredicate {
    let conditions: Vec<(String, SkipCondition)> = steps
        .iter()
        .filter_map(|s| s.skip_when.clone().map(|c| (s.name.clone(), c)))
        .collect();

    Arc::new(move |step: &str, data: &WizardData| {
        conditions.iter().any(|(name, cond)| {
            name == step
                && data
                    .get(&cond.step)
                    .and_then(|values| values.get(&cond.field))
                    .is_some_and(|value| value == &cond.equals)
        })
    })
}

/// Reads UI definitions from the package catalog
pub struct PackageFormProvider {
    packages: Arc<dyn PackageClient>,
}

impl PackageFormProvider {
    pub fn new(packages: Arc<dyn PackageClient>) -> Self {
        Self { packages }
    }

    async fn load(&self, app_id: &str) -> Result<UiDefinition, FormError> {
        match self.packages.ui_definition(app_id).await? {
            Some(yaml) => UiDefinition::from_yaml(&yaml),
            None => {
                debug!("Package {} has no UI definition, using default form", app_id);
                let package = self.packages.get(app_id).await?;
                Ok(UiDefinition {
                    version: None,
                    application: None,
                    steps: vec![default_step(&package.name)],
                })
            }
        }
    }
}

/// Single step asking for the instance name only
pub fn default_step(app_name: &str) -> StepDescriptor {
    StepDescriptor {
        name: DEFAULT_STEP_NAME.to_string(),
        title: Some(format!("Configure {}", app_name)),
        fields: vec![FieldDescriptor {
            name: "name".to_string(),
            field_type: FieldType::String,
            label: Some("Application Name".to_string()),
            description: None,
            required: true,
            initial: Some(Value::String(app_name.to_string())),
            choices: Vec::new(),
        }],
        skip_when: None,
    }
}

#[async_trait]
impl FormSchemaProvider for PackageFormProvider {
    async fn get_schema(&self, app_id: &str) -> Result<FormSchema, FormError> {
        Ok(self.load(app_id).await?.into())
    }

    async fn get_steps(&self, app_id: &str) -> Result<Vec<StepDescriptor>, FormError> {
        Ok(self.load(app_id).await?.steps)
    }

    async fn get_skip_predicate(&self, app_id: &str) -> Result<SkipPredicate, FormError> {
        let ui = self.load(app_id).await?;
        Ok(skip_predicate_for(&ui.steps))
    }

    async fn attribute_template(&self, app_id: &str) -> Result<Option<Value>, FormError> {
        Ok(self.load(app_id).await?.application)
    }
}
