//! Wizard plan: the ordered steps and skip predicate of one application.
//!
//! A plan is rebuilt from the form schema at the top of every wizard request
//! and never stored, so a UI definition edited mid-wizard takes effect on the
//! next request.

use serde_json::{json, Value};

use crate::forms::{
    FieldDescriptor, FieldType, FormError, FormSchema, FormSchemaProvider, SkipPredicate,
    StepDescriptor, WizardData,
};

/// Name of the trailing step asking whether to stay in the catalog
pub const WORKFLOW_MANAGEMENT_STEP: &str = "workflowManagement";

/// Boolean field of the workflow-management step
pub const STAY_AT_CATALOG_FIELD: &str = "StayAtCatalog";

/// Synthetic last step of every wizard opened from the catalog
pub fn workflow_management_step() -> StepDescriptor {
    StepDescriptor {
        name: WORKFLOW_MANAGEMENT_STEP.to_string(),
        title: Some("Workflow Management".to_string()),
        fields: vec![FieldDescriptor {
            name: STAY_AT_CATALOG_FIELD.to_string(),
            field_type: FieldType::Boolean,
            label: Some("Continue application adding".to_string()),
            description: Some(
                "Stay in the catalog to add more applications to this environment".to_string(),
            ),
            required: false,
            initial: Some(json!(false)),
            choices: Vec::new(),
        }],
        skip_when: None,
    }
}

pub struct WizardPlan {
    steps: Vec<StepDescriptor>,
    skip: SkipPredicate,
    template: Option<Value>,
}

impl WizardPlan {
    /// Fetch the current schema for `app_id` in one read
    pub async fn recompute(
        forms: &dyn FormSchemaProvider,
        app_id: &str,
        drop_wm_form: bool,
    ) -> Result<Self, FormError> {
        let schema = forms.get_schema(app_id).await?;
        Ok(Self::from_schema(schema, drop_wm_form))
    }

    pub fn from_schema(schema: FormSchema, drop_wm_form: bool) -> Self {
        let mut plan = Self::new(schema.steps, schema.skip, drop_wm_form);
        plan.template = schema.template;
        plan
    }

    pub fn new(mut steps: Vec<StepDescriptor>, skip: SkipPredicate, drop_wm_form: bool) -> Self {
        if !drop_wm_form && !steps.iter().any(|s| s.name == WORKFLOW_MANAGEMENT_STEP) {
            steps.push(workflow_management_step());
        }
        Self {
            steps,
            skip,
            template: None,
        }
    }

    /// Attribute template read together with the steps
    pub fn attribute_template(&self) -> Option<&Value> {
        self.template.as_ref()
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    pub fn is_active(&self, name: &str, data: &WizardData) -> bool {
        !(self.skip)(name, data)
    }

    /// Steps not skipped for the answers given so far
    pub fn active_steps<'a>(&'a self, data: &'a WizardData) -> impl Iterator<Item = &'a StepDescriptor> {
        self.steps.iter().filter(move |s| self.is_active(&s.name, data))
    }

    pub fn first_active<'a>(&'a self, data: &'a WizardData) -> Option<&'a StepDescriptor> {
        self.active_steps(data).next()
    }

    /// First active step after `name`, or `None` when `name` was the last one
    pub fn next_active_after(&self, name: &str, data: &WizardData) -> Option<&StepDescriptor> {
        let start = self.position(name)? + 1;
        self.steps[start..]
            .iter()
            .find(|s| self.is_active(&s.name, data))
    }

    /// Step the user should see given the stored current step.
    ///
    /// The stored step wins while it is still in the plan and active.
    /// Otherwise the first active step without answers is used, then the last
    /// active step.
    pub fn resolve_current<'a>(
        &'a self,
        stored: Option<&str>,
        data: &'a WizardData,
    ) -> Option<&'a StepDescriptor> {
        if let Some(step) = stored
            .and_then(|name| self.step(name))
            .filter(|s| self.is_active(&s.name, data))
        {
            return Some(step);
        }
        self.active_steps(data)
            .find(|s| !data.contains_key(&s.name))
            .or_else(|| self.active_steps(data).last())
    }

    /// Zero-based position of `name` among the active steps, and their count
    pub fn progress(&self, name: &str, data: &WizardData) -> (usize, usize) {
        let active: Vec<&str> = self.active_steps(data).map(|s| s.name.as_str()).collect();
        let index = active.iter().position(|s| *s == name).unwrap_or(0);
        (index, active.len())
    }

    /// Names of the active steps that feed component attributes
    pub fn form_step_names(&self, data: &WizardData) -> Vec<String> {
        self.active_steps(data)
            .filter(|s| s.name != WORKFLOW_MANAGEMENT_STEP)
            .map(|s| s.name.clone())
            .collect()
    }
}

/// Read a wizard flag the way form posts send them (`true`, `"true"`, `"True"`)
pub fn flag_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
