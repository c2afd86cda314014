//! Driving a wizard: start, show, submit, and the done handler

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::plan::{flag_value, WizardPlan, STAY_AT_CATALOG_FIELD, WORKFLOW_MANAGEMENT_STEP};
use super::state::{WizardFlags, WizardKey, WizardSession, WizardState};
use super::{WizardError, DASHBOARD_ATTRS_KEY, DEPLOYING_MESSAGE, GENERIC_FAILURE_MESSAGE};
use crate::api::{EnvironmentClient, PackageClient};
use crate::config::RedirectsConfig;
use crate::forms::{
    extract_attributes, insert_hidden_ids, FormSchemaProvider, StepData, StepDescriptor,
    WizardData, HIDDEN_KEY,
};
use crate::session::SessionStore;

/// Collaborators a wizard request needs
#[derive(Clone, Copy)]
pub struct WizardContext<'a> {
    pub packages: &'a dyn PackageClient,
    pub environments: &'a dyn EnvironmentClient,
    pub forms: &'a dyn FormSchemaProvider,
    pub redirects: &'a RedirectsConfig,
}

/// A step ready to be shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StepView {
    pub prefix: String,
    pub environment_id: String,
    pub environment_name: String,
    pub app_id: String,
    pub app_name: String,
    /// Fully qualified name of the application package
    pub app_type: String,
    pub step: StepDescriptor,
    pub index: usize,
    pub total: usize,
    #[schema(value_type = Object)]
    pub initial: Map<String, Value>,
    /// Validation errors by field name, empty on first display
    pub errors: BTreeMap<String, String>,
    pub flags: WizardFlags,
}

/// What a wizard request produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WizardResponse {
    /// Show (or re-show) a step
    Step(StepView),
    /// Component created; navigate to `location`
    Redirect { message: String, location: String },
    /// Component created; put `(component_id, name)` into the caller's field
    Inline {
        message: String,
        field: String,
        component_id: String,
        name: String,
    },
    /// Component creation failed; the wizard state is gone
    Failed {
        message: String,
        location: String,
        retryable: bool,
    },
}

impl WizardResponse {
    pub fn state(&self) -> WizardState {
        match self {
            WizardResponse::Step(view) => WizardState::Step {
                index: view.index,
                name: view.step.name.clone(),
            },
            WizardResponse::Redirect { .. } | WizardResponse::Inline { .. } => WizardState::Done,
            WizardResponse::Failed { .. } => WizardState::Aborted,
        }
    }
}

/// Initial values for `step`: the request context, the fields' own
/// initials, values answered for the same field name in earlier steps,
/// and finally this step's own earlier answers.
fn initial_values(
    plan: &WizardPlan,
    step: &StepDescriptor,
    data: &WizardData,
    environment_id: &str,
) -> Map<String, Value> {
    let mut initial = Map::new();

    for field in &step.fields {
        if field.name == "environment_id" {
            initial.insert(field.name.clone(), Value::String(environment_id.to_string()));
        } else if let Some(value) = &field.initial {
            initial.insert(field.name.clone(), value.clone());
        }
    }

    for earlier in plan.steps().iter().take_while(|s| s.name != step.name) {
        if let Some(answers) = data.get(&earlier.name) {
            for field in &step.fields {
                if let Some(value) = answers.get(&field.name) {
                    initial.insert(field.name.clone(), value.clone());
                }
            }
        }
    }

    if let Some(own) = data.get(&step.name) {
        for (k, v) in own {
            initial.insert(k.clone(), v.clone());
        }
    }

    initial
}

fn validate(step: &StepDescriptor, values: &StepData) -> BTreeMap<String, String> {
    step.fields
        .iter()
        .filter(|f| f.required && f.is_blank(values.get(&f.name)))
        .map(|f| (f.name.clone(), "This field is required.".to_string()))
        .collect()
}

async fn render_step(
    ctx: WizardContext<'_>,
    plan: &WizardPlan,
    wizard: &WizardSession,
    step: &StepDescriptor,
    errors: BTreeMap<String, String>,
    submitted: Option<&StepData>,
) -> Result<WizardResponse, WizardError> {
    let app = ctx.packages.get(&wizard.key.app_id).await?;
    let environment = ctx.environments.get(&wizard.key.environment_id).await?;

    let mut initial = initial_values(plan, step, &wizard.data, &wizard.key.environment_id);
    if let Some(values) = submitted {
        for (k, v) in values {
            initial.insert(k.clone(), v.clone());
        }
    }
    let (index, total) = plan.progress(&step.name, &wizard.data);

    Ok(WizardResponse::Step(StepView {
        prefix: wizard.key.prefix(),
        environment_id: environment.id,
        environment_name: environment.name,
        app_id: app.id,
        app_name: app.name,
        app_type: app.fully_qualified_name,
        step: step.clone(),
        index,
        total,
        initial,
        errors,
        flags: wizard.flags,
    }))
}

/// Open a fresh wizard at its first active step, replacing any state stored
/// under the same key.
pub async fn start<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    key: WizardKey,
    flags: WizardFlags,
    compensate_environment: bool,
) -> Result<WizardResponse, WizardError>
where
    S: SessionStore + Send + ?Sized,
{
    let plan = WizardPlan::recompute(ctx.forms, &key.app_id, flags.drop_wm_form).await?;
    let mut wizard = WizardSession::new(key, flags, compensate_environment);

    let first = plan
        .first_active(&wizard.data)
        .ok_or_else(|| WizardError::EmptyPlan {
            app_id: wizard.key.app_id.clone(),
        })?;
    wizard.current_step = Some(first.name.clone());
    wizard.save(store)?;

    debug!(
        "Started wizard {} at step {}",
        wizard.key.prefix(),
        first.name
    );
    render_step(ctx, &plan, &wizard, first, BTreeMap::new(), None).await
}

/// The step the wizard is currently on
pub async fn current<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    key: &WizardKey,
) -> Result<WizardResponse, WizardError>
where
    S: SessionStore + Send + ?Sized,
{
    let mut wizard =
        WizardSession::load(store, key)?.ok_or_else(|| WizardError::NotStarted {
            prefix: key.prefix(),
        })?;
    let plan = WizardPlan::recompute(ctx.forms, &key.app_id, wizard.flags.drop_wm_form).await?;

    let step = plan
        .resolve_current(wizard.current_step.as_deref(), &wizard.data)
        .ok_or_else(|| WizardError::EmptyPlan {
            app_id: key.app_id.clone(),
        })?;
    if wizard.current_step.as_deref() != Some(step.name.as_str()) {
        wizard.current_step = Some(step.name.clone());
        wizard.save(store)?;
    }

    render_step(ctx, &plan, &wizard, step, BTreeMap::new(), None).await
}

/// Submit the answers of `step`.
///
/// Missing required values re-present the step with errors and leave the
/// stored state alone. After the last active step the done handler runs;
/// `add_to_field` asks for an inline result instead of a catalog redirect.
pub async fn submit<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    key: &WizardKey,
    step_name: &str,
    values: StepData,
    add_to_field: Option<&str>,
) -> Result<WizardResponse, WizardError>
where
    S: SessionStore + Send + ?Sized,
{
    let mut wizard =
        WizardSession::load(store, key)?.ok_or_else(|| WizardError::NotStarted {
            prefix: key.prefix(),
        })?;
    let plan = WizardPlan::recompute(ctx.forms, &key.app_id, wizard.flags.drop_wm_form).await?;

    let step = plan
        .step(step_name)
        .ok_or_else(|| WizardError::UnknownStep {
            step: step_name.to_string(),
        })?;
    let expected = plan
        .resolve_current(wizard.current_step.as_deref(), &wizard.data)
        .map(|s| s.name.clone())
        .unwrap_or_default();
    if expected != step.name {
        return Err(WizardError::OutOfOrder {
            expected,
            got: step_name.to_string(),
        });
    }

    let errors = validate(step, &values);
    if !errors.is_empty() {
        debug!(
            "Step {} of wizard {} has {} invalid field(s)",
            step.name,
            key.prefix(),
            errors.len()
        );
        return render_step(ctx, &plan, &wizard, step, errors, Some(&values)).await;
    }

    wizard.data.insert(step.name.clone(), values);

    match plan.next_active_after(&step.name, &wizard.data) {
        Some(next) => {
            wizard.current_step = Some(next.name.clone());
            wizard.save(store)?;
            render_step(ctx, &plan, &wizard, next, BTreeMap::new(), None).await
        }
        None => Ok(complete(ctx, store, &plan, wizard, add_to_field).await),
    }
}

fn stamp_display_name(attributes: &mut Value, name: &str) {
    if let Some(root) = attributes.as_object_mut() {
        let hidden = root
            .entry(HIDDEN_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(hidden) = hidden.as_object_mut() {
            let storage = hidden
                .entry(DASHBOARD_ATTRS_KEY)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(storage) = storage.as_object_mut() {
                storage.insert("name".to_string(), Value::String(name.to_string()));
            }
        }
    }
}

/// Build the component attributes and the application's display name
async fn build_attributes(
    ctx: WizardContext<'_>,
    plan: &WizardPlan,
    wizard: &WizardSession,
) -> Result<(Value, String), WizardError> {
    let app = ctx.packages.get(&wizard.key.app_id).await?;
    let attributes = extract_attributes(
        plan.attribute_template(),
        &wizard.data,
        &plan.form_step_names(&wizard.data),
        &app.fully_qualified_name,
    );
    let mut attributes = insert_hidden_ids(attributes);
    stamp_display_name(&mut attributes, &app.name);
    Ok((attributes, app.name))
}

/// The done handler. Never fails: errors become a `Failed` response.
async fn complete<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    plan: &WizardPlan,
    wizard: WizardSession,
    add_to_field: Option<&str>,
) -> WizardResponse
where
    S: SessionStore + Send + ?Sized,
{
    let key = &wizard.key;
    WizardSession::clear(store, key);

    let do_redirect = wizard
        .data
        .get(WORKFLOW_MANAGEMENT_STEP)
        .map(|wm| !wm.get(STAY_AT_CATALOG_FIELD).is_some_and(flag_value))
        .unwrap_or(wizard.flags.do_redirect);

    let created = match build_attributes(ctx, plan, &wizard).await {
        Ok((attributes, app_name)) => ctx
            .environments
            .create_component(&key.environment_id, attributes.clone())
            .await
            .map(|component| (component, attributes, app_name))
            .map_err(WizardError::from),
        Err(e) => Err(e),
    };

    match created {
        Ok((component, attributes, app_name)) => {
            info!(
                "Added application {} to environment {} as component {}",
                app_name, key.environment_id, component.id
            );
            let message = format!(
                "The '{}' application successfully added to environment.",
                app_name
            );

            if do_redirect {
                return WizardResponse::Redirect {
                    message,
                    location: ctx.redirects.environment_services_url(&key.environment_id),
                };
            }
            match add_to_field {
                Some(field) => WizardResponse::Inline {
                    message,
                    field: field.to_string(),
                    component_id: component.id,
                    name: attributes
                        .get("name")
                        .and_then(Value::as_str)
                        .map_or(app_name, String::from),
                },
                None => WizardResponse::Redirect {
                    message,
                    location: ctx.redirects.catalog_index.clone(),
                },
            }
        }
        Err(e) => {
            warn!(
                "Failed to add application {} to environment {}: {}",
                key.app_id, key.environment_id, e
            );

            if wizard.compensate_environment {
                if let Err(delete_err) = ctx.environments.delete(&key.environment_id).await {
                    warn!(
                        "Failed to delete environment {} after failed deploy: {}",
                        key.environment_id, delete_err
                    );
                }
            }

            let forbidden = e.as_api().is_some_and(crate::api::ApiError::is_forbidden);
            WizardResponse::Failed {
                message: if forbidden {
                    DEPLOYING_MESSAGE.to_string()
                } else {
                    GENERIC_FAILURE_MESSAGE.to_string()
                },
                location: ctx.redirects.environments_index.clone(),
                retryable: forbidden,
            }
        }
    }
}
