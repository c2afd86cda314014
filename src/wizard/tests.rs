//! Tests for the wizard module

use std::sync::Arc;

use serde_json::{json, Value};

use crate::api::{ApiError, Environment, InMemoryBackend, Package, SeedData};
use crate::catalog::{RecentApps, LATEST_APPS_KEY};
use crate::config::RedirectsConfig;
use crate::forms::{PackageFormProvider, StepData};
use crate::session::{MemorySession, SessionStore, SessionStoreExt};

use super::*;

const APACHE_UI: &str = r#"
Version: 2
Application:
  "?":
    type: io.murano.apps.Apache
  name: $.appConfiguration.name
  flavor: $.instanceConfiguration.flavor
Forms:
  - appConfiguration:
      fields:
        - name: name
          initial: Apache
        - name: advanced
          type: boolean
          required: false
  - instanceConfiguration:
      skipWhen: {step: appConfiguration, field: advanced, equals: false}
      fields:
        - name: flavor
          type: choice
          choices: [m1.small, m1.large]
        - name: name
          required: false
"#;

fn package(id: &str, name: &str) -> Package {
    Package {
        id: id.to_string(),
        name: name.to_string(),
        fully_qualified_name: format!("io.murano.apps.{}", name),
        description: String::new(),
        author: None,
        categories: Vec::new(),
        tags: Vec::new(),
        package_type: "Application".to_string(),
        enabled: true,
        is_public: true,
    }
}

struct Fixture {
    backend: Arc<InMemoryBackend>,
    forms: PackageFormProvider,
    redirects: RedirectsConfig,
}

impl Fixture {
    fn new() -> Self {
        let mut seed = SeedData {
            packages: vec![package("a1", "Apache"), package("a2", "MySql")],
            environments: vec![Environment {
                id: "e1".to_string(),
                name: "dev".to_string(),
                status: "ready".to_string(),
            }],
            ..Default::default()
        };
        seed.ui_definitions
            .insert("a1".to_string(), APACHE_UI.to_string());

        let backend = Arc::new(InMemoryBackend::new(seed));
        Self {
            forms: PackageFormProvider::new(backend.clone()),
            backend,
            redirects: RedirectsConfig::default(),
        }
    }

    fn ctx(&self) -> WizardContext<'_> {
        WizardContext {
            packages: &*self.backend,
            environments: &*self.backend,
            forms: &self.forms,
            redirects: &self.redirects,
        }
    }
}

fn values(value: Value) -> StepData {
    value.as_object().unwrap().clone()
}

fn step_view(response: WizardResponse) -> StepView {
    match response {
        WizardResponse::Step(view) => view,
        other => panic!("expected a step, got {:?}", other),
    }
}

fn no_wm() -> WizardFlags {
    WizardFlags {
        do_redirect: false,
        drop_wm_form: true,
    }
}

#[tokio::test]
async fn test_start_shows_first_step() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");

    let view = step_view(
        start(fx.ctx(), &mut store, key.clone(), WizardFlags::default(), false)
            .await
            .unwrap(),
    );

    assert_eq!(view.step.name, "appConfiguration");
    assert_eq!(view.prefix, "wizard_e1_a1");
    assert_eq!(view.environment_name, "dev");
    assert_eq!(view.app_type, "io.murano.apps.Apache");
    assert_eq!(view.initial["name"], json!("Apache"));
    // Both form steps plus the workflow-management step
    assert_eq!((view.index, view.total), (0, 3));

    let saved = WizardSession::load(&store, &key).unwrap().unwrap();
    assert_eq!(saved.current_step.as_deref(), Some("appConfiguration"));
}

#[tokio::test]
async fn test_missing_required_field_keeps_state() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");
    start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
        .await
        .unwrap();
    let before = WizardSession::load(&store, &key).unwrap();

    let view = step_view(
        submit(
            fx.ctx(),
            &mut store,
            &key,
            "appConfiguration",
            values(json!({"name": "  "})),
            None,
        )
        .await
        .unwrap(),
    );

    assert_eq!(view.step.name, "appConfiguration");
    assert!(view.errors.contains_key("name"));
    assert_eq!(WizardSession::load(&store, &key).unwrap(), before);
}

#[tokio::test]
async fn test_out_of_order_submit_is_rejected() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");
    start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
        .await
        .unwrap();

    let err = submit(
        fx.ctx(),
        &mut store,
        &key,
        "instanceConfiguration",
        values(json!({"flavor": "m1.small"})),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, WizardError::OutOfOrder { .. }));

    let err = submit(fx.ctx(), &mut store, &key, "bogus", StepData::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::UnknownStep { .. }));
}

#[tokio::test]
async fn test_submit_without_wizard_is_not_started() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let err = submit(
        fx.ctx(),
        &mut store,
        &WizardKey::new("e1", "a1"),
        "appConfiguration",
        StepData::new(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, WizardError::NotStarted { .. }));
}

#[tokio::test]
async fn test_skip_condition_and_completion_redirect() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");
    start(fx.ctx(), &mut store, key.clone(), WizardFlags::default(), false)
        .await
        .unwrap();

    // advanced=false skips instanceConfiguration, leaving the workflow step
    let view = step_view(
        submit(
            fx.ctx(),
            &mut store,
            &key,
            "appConfiguration",
            values(json!({"name": "web", "advanced": false})),
            None,
        )
        .await
        .unwrap(),
    );
    assert_eq!(view.step.name, WORKFLOW_MANAGEMENT_STEP);
    assert_eq!((view.index, view.total), (1, 2));

    let response = submit(
        fx.ctx(),
        &mut store,
        &key,
        WORKFLOW_MANAGEMENT_STEP,
        values(json!({"StayAtCatalog": false})),
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        response,
        WizardResponse::Redirect {
            message: "The 'Apache' application successfully added to environment.".to_string(),
            location: "/environments/e1/services".to_string(),
        }
    );
    assert_eq!(response.state(), WizardState::Done);
    assert!(WizardSession::load(&store, &key).unwrap().is_none());

    let components = fx.backend.components("e1");
    assert_eq!(components.len(), 1);
    let attrs = &components[0].attributes;
    assert_eq!(attrs["name"], json!("web"));
    assert_eq!(attrs["flavor"], Value::Null);
    assert_eq!(attrs["?"]["type"], json!("io.murano.apps.Apache"));
    assert_eq!(attrs["?"][DASHBOARD_ATTRS_KEY]["name"], json!("Apache"));
    assert_eq!(attrs["?"]["id"], json!(components[0].id));
}

#[tokio::test]
async fn test_answers_carry_forward_to_later_steps() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");
    start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
        .await
        .unwrap();

    let view = step_view(
        submit(
            fx.ctx(),
            &mut store,
            &key,
            "appConfiguration",
            values(json!({"name": "web", "advanced": true})),
            None,
        )
        .await
        .unwrap(),
    );

    assert_eq!(view.step.name, "instanceConfiguration");
    assert_eq!(view.initial["name"], json!("web"));
}

#[tokio::test]
async fn test_stay_at_catalog_returns_inline_or_catalog() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a2");

    for add_to_field in [Some("id_app"), None] {
        start(fx.ctx(), &mut store, key.clone(), WizardFlags::default(), false)
            .await
            .unwrap();
        submit(
            fx.ctx(),
            &mut store,
            &key,
            "appConfiguration",
            values(json!({"name": "db"})),
            None,
        )
        .await
        .unwrap();
        let response = submit(
            fx.ctx(),
            &mut store,
            &key,
            WORKFLOW_MANAGEMENT_STEP,
            values(json!({"StayAtCatalog": "true"})),
            add_to_field,
        )
        .await
        .unwrap();

        match (add_to_field, response) {
            (Some(_), WizardResponse::Inline { field, name, .. }) => {
                assert_eq!(field, "id_app");
                assert_eq!(name, "db");
            }
            (None, WizardResponse::Redirect { location, .. }) => {
                assert_eq!(location, "/catalog");
            }
            (_, other) => panic!("unexpected response {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_do_redirect_flag_without_workflow_step() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a2");
    let flags = WizardFlags {
        do_redirect: true,
        drop_wm_form: true,
    };
    start(fx.ctx(), &mut store, key.clone(), flags, false)
        .await
        .unwrap();

    let response = submit(
        fx.ctx(),
        &mut store,
        &key,
        "appConfiguration",
        values(json!({"name": "db"})),
        Some("id_app"),
    )
    .await
    .unwrap();

    assert!(matches!(
        response,
        WizardResponse::Redirect { ref location, .. } if location == "/environments/e1/services"
    ));
}

#[tokio::test]
async fn test_forbidden_completion_clears_wizard() {
    let fx = Fixture::new();
    fx.backend.set_environment_status("e1", "deploying");
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");

    start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
        .await
        .unwrap();
    submit(
        fx.ctx(),
        &mut store,
        &key,
        "appConfiguration",
        values(json!({"name": "x", "advanced": true})),
        None,
    )
    .await
    .unwrap();
    let response = submit(
        fx.ctx(),
        &mut store,
        &key,
        "instanceConfiguration",
        values(json!({"flavor": "m1.small"})),
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        response,
        WizardResponse::Failed {
            message: DEPLOYING_MESSAGE.to_string(),
            location: "/environments".to_string(),
            retryable: true,
        }
    );
    assert_eq!(response.state(), WizardState::Aborted);

    let err = current(fx.ctx(), &mut store, &key).await.unwrap_err();
    assert!(matches!(err, WizardError::NotStarted { .. }));

    let view = step_view(
        start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
            .await
            .unwrap(),
    );
    assert_eq!(view.step.name, "appConfiguration");
    assert_eq!(view.index, 0);
}

#[tokio::test]
async fn test_other_failures_are_generic() {
    for error in [
        ApiError::http("environments", 500, "boom"),
        ApiError::not_found("environments", "environment e1"),
    ] {
        let fx = Fixture::new();
        fx.backend.fail_components_with(Some(error));
        let mut store = MemorySession::new();
        let key = WizardKey::new("e1", "a2");

        start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
            .await
            .unwrap();
        let response = submit(
            fx.ctx(),
            &mut store,
            &key,
            "appConfiguration",
            values(json!({"name": "db"})),
            None,
        )
        .await
        .unwrap();

        assert!(matches!(
            response,
            WizardResponse::Failed { ref message, retryable: false, .. }
                if message == GENERIC_FAILURE_MESSAGE
        ));
        assert!(WizardSession::load(&store, &key).unwrap().is_none());
        assert!(fx.backend.deleted_environments().is_empty());
    }
}

#[tokio::test]
async fn test_wizards_for_two_apps_do_not_share_values() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let first = WizardKey::new("e1", "a1");
    let second = WizardKey::new("e1", "a2");

    start(fx.ctx(), &mut store, first.clone(), no_wm(), false)
        .await
        .unwrap();
    start(fx.ctx(), &mut store, second.clone(), no_wm(), false)
        .await
        .unwrap();
    submit(
        fx.ctx(),
        &mut store,
        &first,
        "appConfiguration",
        values(json!({"name": "from-a1", "advanced": true})),
        None,
    )
    .await
    .unwrap();

    let view = step_view(current(fx.ctx(), &mut store, &second).await.unwrap());
    assert_eq!(view.initial["name"], json!("MySql"));

    let a2 = WizardSession::load(&store, &second).unwrap().unwrap();
    assert!(a2.data.is_empty());
    let a1 = WizardSession::load(&store, &first).unwrap().unwrap();
    assert_eq!(a1.data["appConfiguration"]["name"], json!("from-a1"));
}

#[tokio::test]
async fn test_schema_edit_changes_remaining_steps() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();
    let key = WizardKey::new("e1", "a1");
    start(fx.ctx(), &mut store, key.clone(), no_wm(), false)
        .await
        .unwrap();
    submit(
        fx.ctx(),
        &mut store,
        &key,
        "appConfiguration",
        values(json!({"name": "web", "advanced": true})),
        None,
    )
    .await
    .unwrap();

    fx.backend.set_ui_definition(
        "a1",
        "Forms:\n  - appConfiguration: {fields: [{name: name}]}\n  - network: {fields: [{name: subnet}]}\n",
    );

    let view = step_view(current(fx.ctx(), &mut store, &key).await.unwrap());
    assert_eq!(view.step.name, "network");
    let saved = WizardSession::load(&store, &key).unwrap().unwrap();
    assert_eq!(saved.current_step.as_deref(), Some("network"));
}

#[tokio::test]
async fn test_deploy_records_recent_and_clears_old_wizards() {
    let fx = Fixture::new();
    fx.backend.add_environment(Environment {
        id: "e2".to_string(),
        name: "prod".to_string(),
        status: "ready".to_string(),
    });
    let mut store = MemorySession::new();
    let recent = RecentApps::default();

    deploy(fx.ctx(), &mut store, recent, "e2", "a1", no_wm())
        .await
        .unwrap();
    submit(
        fx.ctx(),
        &mut store,
        &WizardKey::new("e2", "a1"),
        "appConfiguration",
        values(json!({"name": "old", "advanced": true})),
        None,
    )
    .await
    .unwrap();

    deploy(fx.ctx(), &mut store, recent, "e1", "a2", no_wm())
        .await
        .unwrap();
    let view = step_view(
        deploy(fx.ctx(), &mut store, recent, "e1", "a1", no_wm())
            .await
            .unwrap(),
    );

    assert_eq!(view.step.name, "appConfiguration");
    assert!(WizardSession::load(&store, &WizardKey::new("e2", "a1"))
        .unwrap()
        .is_none());
    assert!(WizardSession::load(&store, &WizardKey::new("e1", "a2"))
        .unwrap()
        .is_some());

    let latest: Vec<String> = store.get(LATEST_APPS_KEY).unwrap().unwrap();
    assert_eq!(latest, vec!["a1".to_string(), "a2".to_string()]);
}

#[tokio::test]
async fn test_quick_deploy_opens_wizard_in_new_environment() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();

    let (environment, response) = quick_deploy(fx.ctx(), &mut store, RecentApps::default(), "a2")
        .await
        .unwrap();

    assert_eq!(environment.name, "quick-env-1");
    let view = step_view(response);
    assert_eq!(view.environment_id, environment.id);
    assert!(view.flags.do_redirect);
    assert!(view.flags.drop_wm_form);
    assert_eq!(view.total, 1);
}

#[tokio::test]
async fn test_quick_deploy_unknown_app_deletes_environment() {
    let fx = Fixture::new();
    let mut store = MemorySession::new();

    let err = quick_deploy(fx.ctx(), &mut store, RecentApps::default(), "missing")
        .await
        .unwrap_err();

    assert!(err.as_api().is_some_and(ApiError::is_not_found));
    assert_eq!(fx.backend.deleted_environments().len(), 1);
    assert_eq!(fx.backend.environments().len(), 1);
}

#[tokio::test]
async fn test_quick_deploy_records_app_before_creating_environment() {
    let fx = Fixture::new();
    fx.backend
        .fail_environment_create_with(Some(ApiError::http("environments", 500, "boom")));
    let mut store = MemorySession::new();

    let err = quick_deploy(fx.ctx(), &mut store, RecentApps::default(), "a2")
        .await
        .unwrap_err();

    assert!(err.as_api().is_some());
    assert_eq!(fx.backend.environments().len(), 1);
    let latest: Vec<String> = store.get(LATEST_APPS_KEY).unwrap().unwrap();
    assert_eq!(latest, vec!["a2".to_string()]);
}

#[tokio::test]
async fn test_quick_deploy_failed_completion_deletes_environment() {
    let fx = Fixture::new();
    fx.backend
        .fail_components_with(Some(ApiError::forbidden("environments", "busy")));
    let mut store = MemorySession::new();

    let (environment, _) = quick_deploy(fx.ctx(), &mut store, RecentApps::default(), "a2")
        .await
        .unwrap();
    let response = submit(
        fx.ctx(),
        &mut store,
        &WizardKey::new(environment.id.clone(), "a2"),
        "appConfiguration",
        values(json!({"name": "db"})),
        None,
    )
    .await
    .unwrap();

    assert!(matches!(response, WizardResponse::Failed { retryable: true, .. }));
    assert_eq!(fx.backend.deleted_environments(), vec![environment.id]);
    assert!(store.keys().iter().all(|k| !k.starts_with(state::SESSION_KEY_PREFIX)));
}
