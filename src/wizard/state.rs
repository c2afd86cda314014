//! Wizard state kept in the user's session

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::WizardError;
use crate::forms::WizardData;
use crate::session::{SessionStore, SessionStoreExt};

/// Prefix of every session key holding wizard state
pub const SESSION_KEY_PREFIX: &str = "wizard_";

/// Identifies one wizard within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WizardKey {
    pub environment_id: String,
    pub app_id: String,
    #[serde(default)]
    pub suffix: Option<String>,
}

impl WizardKey {
    pub fn new(environment_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            app_id: app_id.into(),
            suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Field namespace of this wizard: `wizard_<environment_id>_<app_id>[_<suffix>]`
    pub fn prefix(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("wizard_{}_{}_{}", self.environment_id, self.app_id, suffix),
            None => format!("wizard_{}_{}", self.environment_id, self.app_id),
        }
    }

    pub fn session_key(&self) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, self.prefix())
    }
}

/// Options given when the wizard is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WizardFlags {
    /// Go to the environment's services page after a successful add
    #[serde(default)]
    pub do_redirect: bool,
    /// Leave out the workflow-management step
    #[serde(default)]
    pub drop_wm_form: bool,
}

/// Where a wizard stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    NotStarted,
    Step { index: usize, name: String },
    Done,
    Aborted,
}

/// Persisted progress of one wizard.
///
/// The step list is not part of it; see `WizardPlan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    pub key: WizardKey,
    pub current_step: Option<String>,
    #[serde(default)]
    pub data: WizardData,
    #[serde(default)]
    pub flags: WizardFlags,
    /// The environment was created for this wizard and goes away if it fails
    #[serde(default)]
    pub compensate_environment: bool,
}

impl WizardSession {
    pub fn new(key: WizardKey, flags: WizardFlags, compensate_environment: bool) -> Self {
        Self {
            key,
            current_step: None,
            data: WizardData::new(),
            flags,
            compensate_environment,
        }
    }

    pub fn load<S: SessionStore + ?Sized>(
        store: &S,
        key: &WizardKey,
    ) -> Result<Option<Self>, WizardError> {
        let session_key = key.session_key();
        store
            .get(&session_key)
            .map_err(|source| WizardError::Session {
                key: session_key,
                source,
            })
    }

    pub fn save<S: SessionStore + ?Sized>(&self, store: &mut S) -> Result<(), WizardError> {
        let session_key = self.key.session_key();
        store
            .set(&session_key, self)
            .map_err(|source| WizardError::Session {
                key: session_key,
                source,
            })
    }

    pub fn clear<S: SessionStore + ?Sized>(store: &mut S, key: &WizardKey) -> bool {
        store.delete(&key.session_key()).is_some()
    }
}

/// Drop the state of every wizard for `app_id` in this session, whatever
/// environment or suffix it was opened with. Returns how many were removed.
pub fn clear_app_forms<S: SessionStore + ?Sized>(store: &mut S, app_id: &str) -> usize {
    let stale: Vec<String> = store
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(SESSION_KEY_PREFIX))
        .filter(|k| {
            store
                .get_value(k)
                .as_ref()
                .and_then(|v| v.get("key"))
                .and_then(|key| key.get("app_id"))
                .and_then(|id| id.as_str())
                == Some(app_id)
        })
        .collect();

    for key in &stale {
        store.delete(key);
    }
    stale.len()
}
