//! Environment selection: the session's active environment, switching, and
//! quick environment creation

pub mod redirect;

pub use redirect::{is_safe_url, safe_redirect};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::api::{ApiError, CreateEnvironmentRequest, Environment, EnvironmentClient};
use crate::error::DashboardError;
use crate::session::{SessionStore, SessionStoreExt};

/// Session key holding the active environment
pub const ENVIRONMENT_KEY: &str = "environment";

/// Name prefix of quick-created environments
pub const QUICK_ENV_PREFIX: &str = "quick-env-";

static QUICK_ENV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^quick-env-([0-9]+)$").expect("valid quick env regex"));

/// Lightweight environment record kept in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentSummary {
    pub id: String,
    pub name: String,
    pub status: String,
}

impl From<Environment> for EnvironmentSummary {
    fn from(env: Environment) -> Self {
        Self {
            id: env.id,
            name: env.name,
            status: env.status,
        }
    }
}

/// Environments offered to the user plus the active one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentContext {
    pub available: Vec<EnvironmentSummary>,
    pub current: Option<EnvironmentSummary>,
}

/// All environments visible to the caller
pub async fn available(envs: &dyn EnvironmentClient) -> Result<Vec<EnvironmentSummary>, ApiError> {
    Ok(envs
        .list()
        .await?
        .into_iter()
        .map(EnvironmentSummary::from)
        .collect())
}

/// The stored selection if it is still available, else the first available one
pub fn current<S: SessionStore + ?Sized>(
    store: &S,
    available: &[EnvironmentSummary],
) -> Result<Option<EnvironmentSummary>, DashboardError> {
    let stored: Option<EnvironmentSummary> = store
        .get(ENVIRONMENT_KEY)
        .map_err(|e| DashboardError::session(ENVIRONMENT_KEY, e))?;

    let valid = stored.and_then(|selected| available.iter().find(|env| env.id == selected.id));
    Ok(valid.or_else(|| available.first()).cloned())
}

/// Available environments and the current selection for one session
pub async fn context<S>(
    store: &mut S,
    envs: &dyn EnvironmentClient,
) -> Result<EnvironmentContext, DashboardError>
where
    S: SessionStore + Send + ?Sized,
{
    let available = available(envs).await?;
    let current = current(store, &available)?;
    Ok(EnvironmentContext { available, current })
}

/// Result of a switch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    /// Where the UI should go next
    pub redirect_to: String,
    /// The new selection, or `None` if the id was not available
    pub selected: Option<EnvironmentSummary>,
}

/// Make `environment_id` the session's active environment.
///
/// Unknown ids leave the selection unchanged. The redirect target is used only
/// if it points at `host`; otherwise `default_redirect` is returned.
pub async fn switch<S>(
    store: &mut S,
    envs: &dyn EnvironmentClient,
    environment_id: &str,
    redirect_to: Option<&str>,
    host: &str,
    default_redirect: &str,
) -> Result<SwitchOutcome, DashboardError>
where
    S: SessionStore + Send + ?Sized,
{
    let redirect_to = safe_redirect(redirect_to, host, default_redirect);

    let selected = available(envs)
        .await?
        .into_iter()
        .find(|env| env.id == environment_id);

    match &selected {
        Some(env) => {
            debug!("Switching active environment to {} ({})", env.name, env.id);
            store
                .set(ENVIRONMENT_KEY, env)
                .map_err(|e| DashboardError::session(ENVIRONMENT_KEY, e))?;
        }
        None => debug!("Ignoring switch to unknown environment {}", environment_id),
    }

    Ok(SwitchOutcome {
        redirect_to,
        selected,
    })
}

/// Digits of a `quick-env-<N>` name without leading zeros (`""` is zero)
fn quick_env_digits(name: &str) -> Option<&str> {
    let digits = QUICK_ENV_RE.captures(name)?.get(1)?.as_str();
    Some(digits.trim_start_matches('0'))
}

/// Add one to a decimal number of any length
fn increment_decimal(digits: &str) -> String {
    let mut carry = true;
    let mut reversed: Vec<char> = digits
        .chars()
        .rev()
        .map(|c| match (carry, c) {
            (false, c) => c,
            (true, '9') => '0',
            (true, c) => {
                carry = false;
                char::from(c as u8 + 1)
            }
        })
        .collect();
    if carry {
        reversed.push('1');
    }
    reversed.into_iter().rev().collect()
}

/// Next free `quick-env-<N>` name given the existing environment names.
///
/// Numbers are compared as decimal strings, so suffixes wider than any
/// integer type still order correctly.
pub fn next_quick_env_name<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let highest = names
        .into_iter()
        .filter_map(quick_env_digits)
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .unwrap_or("");
    format!("{}{}", QUICK_ENV_PREFIX, increment_decimal(highest))
}

/// Create a new environment named `quick-env-<N+1>`.
///
/// Two concurrent calls may pick the same name; the remote service rejects
/// the second one and that error is returned as is.
pub async fn quick_create(envs: &dyn EnvironmentClient) -> Result<Environment, ApiError> {
    let existing = envs.list().await?;
    let name = next_quick_env_name(existing.iter().map(|env| env.name.as_str()));

    let environment = envs.create(CreateEnvironmentRequest { name }).await?;
    info!(
        "Created quick environment {} ({})",
        environment.name, environment.id
    );
    Ok(environment)
}
