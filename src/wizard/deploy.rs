//! Entry points that open a wizard from the catalog

use tracing::{debug, warn};

use super::engine::{start, WizardContext, WizardResponse};
use super::state::{clear_app_forms, WizardFlags, WizardKey};
use super::WizardError;
use crate::api::Environment;
use crate::catalog::RecentApps;
use crate::environments::quick_create;
use crate::session::SessionStore;

async fn open<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    key: WizardKey,
    flags: WizardFlags,
    compensate_environment: bool,
) -> Result<WizardResponse, WizardError>
where
    S: SessionStore + Send + ?Sized,
{
    let app = ctx.packages.get(&key.app_id).await?;
    debug!(
        "Clearing forms data for application {}",
        app.fully_qualified_name
    );
    clear_app_forms(store, &key.app_id);

    start(ctx, store, key, flags, compensate_environment).await
}

/// Add `app_id` to an existing environment: remember it as recently used,
/// forget any earlier wizard for it, and open a new one.
pub async fn deploy<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    recent: RecentApps,
    environment_id: &str,
    app_id: &str,
    flags: WizardFlags,
) -> Result<WizardResponse, WizardError>
where
    S: SessionStore + Send + ?Sized,
{
    recent.record(store, app_id)?;
    open(
        ctx,
        store,
        WizardKey::new(environment_id, app_id),
        flags,
        false,
    )
    .await
}

/// Add `app_id` to a newly created `quick-env-<N>` environment.
///
/// The app is recorded as recently used before anything else happens. If the
/// wizard cannot be opened the environment is deleted and the original error
/// returned. A failure when the wizard completes later deletes it as well.
pub async fn quick_deploy<S>(
    ctx: WizardContext<'_>,
    store: &mut S,
    recent: RecentApps,
    app_id: &str,
) -> Result<(Environment, WizardResponse), WizardError>
where
    S: SessionStore + Send + ?Sized,
{
    recent.record(store, app_id)?;

    let environment = quick_create(ctx.environments).await?;
    let flags = WizardFlags {
        do_redirect: true,
        drop_wm_form: true,
    };

    let key = WizardKey::new(environment.id.clone(), app_id);
    match open(ctx, store, key, flags, true).await {
        Ok(response) => Ok((environment, response)),
        Err(e) => {
            if let Err(delete_err) = ctx.environments.delete(&environment.id).await {
                warn!(
                    "Failed to delete quick environment {}: {}",
                    environment.id, delete_err
                );
            }
            Err(e)
        }
    }
}
