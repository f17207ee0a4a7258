//! Install and activate handling.

use crate::AgentError;
use crate::platform::Capabilities;

/// Activate immediately instead of waiting for old pages to close.
pub async fn on_install(caps: &Capabilities) -> Result<(), AgentError> {
    // The platform does not wait on skip-waiting, so a failure only logs.
    if let Err(e) = caps.lifecycle.skip_waiting().await {
        tracing::warn!(error = %e, "skip_waiting failed, new agent will wait for reload");
    }
    tracing::info!("Push agent installed");
    Ok(())
}

/// Take over every open window; activation completes once claimed.
pub async fn on_activate(caps: &Capabilities) -> Result<(), AgentError> {
    caps.clients.claim().await.map_err(AgentError::Claim)?;
    tracing::info!("Push agent activated and claimed open windows");
    Ok(())
}
