//! Subscription renewal after the platform invalidates a subscription.

use crate::AgentError;
use crate::platform::{Capabilities, Subscription, SubscriptionOptions};

/// Re-subscribe with the previous options and hand the result to the server.
///
/// Nothing is retried: any failure rejects the completion and the server
/// keeps the stale subscription until the next successful renewal.
pub async fn renew_subscription(
    caps: &Capabilities,
    old_options: Option<&SubscriptionOptions>,
) -> Result<Subscription, AgentError> {
    let options = old_options.ok_or(AgentError::MissingOldSubscription)?;

    tracing::info!(
        user_visible_only = options.user_visible_only,
        has_server_key = options.application_server_key.is_some(),
        "Push subscription changed, re-subscribing"
    );

    let subscription = caps
        .push_manager
        .subscribe(options)
        .await
        .map_err(AgentError::Resubscribe)?;

    let missing = subscription.missing_keys();
    if !missing.is_empty() {
        return Err(AgentError::InvalidSubscription(missing.join(", ")));
    }

    caps.registry
        .register(&subscription)
        .await
        .map_err(AgentError::Submission)?;

    tracing::info!(endpoint = %subscription.endpoint, "Push subscription renewed");
    Ok(subscription)
}
