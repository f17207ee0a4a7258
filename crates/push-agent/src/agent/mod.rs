//! Event dispatch for the push agent.
//!
//! The host delivers one [`AgentEvent`] at a time and awaits the returned
//! future as the event's completion. `Ok` means the completion resolved,
//! `Err` means it was rejected.


use std::sync::Arc;

use crate::AgentError;
use crate::config::AgentConfig;
use crate::decision::{self, PushOutcome};
use crate::lifecycle;
use crate::platform::{Capabilities, Subscription, SubscriptionOptions};
use crate::record::NotificationRecord;
use crate::renewer;
use crate::router::{self, ClickOutcome};

/// Events delivered by the host platform.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Install,
    Activate,
    Push {
        data: Option<Vec<u8>>,
    },
    NotificationClick {
        notification: NotificationRecord,
        action: Option<String>,
    },
    PushSubscriptionChange {
        old_options: Option<SubscriptionOptions>,
    },
}

impl AgentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Push { .. } => "push",
            Self::NotificationClick { .. } => "notificationclick",
            Self::PushSubscriptionChange { .. } => "pushsubscriptionchange",
        }
    }
}

/// Settled value of a resolved completion.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Installed,
    Activated,
    Push(PushOutcome),
    Click(ClickOutcome),
    SubscriptionRenewed(Subscription),
}

/// The background agent. Cheap to clone; clones share capabilities.
#[derive(Clone)]
pub struct PushAgent {
    caps: Capabilities,
    config: Arc<AgentConfig>,
}

impl PushAgent {
    pub fn new(caps: Capabilities, config: AgentConfig) -> Self {
        Self {
            caps,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Run the handler for `event` to completion.
    pub async fn handle(&self, event: AgentEvent) -> Result<EventOutcome, AgentError> {
        let name = event.name();
        tracing::debug!(event = name, "Handling agent event");

        let result = match event {
            AgentEvent::Install => lifecycle::on_install(&self.caps)
                .await
                .map(|()| EventOutcome::Installed),
            AgentEvent::Activate => lifecycle::on_activate(&self.caps)
                .await
                .map(|()| EventOutcome::Activated),
            AgentEvent::Push { data } => Ok(EventOutcome::Push(self.on_push(data.as_deref()).await)),
            AgentEvent::NotificationClick {
                notification,
                action,
            } => Ok(EventOutcome::Click(
                self.on_notification_click(&notification, action.as_deref())
                    .await,
            )),
            AgentEvent::PushSubscriptionChange { old_options } => self
                .on_subscription_change(old_options.as_ref())
                .await
                .map(EventOutcome::SubscriptionRenewed),
        };

        if let Err(e) = &result {
            tracing::error!(event = name, error = %e, "Event completion rejected");
        }
        result
    }

    pub async fn on_push(&self, data: Option<&[u8]>) -> PushOutcome {
        decision::handle_push(&self.caps, &self.config, data).await
    }

    pub async fn on_notification_click(
        &self,
        notification: &NotificationRecord,
        action: Option<&str>,
    ) -> ClickOutcome {
        router::handle_click(&self.caps, &self.config, notification, action).await
    }

    pub async fn on_subscription_change(
        &self,
        old_options: Option<&SubscriptionOptions>,
    ) -> Result<Subscription, AgentError> {
        renewer::renew_subscription(&self.caps, old_options).await
    }
}
