//! Push handling: skip, suppress or show.
//!
//! [`decide`] is the pure policy; [`handle_push`] drives it against the
//! platform and absorbs every error after the permission gate, since a
//! failed push completion can make the platform throttle future delivery.

use chrono::{DateTime, Utc};

use crate::config::AgentConfig;
use crate::payload::PushPayload;
use crate::platform::{Capabilities, Permission};
use crate::record::NotificationRecord;
use crate::viewer::{self, ViewerContext};

/// Result of the push policy for one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Permission not granted; nothing else happens.
    Skipped,
    /// The user is already in a conversation and the message is chat.
    Suppressed,
    Shown(NotificationRecord),
}

/// What a push completion ended with. Always reported as completed.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Skipped,
    Suppressed,
    Shown(NotificationRecord),
    /// Window enumeration or rendering failed; the error was logged.
    Failed(String),
}

/// Suppression is coarse: any open conversation hides every suppressible
/// message, whichever conversation it belongs to.
pub fn should_suppress(payload: &PushPayload, viewer: &ViewerContext, config: &AgentConfig) -> bool {
    viewer.is_viewing_conversation()
        && payload
            .notification_type()
            .is_some_and(|t| config.is_suppressible(t.as_str()))
}

pub fn decide(
    permission: Permission,
    payload: &PushPayload,
    viewer: &ViewerContext,
    config: &AgentConfig,
    now: DateTime<Utc>,
) -> Decision {
    if !permission.is_granted() {
        return Decision::Skipped;
    }
    if should_suppress(payload, viewer, config) {
        return Decision::Suppressed;
    }
    Decision::Shown(NotificationRecord::from_payload(payload, config, now))
}

/// Handle a push event carrying `raw` bytes.
pub async fn handle_push(caps: &Capabilities, config: &AgentConfig, raw: Option<&[u8]>) -> PushOutcome {
    // Checked per delivery: permission may be revoked after subscribing.
    let permission = caps.notifications.permission();
    if !permission.is_granted() {
        tracing::debug!(?permission, "Notification permission not granted, skipping push");
        return PushOutcome::Skipped;
    }

    let payload = PushPayload::parse(raw);

    let viewer = match viewer::resolve(caps.clients.as_ref(), &config.conversation_route).await {
        Ok(viewer) => viewer,
        Err(e) => {
            tracing::error!(error = %e, "Error in push event handler");
            return PushOutcome::Failed(e.to_string());
        }
    };

    match decide(permission, &payload, &viewer, config, Utc::now()) {
        Decision::Skipped => PushOutcome::Skipped,
        Decision::Suppressed => {
            let kind = payload.notification_type();
            tracing::info!(
                notification_type = kind.as_ref().map(|t| t.as_str()),
                "Suppressing push notification, user is viewing a conversation"
            );
            PushOutcome::Suppressed
        }
        Decision::Shown(record) => match caps.notifications.show_notification(&record).await {
            Ok(()) => {
                tracing::info!(tag = %record.tag, title = %record.title, "Push notification shown");
                PushOutcome::Shown(record)
            }
            Err(e) => {
                tracing::error!(error = %e, tag = %record.tag, "Error in push event handler");
                PushOutcome::Failed(e.to_string())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{WindowHandle, WindowId};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn conversation_open() -> ViewerContext {
        ViewerContext::from_windows(
            vec![WindowHandle {
                id: WindowId("w1".into()),
                url: "https://mjolobid.example/messaging/conversation/42/".into(),
                focused: false,
            }],
            "/messaging/conversation/",
        )
    }

    fn typed(kind: &str) -> PushPayload {
        let mut payload = PushPayload {
            title: Some("Hello".into()),
            ..PushPayload::default()
        };
        payload.data.insert("type".into(), json!(kind));
        payload
    }

    #[test]
    fn denied_permission_skips() {
        let config = AgentConfig::default();
        for permission in [Permission::Denied, Permission::Default] {
            assert_eq!(
                decide(permission, &typed("BID_ACCEPTED"), &ViewerContext::default(), &config, now()),
                Decision::Skipped
            );
        }
    }

    #[test]
    fn new_message_in_open_conversation_is_suppressed() {
        let config = AgentConfig::default();
        let decision = decide(
            Permission::Granted,
            &typed("NEW_MESSAGE"),
            &conversation_open(),
            &config,
            now(),
        );
        assert_eq!(decision, Decision::Suppressed);
    }

    #[test]
    fn suppression_ignores_which_conversation_is_open() {
        let config = AgentConfig::default();
        let mut payload = typed("NEW_MESSAGE");
        payload.data.insert("conversation_id".into(), json!(99));
        assert!(should_suppress(&payload, &conversation_open(), &config));
    }

    #[test]
    fn other_types_show_even_in_conversation() {
        let config = AgentConfig::default();
        let decision = decide(
            Permission::Granted,
            &typed("PAYMENT_RECEIVED"),
            &conversation_open(),
            &config,
            now(),
        );
        assert!(matches!(decision, Decision::Shown(record) if record.title == "Hello"));
    }

    #[test]
    fn new_message_without_conversation_is_shown() {
        let config = AgentConfig::default();
        let decision = decide(
            Permission::Granted,
            &typed("NEW_MESSAGE"),
            &ViewerContext::default(),
            &config,
            now(),
        );
        assert!(matches!(decision, Decision::Shown(_)));
    }

    #[test]
    fn untyped_payload_is_never_suppressed() {
        let config = AgentConfig::default();
        assert!(!should_suppress(&PushPayload::default(), &conversation_open(), &config));
    }

    #[test]
    fn suppressed_types_are_configurable() {
        let config = AgentConfig {
            suppressed_types: vec!["NEW_MESSAGE".into(), "BID_ACCEPTED".into()],
            ..AgentConfig::default()
        };
        assert!(should_suppress(&typed("BID_ACCEPTED"), &conversation_open(), &config));
    }
}
