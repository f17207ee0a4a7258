//! Event scripts: one JSON object per line.
//!
//! Agent events are what the browser would deliver; the remaining steps
//! change the simulated browser between events.
//!
//! ```text
//! {"type": "install"}
//! {"type": "open_window", "url": "https://mjolobid.example/messaging/conversation/42/"}
//! {"type": "push", "data": {"title": "New message", "data": {"type": "NEW_MESSAGE"}}}
//! {"type": "notification_click", "tag": "mjolobid-1760000000000-0"}
//! ```

use push_agent::{Permission, SubscriptionOptions};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    Install,
    Activate,
    /// `data` is sent as-is when it is a string, otherwise as JSON text.
    Push {
        #[serde(default)]
        data: Option<Value>,
    },
    /// Click the tray notification with `tag`, or the latest one.
    NotificationClick {
        #[serde(default)]
        tag: Option<String>,
        #[serde(default)]
        action: Option<String>,
    },
    PushSubscriptionChange {
        #[serde(default)]
        old_options: Option<SubscriptionOptions>,
    },
    OpenWindow {
        url: String,
    },
    CloseWindow {
        id: String,
    },
    SetPermission {
        permission: Permission,
    },
    SetOpenWindowSupported {
        supported: bool,
    },
}

impl ScriptStep {
    /// Whether the step is delivered to the agent rather than the browser.
    pub fn is_agent_event(&self) -> bool {
        matches!(
            self,
            Self::Install
                | Self::Activate
                | Self::Push { .. }
                | Self::NotificationClick { .. }
                | Self::PushSubscriptionChange { .. }
        )
    }
}

/// Raw push bytes for a scripted `data` value.
pub fn push_bytes(data: Option<&Value>) -> Option<Vec<u8>> {
    match data? {
        Value::String(text) => Some(text.clone().into_bytes()),
        other => Some(other.to_string().into_bytes()),
    }
}

/// Parse a script, skipping blank lines and `#` comments.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, String> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| format!("line {}: {e}", index + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_step_kind() {
        let script = r#"
# lifecycle
{"type": "install"}
{"type": "activate"}
{"type": "open_window", "url": "https://mjolobid.example/"}
{"type": "push", "data": {"title": "Hi"}}
{"type": "push", "data": "plain text"}
{"type": "push"}
{"type": "notification_click", "tag": "bid-1", "action": "open"}
{"type": "push_subscription_change", "old_options": {"applicationServerKey": "K", "userVisibleOnly": true}}
{"type": "close_window", "id": "window-1"}
{"type": "set_permission", "permission": "denied"}
{"type": "set_open_window_supported", "supported": false}
"#;
        let steps = parse_script(script).expect("script");
        assert_eq!(steps.len(), 11);
        assert_eq!(steps[0], ScriptStep::Install);
        assert_eq!(
            steps[7],
            ScriptStep::PushSubscriptionChange {
                old_options: Some(SubscriptionOptions {
                    application_server_key: Some("K".into()),
                    user_visible_only: true,
                }),
            }
        );
        assert_eq!(
            steps[9],
            ScriptStep::SetPermission {
                permission: Permission::Denied
            }
        );
        assert_eq!(steps.iter().filter(|s| s.is_agent_event()).count(), 7);
    }

    #[test]
    fn reports_bad_line_number() {
        let err = parse_script("{\"type\": \"install\"}\n{\"type\": \"reboot\"}").expect_err("bad");
        assert!(err.starts_with("line 2:"), "{err}");
    }

    #[test]
    fn push_bytes_keeps_strings_raw() {
        assert_eq!(push_bytes(None), None);
        assert_eq!(push_bytes(Some(&json!("hello"))), Some(b"hello".to_vec()));
        assert_eq!(
            push_bytes(Some(&json!({"title": "x"}))),
            Some(br#"{"title":"x"}"#.to_vec())
        );
    }
}
