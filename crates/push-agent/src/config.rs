//! Agent configuration and its MjoloBid defaults.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRODUCT_NAME: &str = "MjoloBid";
pub const DEFAULT_TAG_PREFIX: &str = "mjolobid";
pub const DEFAULT_FALLBACK_URL: &str = "/notifications/";
pub const DEFAULT_CONVERSATION_ROUTE: &str = "/messaging/conversation/";
pub const DEFAULT_SUBSCRIBE_PATH: &str = "/notifications/api/push-subscribe/";
pub const DEFAULT_VIBRATE: [u32; 3] = [100, 50, 100];

/// Runtime configuration shared by every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Title used when a payload has none, and for text fallbacks.
    pub product_name: String,
    /// Prefix of generated notification tags.
    pub tag_prefix: String,
    /// Click target when the notification carries no `url`.
    pub fallback_url: String,
    /// Path fragment identifying a conversation view.
    pub conversation_route: String,
    /// Server route receiving renewed subscriptions.
    pub subscribe_path: String,
    /// Vibration pattern used when the payload omits one.
    pub default_vibrate: Vec<u32>,
    /// `data.type` values suppressed while a conversation is open.
    pub suppressed_types: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.into(),
            tag_prefix: DEFAULT_TAG_PREFIX.into(),
            fallback_url: DEFAULT_FALLBACK_URL.into(),
            conversation_route: DEFAULT_CONVERSATION_ROUTE.into(),
            subscribe_path: DEFAULT_SUBSCRIBE_PATH.into(),
            default_vibrate: DEFAULT_VIBRATE.to_vec(),
            suppressed_types: vec![crate::payload::NEW_MESSAGE.into()],
        }
    }
}

impl AgentConfig {
    /// Whether a notification of this `data.type` is subject to suppression.
    pub fn is_suppressible(&self, notification_type: &str) -> bool {
        self.suppressed_types.iter().any(|t| t == notification_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mjolobid_routes() {
        let config = AgentConfig::default();
        assert_eq!(config.product_name, "MjoloBid");
        assert_eq!(config.fallback_url, "/notifications/");
        assert_eq!(config.conversation_route, "/messaging/conversation/");
        assert_eq!(config.subscribe_path, "/notifications/api/push-subscribe/");
        assert_eq!(config.default_vibrate, vec![100, 50, 100]);
        assert!(config.is_suppressible("NEW_MESSAGE"));
        assert!(!config.is_suppressible("BID_ACCEPTED"));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"product_name": "Staging"}"#).expect("config");
        assert_eq!(config.product_name, "Staging");
        assert_eq!(config.tag_prefix, "mjolobid");
    }
}
