//! Realized notifications: a payload with MjoloBid defaults applied.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::AgentConfig;
use crate::payload::{NotificationAction, NotificationType, PushPayload};

static TAG_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A notification as handed to the platform tray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub tag: String,
    #[serde(default)]
    pub vibrate: Vec<u32>,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
    /// Always contains `url`, merged with the payload's own data.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NotificationRecord {
    /// Build the record for a payload, filling every gap from `config`.
    pub fn from_payload(payload: &PushPayload, config: &AgentConfig, now: DateTime<Utc>) -> Self {
        let url = payload
            .url
            .clone()
            .unwrap_or_else(|| config.fallback_url.clone());

        // Server data is merged last so its own `url` wins.
        let mut data = Map::new();
        data.insert("url".into(), Value::String(url));
        data.extend(payload.data.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            title: payload
                .title
                .clone()
                .unwrap_or_else(|| config.product_name.clone()),
            body: payload.body.clone().unwrap_or_default(),
            icon: payload.icon.clone(),
            badge: payload.badge.clone(),
            tag: payload
                .tag
                .clone()
                .unwrap_or_else(|| generate_tag(&config.tag_prefix, now)),
            vibrate: payload
                .vibrate
                .clone()
                .unwrap_or_else(|| config.default_vibrate.clone()),
            actions: payload.actions.clone().unwrap_or_default(),
            data,
        }
    }

    /// Click target stored in `data.url`, when it is a non-empty string.
    pub fn target_url(&self) -> Option<&str> {
        self.data
            .get("url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn notification_type(&self) -> Option<NotificationType> {
        self.data
            .get("type")
            .and_then(Value::as_str)
            .map(NotificationType::parse)
    }
}

/// Timestamp-qualified tag, unique within the process even for calls in the
/// same millisecond.
pub fn generate_tag(prefix: &str, now: DateTime<Utc>) -> String {
    let seq = TAG_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{seq}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_760_000_000_000).expect("timestamp")
    }

    #[test]
    fn empty_payload_gets_all_defaults() {
        let config = AgentConfig::default();
        let record = NotificationRecord::from_payload(&PushPayload::default(), &config, now());

        assert_eq!(record.title, "MjoloBid");
        assert_eq!(record.body, "");
        assert!(record.tag.starts_with("mjolobid-1760000000000-"));
        assert_eq!(record.vibrate, vec![100, 50, 100]);
        assert!(record.actions.is_empty());
        assert_eq!(record.target_url(), Some("/notifications/"));
    }

    #[test]
    fn payload_values_win() {
        let config = AgentConfig::default();
        let payload = PushPayload {
            title: Some("Bid accepted".into()),
            body: Some("Your bid was accepted".into()),
            tag: Some("bid-9".into()),
            url: Some("/bids/9/".into()),
            vibrate: Some(vec![]),
            ..PushPayload::default()
        };
        let record = NotificationRecord::from_payload(&payload, &config, now());

        assert_eq!(record.title, "Bid accepted");
        assert_eq!(record.tag, "bid-9");
        assert!(record.vibrate.is_empty());
        assert_eq!(record.target_url(), Some("/bids/9/"));
    }

    #[test]
    fn data_is_merged_after_url() {
        let config = AgentConfig::default();
        let mut payload = PushPayload {
            url: Some("/messaging/".into()),
            ..PushPayload::default()
        };
        payload.data.insert("type".into(), json!("NEW_MESSAGE"));
        payload
            .data
            .insert("url".into(), json!("/messaging/conversation/7/"));

        let record = NotificationRecord::from_payload(&payload, &config, now());
        assert_eq!(record.target_url(), Some("/messaging/conversation/7/"));
        assert_eq!(record.data["type"], json!("NEW_MESSAGE"));
    }

    #[test]
    fn non_string_url_in_data_has_no_target() {
        let config = AgentConfig::default();
        let mut payload = PushPayload::default();
        payload.data.insert("url".into(), Value::Null);

        let record = NotificationRecord::from_payload(&payload, &config, now());
        assert_eq!(record.target_url(), None);
    }

    #[test]
    fn generated_tags_are_unique_within_a_millisecond() {
        let a = generate_tag("mjolobid", now());
        let b = generate_tag("mjolobid", now());
        assert_ne!(a, b);
    }

    #[test]
    fn record_json_uses_platform_field_names() {
        let config = AgentConfig::default();
        let record = NotificationRecord::from_payload(&PushPayload::default(), &config, now());
        let value = serde_json::to_value(&record).expect("serialize");
        assert!(value.get("icon").is_none());
        assert_eq!(value["data"]["url"], json!("/notifications/"));
    }
}
