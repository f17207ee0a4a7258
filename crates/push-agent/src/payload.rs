//! Push payload decoding.
//!
//! Payloads are server-controlled and may be anything: a JSON object, a
//! bare JSON value, plain text or nothing at all. Decoding never fails;
//! whatever cannot be read as an object falls back to a text body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NEW_MESSAGE: &str = "NEW_MESSAGE";

/// Notification kinds emitted by the MjoloBid server in `data.type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationType {
    BidAccepted,
    BidCancelled,
    NewMessage,
    PaymentReceived,
    PaymentSent,
    WithdrawalProcessed,
    ReferralBonus,
    PremiumExpiring,
    EventReminder,
    SystemAnnouncement,
    Other(String),
}

impl NotificationType {
    pub fn parse(s: &str) -> Self {
        match s {
            "BID_ACCEPTED" => Self::BidAccepted,
            "BID_CANCELLED" => Self::BidCancelled,
            NEW_MESSAGE => Self::NewMessage,
            "PAYMENT_RECEIVED" => Self::PaymentReceived,
            "PAYMENT_SENT" => Self::PaymentSent,
            "WITHDRAWAL_PROCESSED" => Self::WithdrawalProcessed,
            "REFERRAL_BONUS" => Self::ReferralBonus,
            "PREMIUM_EXPIRING" => Self::PremiumExpiring,
            "EVENT_REMINDER" => Self::EventReminder,
            "SYSTEM_ANNOUNCEMENT" => Self::SystemAnnouncement,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::BidAccepted => "BID_ACCEPTED",
            Self::BidCancelled => "BID_CANCELLED",
            Self::NewMessage => NEW_MESSAGE,
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::PaymentSent => "PAYMENT_SENT",
            Self::WithdrawalProcessed => "WITHDRAWAL_PROCESSED",
            Self::ReferralBonus => "REFERRAL_BONUS",
            Self::PremiumExpiring => "PREMIUM_EXPIRING",
            Self::EventReminder => "EVENT_REMINDER",
            Self::SystemAnnouncement => "SYSTEM_ANNOUNCEMENT",
            Self::Other(s) => s,
        }
    }
}

/// A button offered on a rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Decoded push message. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub url: Option<String>,
    pub data: Map<String, Value>,
    pub vibrate: Option<Vec<u32>>,
    pub actions: Option<Vec<NotificationAction>>,
}

impl PushPayload {
    /// Decode the raw bytes delivered with a push event.
    pub fn parse(raw: Option<&[u8]>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let text = String::from_utf8_lossy(raw);

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Self::from_object(&map),
            Ok(Value::String(s)) => Self::text_fallback(s),
            Ok(Value::Null) => Self::text_fallback(String::new()),
            Ok(_) => Self::text_fallback(text.trim().to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "Push payload is not JSON, using text body");
                Self::text_fallback(text.into_owned())
            }
        }
    }

    /// Minimal payload carrying only a body; the title is left to defaults.
    pub fn text_fallback(body: String) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Read the known fields of a JSON object, ignoring wrongly typed ones.
    pub fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            title: string_field(map, "title"),
            body: string_field(map, "body"),
            icon: string_field(map, "icon"),
            badge: string_field(map, "badge"),
            tag: string_field(map, "tag"),
            url: string_field(map, "url"),
            data: match map.get("data") {
                Some(Value::Object(data)) => data.clone(),
                _ => Map::new(),
            },
            vibrate: map.get("vibrate").and_then(vibrate_field),
            actions: match map.get("actions") {
                Some(Value::Array(items)) => Some(
                    items
                        .iter()
                        .filter_map(|v| serde_json::from_value(v.clone()).ok())
                        .collect(),
                ),
                _ => None,
            },
        }
    }

    /// The `data.type` discriminator, if the server sent one.
    pub fn notification_type(&self) -> Option<NotificationType> {
        self.data
            .get("type")
            .and_then(Value::as_str)
            .map(NotificationType::parse)
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn vibrate_field(value: &Value) -> Option<Vec<u32>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|n| u32::try_from(n).ok())
                .collect(),
        ),
        // A single duration is a valid pattern too.
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).map(|n| vec![n]),
        _ => None,
    }
}
