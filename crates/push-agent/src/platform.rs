//! Capability interfaces the agent needs from its host.
//!
//! A browser host backs these with the service-worker globals
//! (registration, clients, push manager, fetch); tests and the replay host
//! use [`crate::memory::MemoryPlatform`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::PlatformError;
use crate::record::NotificationRecord;

/// Notification permission as reported at delivery time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    #[default]
    Default,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub String);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open application window or tab in the agent's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowHandle {
    pub id: WindowId,
    pub url: String,
    #[serde(default)]
    pub focused: bool,
}

impl WindowHandle {
    /// The window location, if it is an absolute URL.
    pub fn location(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    pub fn path(&self) -> Option<String> {
        self.location().map(|u| u.path().to_string())
    }
}

/// Options a push subscription was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_server_key: Option<String>,
    #[serde(default)]
    pub user_visible_only: bool,
}

/// Push credential in its `toJSON()` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub endpoint: String,
    #[serde(default)]
    pub expiration_time: Option<i64>,
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
}

impl Subscription {
    pub const REQUIRED_KEYS: [&'static str; 2] = ["p256dh", "auth"];

    /// Required keys that are absent or empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        Self::REQUIRED_KEYS
            .into_iter()
            .filter(|k| self.keys.get(*k).is_none_or(|v| v.is_empty()))
            .collect()
    }
}

/// Force a freshly installed agent to take over without a reload.
#[async_trait]
pub trait ServiceLifecycle: Send + Sync {
    async fn skip_waiting(&self) -> Result<(), PlatformError>;
}

/// The notification tray.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    fn permission(&self) -> Permission;

    async fn show_notification(&self, record: &NotificationRecord) -> Result<(), PlatformError>;

    /// Dismiss a shown notification. Dismissal cannot fail.
    fn close_notification(&self, record: &NotificationRecord);
}

/// Window enumeration and navigation.
#[async_trait]
pub trait WindowClients: Send + Sync {
    /// All window clients in scope, controlled or not, focused or not.
    async fn match_all(&self) -> Result<Vec<WindowHandle>, PlatformError>;

    async fn focus(&self, id: &WindowId) -> Result<(), PlatformError>;

    /// Whether windows can be opened from the background context.
    fn supports_open_window(&self) -> bool;

    async fn open_window(&self, url: &str) -> Result<Option<WindowHandle>, PlatformError>;

    /// Take control of every open in-scope window.
    async fn claim(&self) -> Result<(), PlatformError>;
}

#[async_trait]
pub trait PushManager: Send + Sync {
    async fn subscribe(&self, options: &SubscriptionOptions)
    -> Result<Subscription, PlatformError>;
}

/// Server-side persistence of push subscriptions.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    async fn register(&self, subscription: &Subscription) -> Result<(), PlatformError>;
}

/// Every capability the agent is handed.
#[derive(Clone)]
pub struct Capabilities {
    pub lifecycle: Arc<dyn ServiceLifecycle>,
    pub notifications: Arc<dyn NotificationSurface>,
    pub clients: Arc<dyn WindowClients>,
    pub push_manager: Arc<dyn PushManager>,
    pub registry: Arc<dyn SubscriptionRegistry>,
}

impl Capabilities {
    /// Use one object for every capability.
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: ServiceLifecycle
            + NotificationSurface
            + WindowClients
            + PushManager
            + SubscriptionRegistry
            + 'static,
    {
        Self {
            lifecycle: platform.clone(),
            notifications: platform.clone(),
            clients: platform.clone(),
            push_manager: platform.clone(),
            registry: platform,
        }
    }

    /// Replace the subscription registry, e.g. with an HTTP client.
    pub fn with_registry(mut self, registry: Arc<dyn SubscriptionRegistry>) -> Self {
        self.registry = registry;
        self
    }
}
