//! Background push-notification agent for MjoloBid.
//!
//! Decides whether server-pushed payloads are shown, routes notification
//! clicks back into an application window, and renews the push
//! subscription when the platform invalidates it. Every browser call goes
//! through the capability traits in [`platform`], so the decision logic runs
//! the same against a real host or [`memory::MemoryPlatform`].

pub mod agent;
pub mod config;
pub mod decision;
pub mod lifecycle;
pub mod memory;
pub mod payload;
pub mod platform;
pub mod record;
pub mod renewer;
pub mod router;
pub mod viewer;

// Re-exports for convenience
pub use agent::{AgentEvent, EventOutcome, PushAgent};
pub use config::AgentConfig;
pub use decision::{Decision, PushOutcome};
pub use payload::{NotificationAction, NotificationType, PushPayload};
pub use platform::{
    Capabilities, Permission, Subscription, SubscriptionOptions, WindowHandle, WindowId,
};
pub use record::NotificationRecord;
pub use router::ClickOutcome;

/// Failures reported by a platform capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("Notification rendering failed: {0}")]
    Rendering(String),

    #[error("Window clients error: {0}")]
    Clients(String),

    #[error("Push subscribe failed: {0}")]
    Subscribe(String),

    #[error("Subscription submission failed: {0}")]
    Submit(String),

    #[error("Not supported in this context: {0}")]
    Unsupported(&'static str),
}

/// Errors that reject an event completion.
///
/// Only lifecycle claiming and subscription renewal can reject; push and
/// click handling always complete.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Subscription change event carried no previous subscription")]
    MissingOldSubscription,

    #[error("Re-subscribe rejected: {0}")]
    Resubscribe(#[source] PlatformError),

    #[error("Renewed subscription is missing keys: {0}")]
    InvalidSubscription(String),

    #[error("Subscription could not be registered with the server: {0}")]
    Submission(#[source] PlatformError),

    #[error("Claiming open windows failed: {0}")]
    Claim(#[source] PlatformError),
}
