//! In-memory platform: a notification tray, a window table, a push manager
//! and a subscription registry held in one mutex.
//!
//! Used by the test suites and by the replay host. Failure switches let a
//! caller make any capability fail on demand.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::PlatformError;
use crate::platform::{
    NotificationSurface, Permission, PushManager, ServiceLifecycle, Subscription,
    SubscriptionOptions, SubscriptionRegistry, WindowClients, WindowHandle, WindowId,
};
use crate::record::NotificationRecord;

/// Capabilities forced to fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureSwitches {
    pub render: bool,
    pub match_all: bool,
    pub focus: bool,
    pub open: bool,
    pub claim: bool,
    pub skip_waiting: bool,
    pub subscribe: bool,
    pub register: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    permission: Permission,
    open_window_supported: bool,
    failures: FailureSwitches,
    windows: Vec<WindowHandle>,
    next_window: u64,
    tray: Vec<NotificationRecord>,
    rendered: Vec<NotificationRecord>,
    closed: Vec<String>,
    focused: Vec<WindowId>,
    opened: Vec<String>,
    match_all_calls: usize,
    skipped_waiting: bool,
    claimed: bool,
    subscribe_calls: Vec<SubscriptionOptions>,
    next_subscription: Option<Subscription>,
    issued_subscriptions: u64,
    registered: Vec<Subscription>,
}

/// Browser stand-in backing every capability trait.
#[derive(Debug)]
pub struct MemoryPlatform {
    state: Mutex<MemoryState>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new(Permission::Granted)
    }
}

impl MemoryPlatform {
    pub fn new(permission: Permission) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                permission,
                open_window_supported: true,
                ..MemoryState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Simulation controls
    // -----------------------------------------------------------------------

    pub fn set_permission(&self, permission: Permission) {
        self.state().permission = permission;
    }

    pub fn set_open_window_supported(&self, supported: bool) {
        self.state().open_window_supported = supported;
    }

    pub fn set_failures(&self, failures: FailureSwitches) {
        self.state().failures = failures;
    }

    /// Open a window at `url` and return its handle.
    pub fn add_window(&self, url: &str) -> WindowHandle {
        let mut state = self.state();
        push_window(&mut state, url, false)
    }

    pub fn remove_window(&self, id: &WindowId) -> bool {
        let mut state = self.state();
        let before = state.windows.len();
        state.windows.retain(|w| &w.id != id);
        state.windows.len() != before
    }

    /// The subscription the next `subscribe` call hands out.
    pub fn set_next_subscription(&self, subscription: Subscription) {
        self.state().next_subscription = Some(subscription);
    }

    // -----------------------------------------------------------------------
    // Observations
    // -----------------------------------------------------------------------

    pub fn windows(&self) -> Vec<WindowHandle> {
        self.state().windows.clone()
    }

    /// Notifications currently in the tray, one per tag.
    pub fn tray(&self) -> Vec<NotificationRecord> {
        self.state().tray.clone()
    }

    /// Every successful render, in order, including replaced ones.
    pub fn rendered(&self) -> Vec<NotificationRecord> {
        self.state().rendered.clone()
    }

    pub fn find_in_tray(&self, tag: &str) -> Option<NotificationRecord> {
        self.state().tray.iter().find(|r| r.tag == tag).cloned()
    }

    pub fn closed_tags(&self) -> Vec<String> {
        self.state().closed.clone()
    }

    pub fn focused(&self) -> Vec<WindowId> {
        self.state().focused.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state().opened.clone()
    }

    pub fn match_all_calls(&self) -> usize {
        self.state().match_all_calls
    }

    pub fn skipped_waiting(&self) -> bool {
        self.state().skipped_waiting
    }

    pub fn claimed(&self) -> bool {
        self.state().claimed
    }

    pub fn subscribe_calls(&self) -> Vec<SubscriptionOptions> {
        self.state().subscribe_calls.clone()
    }

    pub fn registered(&self) -> Vec<Subscription> {
        self.state().registered.clone()
    }
}

fn push_window(state: &mut MemoryState, url: &str, focused: bool) -> WindowHandle {
    state.next_window += 1;
    let handle = WindowHandle {
        id: WindowId(format!("window-{}", state.next_window)),
        url: url.to_string(),
        focused,
    };
    if focused {
        for window in &mut state.windows {
            window.focused = false;
        }
    }
    state.windows.push(handle.clone());
    handle
}

#[async_trait]
impl ServiceLifecycle for MemoryPlatform {
    async fn skip_waiting(&self) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.failures.skip_waiting {
            return Err(PlatformError::Unsupported("skip_waiting"));
        }
        state.skipped_waiting = true;
        Ok(())
    }
}

#[async_trait]
impl NotificationSurface for MemoryPlatform {
    fn permission(&self) -> Permission {
        self.state().permission
    }

    async fn show_notification(&self, record: &NotificationRecord) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.failures.render {
            return Err(PlatformError::Rendering("tray unavailable".into()));
        }
        // Same tag replaces instead of stacking.
        state.tray.retain(|r| r.tag != record.tag);
        state.tray.push(record.clone());
        state.rendered.push(record.clone());
        Ok(())
    }

    fn close_notification(&self, record: &NotificationRecord) {
        let mut state = self.state();
        state.tray.retain(|r| r.tag != record.tag);
        state.closed.push(record.tag.clone());
    }
}

#[async_trait]
impl WindowClients for MemoryPlatform {
    async fn match_all(&self) -> Result<Vec<WindowHandle>, PlatformError> {
        let mut state = self.state();
        state.match_all_calls += 1;
        if state.failures.match_all {
            return Err(PlatformError::Clients("matchAll rejected".into()));
        }
        Ok(state.windows.clone())
    }

    async fn focus(&self, id: &WindowId) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.failures.focus {
            return Err(PlatformError::Clients("focus rejected".into()));
        }
        if !state.windows.iter().any(|w| &w.id == id) {
            return Err(PlatformError::Clients(format!("no window {id}")));
        }
        for window in &mut state.windows {
            window.focused = &window.id == id;
        }
        state.focused.push(id.clone());
        Ok(())
    }

    fn supports_open_window(&self) -> bool {
        self.state().open_window_supported
    }

    async fn open_window(&self, url: &str) -> Result<Option<WindowHandle>, PlatformError> {
        let mut state = self.state();
        if !state.open_window_supported {
            return Err(PlatformError::Unsupported("open_window"));
        }
        if state.failures.open {
            return Err(PlatformError::Clients("openWindow rejected".into()));
        }
        state.opened.push(url.to_string());
        Ok(Some(push_window(&mut state, url, true)))
    }

    async fn claim(&self) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.failures.claim {
            return Err(PlatformError::Clients("claim rejected".into()));
        }
        state.claimed = true;
        Ok(())
    }
}

#[async_trait]
impl PushManager for MemoryPlatform {
    async fn subscribe(
        &self,
        options: &SubscriptionOptions,
    ) -> Result<Subscription, PlatformError> {
        let mut state = self.state();
        state.subscribe_calls.push(options.clone());
        if state.failures.subscribe {
            return Err(PlatformError::Subscribe("push service unavailable".into()));
        }
        if let Some(next) = state.next_subscription.take() {
            return Ok(next);
        }
        state.issued_subscriptions += 1;
        let n = state.issued_subscriptions;
        Ok(Subscription {
            endpoint: format!("https://push.memory.invalid/subscription/{n}"),
            expiration_time: None,
            keys: BTreeMap::from([
                ("p256dh".to_string(), format!("memory-p256dh-{n}")),
                ("auth".to_string(), format!("memory-auth-{n}")),
            ]),
        })
    }
}

#[async_trait]
impl SubscriptionRegistry for MemoryPlatform {
    async fn register(&self, subscription: &Subscription) -> Result<(), PlatformError> {
        let mut state = self.state();
        if state.failures.register {
            return Err(PlatformError::Submit("server returned 500".into()));
        }
        state.registered.push(subscription.clone());
        Ok(())
    }
}
