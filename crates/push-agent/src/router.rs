//! Notification click routing.
//!
//! The click target is normalized to an absolute URL first (relative
//! targets resolve against the origin of an open window) and then compared
//! by exact path against every open window. A match is focused; otherwise a
//! new window is opened when the platform allows it.

use url::Url;

use crate::config::AgentConfig;
use crate::platform::{Capabilities, WindowHandle, WindowId};
use crate::record::NotificationRecord;
use crate::viewer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Focused(WindowId),
    Opened(String),
    /// No matching window and no way to open one from this context.
    OpenUnsupported,
    /// Focus or open failed; the error was logged.
    Failed(String),
}

/// Where a click should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    requested: String,
    resolved: Option<Url>,
}

impl ClickTarget {
    /// Normalize `requested` using the origin of the first usable window.
    pub fn resolve(requested: &str, windows: &[WindowHandle]) -> Self {
        let resolved = Url::parse(requested).ok().or_else(|| {
            windows
                .iter()
                .filter_map(WindowHandle::location)
                .find_map(|location| origin_of(&location)?.join(requested).ok())
        });
        Self {
            requested: requested.to_string(),
            resolved,
        }
    }

    pub fn requested(&self) -> &str {
        &self.requested
    }

    pub fn resolved(&self) -> Option<&Url> {
        self.resolved.as_ref()
    }

    /// Path of the target; root-relative when no origin was known.
    pub fn path(&self) -> String {
        match &self.resolved {
            Some(url) => url.path().to_string(),
            None => root_relative(&self.requested),
        }
    }

    /// URL handed to the platform when opening a window.
    pub fn open_url(&self) -> String {
        match &self.resolved {
            Some(url) => url.to_string(),
            None => {
                let split = self.requested.find(['?', '#']).unwrap_or(self.requested.len());
                format!("{}{}", root_relative(&self.requested), &self.requested[split..])
            }
        }
    }

    /// Same origin and exactly the same path.
    pub fn matches(&self, window: &WindowHandle) -> bool {
        let Some(location) = window.location() else {
            return false;
        };
        match &self.resolved {
            Some(url) => url.origin() == location.origin() && url.path() == location.path(),
            None => location.path() == self.path(),
        }
    }
}

fn origin_of(location: &Url) -> Option<Url> {
    if location.cannot_be_a_base() {
        return None;
    }
    let mut base = location.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    Some(base)
}

/// Path part of a relative target, anchored at the root.
fn root_relative(requested: &str) -> String {
    let end = requested.find(['?', '#']).unwrap_or(requested.len());
    let path = &requested[..end];
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Handle a click on `notification`, optionally on one of its actions.
pub async fn handle_click(
    caps: &Capabilities,
    config: &AgentConfig,
    notification: &NotificationRecord,
    action: Option<&str>,
) -> ClickOutcome {
    caps.notifications.close_notification(notification);

    let requested = notification.target_url().unwrap_or(&config.fallback_url);

    let windows = match viewer::enumerate_windows(caps.clients.as_ref()).await {
        Ok(windows) => windows,
        Err(e) => {
            tracing::warn!(error = %e, "Window enumeration failed, treating as no open windows");
            Vec::new()
        }
    };

    let target = ClickTarget::resolve(requested, &windows);
    tracing::debug!(
        tag = %notification.tag,
        action,
        requested = target.requested(),
        path = %target.path(),
        "Routing notification click"
    );

    if let Some(window) = windows.iter().find(|w| target.matches(w)) {
        return match caps.clients.focus(&window.id).await {
            Ok(()) => {
                tracing::info!(window = %window.id, url = %window.url, "Focused existing window");
                ClickOutcome::Focused(window.id.clone())
            }
            Err(e) => {
                tracing::warn!(error = %e, window = %window.id, "Failed to focus window");
                ClickOutcome::Failed(e.to_string())
            }
        };
    }

    if !caps.clients.supports_open_window() {
        tracing::debug!("Opening windows is not supported here, ignoring click");
        return ClickOutcome::OpenUnsupported;
    }

    let url = target.open_url();
    match caps.clients.open_window(&url).await {
        Ok(_) => {
            tracing::info!(url = %url, "Opened new window for notification");
            ClickOutcome::Opened(url)
        }
        Err(e) => {
            tracing::warn!(error = %e, url = %url, "Failed to open window");
            ClickOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: &str, url: &str) -> WindowHandle {
        WindowHandle {
            id: WindowId(id.into()),
            url: url.into(),
            focused: false,
        }
    }

    #[test]
    fn relative_target_uses_window_origin() {
        let windows = vec![window("a", "https://mjolobid.example/bids/?page=3")];
        let target = ClickTarget::resolve("/messaging/conversation/42/", &windows);
        assert_eq!(
            target.open_url(),
            "https://mjolobid.example/messaging/conversation/42/"
        );
    }

    #[test]
    fn relative_target_without_slash_resolves_at_root() {
        let windows = vec![window("a", "https://mjolobid.example/bids/deep/page/")];
        let target = ClickTarget::resolve("notifications/", &windows);
        assert_eq!(target.path(), "/notifications/");
    }

    #[test]
    fn no_windows_falls_back_to_root() {
        let target = ClickTarget::resolve("notifications/?unread=1", &[]);
        assert_eq!(target.resolved(), None);
        assert_eq!(target.path(), "/notifications/");
        assert_eq!(target.open_url(), "/notifications/?unread=1");
    }

    #[test]
    fn absolute_target_is_kept() {
        let windows = vec![window("a", "https://mjolobid.example/")];
        let target = ClickTarget::resolve("https://mjolobid.example/offers/5/", &windows);
        assert_eq!(target.path(), "/offers/5/");
    }

    #[test]
    fn match_is_exact_path_not_prefix() {
        let windows = vec![window("a", "https://mjolobid.example/messaging/conversation/42/")];
        let exact = ClickTarget::resolve("/messaging/conversation/42/", &windows);
        let parent = ClickTarget::resolve("/messaging/", &windows);
        assert!(exact.matches(&windows[0]));
        assert!(!parent.matches(&windows[0]));
    }

    #[test]
    fn match_ignores_query_and_fragment() {
        let windows = vec![window("a", "https://mjolobid.example/notifications/?page=2#top")];
        let target = ClickTarget::resolve("/notifications/", &windows);
        assert!(target.matches(&windows[0]));
    }

    #[test]
    fn other_origin_never_matches() {
        let windows = vec![window("a", "https://mjolobid.example/notifications/")];
        let target = ClickTarget::resolve("https://elsewhere.example/notifications/", &windows);
        assert!(!target.matches(&windows[0]));
    }
}
