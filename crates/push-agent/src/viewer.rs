//! Viewer context: which application windows are open and what they show.

use crate::PlatformError;
use crate::platform::{WindowClients, WindowHandle};

/// Snapshot of the open windows taken for a single decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerContext {
    windows: Vec<WindowHandle>,
    viewing_conversation: bool,
}

impl ViewerContext {
    pub fn from_windows(windows: Vec<WindowHandle>, conversation_route: &str) -> Self {
        let viewing_conversation = is_viewing_conversation(&windows, conversation_route);
        Self {
            windows,
            viewing_conversation,
        }
    }

    /// True when any open window, focused or not, shows a conversation.
    pub fn is_viewing_conversation(&self) -> bool {
        self.viewing_conversation
    }

    pub fn windows(&self) -> &[WindowHandle] {
        &self.windows
    }

    pub fn into_windows(self) -> Vec<WindowHandle> {
        self.windows
    }
}

/// Enumerate every window in scope, background tabs included.
pub async fn enumerate_windows(
    clients: &dyn WindowClients,
) -> Result<Vec<WindowHandle>, PlatformError> {
    let windows = clients.match_all().await?;
    tracing::trace!(count = windows.len(), "Enumerated window clients");
    Ok(windows)
}

/// Enumerate windows and work out whether a conversation is on screen.
pub async fn resolve(
    clients: &dyn WindowClients,
    conversation_route: &str,
) -> Result<ViewerContext, PlatformError> {
    let windows = enumerate_windows(clients).await?;
    Ok(ViewerContext::from_windows(windows, conversation_route))
}

/// Existence check over the window paths; stops at the first match.
pub fn is_viewing_conversation(windows: &[WindowHandle], conversation_route: &str) -> bool {
    windows.iter().any(|window| {
        window
            .path()
            .is_some_and(|path| path.contains(conversation_route))
    })
}
