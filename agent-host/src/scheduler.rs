//! Host scheduler: delivers scripted events to the agent and awaits each
//! completion.
//!
//! Push completions are spawned onto a `JoinSet` and may overlap. Every
//! other step first waits for in-flight completions, so lifecycle order and
//! the window state seen by a click are deterministic.

use std::sync::Arc;

use push_agent::memory::MemoryPlatform;
use push_agent::{
    AgentError, AgentEvent, ClickOutcome, EventOutcome, PushAgent, PushOutcome, WindowId,
};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::script::{self, ScriptStep};

type Completion = (&'static str, Result<EventOutcome, AgentError>);

/// Counts of how the replayed completions settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub completed: usize,
    pub rejected: usize,
    pub shown: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub push_failures: usize,
    pub focused: usize,
    pub opened: usize,
    pub renewed: usize,
    pub ignored_steps: usize,
}

pub struct Host {
    agent: PushAgent,
    browser: Arc<MemoryPlatform>,
    in_flight: JoinSet<Completion>,
    summary: ReplaySummary,
}

impl Host {
    pub fn new(agent: PushAgent, browser: Arc<MemoryPlatform>) -> Self {
        Self {
            agent,
            browser,
            in_flight: JoinSet::new(),
            summary: ReplaySummary::default(),
        }
    }

    /// Run every step, then wait for all outstanding completions.
    pub async fn run(&mut self, steps: Vec<ScriptStep>) -> ReplaySummary {
        for step in steps {
            self.step(step).await;
        }
        self.drain().await;
        tracing::info!(
            events = self.summary.events,
            rejected = self.summary.rejected,
            "Replay finished"
        );
        self.summary.clone()
    }

    async fn step(&mut self, step: ScriptStep) {
        let concurrent = matches!(step, ScriptStep::Push { .. });
        if !concurrent {
            self.drain().await;
        }
        if !step.is_agent_event() {
            tracing::debug!(?step, "Applying browser change");
        }

        match step {
            ScriptStep::Install => self.dispatch(AgentEvent::Install),
            ScriptStep::Activate => self.dispatch(AgentEvent::Activate),
            ScriptStep::Push { data } => self.dispatch(AgentEvent::Push {
                data: script::push_bytes(data.as_ref()),
            }),
            ScriptStep::NotificationClick { tag, action } => {
                let notification = match &tag {
                    Some(tag) => self.browser.find_in_tray(tag),
                    None => self.browser.tray().pop(),
                };
                let Some(notification) = notification else {
                    tracing::warn!(tag = ?tag, "No such notification in the tray, click ignored");
                    self.summary.ignored_steps += 1;
                    return;
                };
                self.dispatch(AgentEvent::NotificationClick {
                    notification,
                    action,
                });
            }
            ScriptStep::PushSubscriptionChange { old_options } => {
                self.dispatch(AgentEvent::PushSubscriptionChange { old_options })
            }
            ScriptStep::OpenWindow { url } => {
                let window = self.browser.add_window(&url);
                tracing::debug!(window = %window.id, url = %url, "Browser opened window");
            }
            ScriptStep::CloseWindow { id } => {
                if !self.browser.remove_window(&WindowId(id.clone())) {
                    tracing::warn!(window = %id, "No such window to close");
                    self.summary.ignored_steps += 1;
                }
            }
            ScriptStep::SetPermission { permission } => {
                tracing::debug!(?permission, "Browser permission changed");
                self.browser.set_permission(permission);
            }
            ScriptStep::SetOpenWindowSupported { supported } => {
                self.browser.set_open_window_supported(supported);
            }
        }
    }

    fn dispatch(&mut self, event: AgentEvent) {
        self.summary.events += 1;
        let agent = self.agent.clone();
        let name = event.name();
        self.in_flight
            .spawn(async move { (name, agent.handle(event).await) });
    }

    async fn drain(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok((name, result)) => self.record(name, result),
                Err(e) => {
                    tracing::error!(error = %e, "Event handler task aborted");
                    self.summary.rejected += 1;
                }
            }
        }
    }

    fn record(&mut self, name: &'static str, result: Result<EventOutcome, AgentError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(event = name, status = "rejected", error = %e, "Completion settled");
                self.summary.rejected += 1;
                return;
            }
        };

        self.summary.completed += 1;
        match outcome {
            EventOutcome::Push(PushOutcome::Shown(_)) => self.summary.shown += 1,
            EventOutcome::Push(PushOutcome::Suppressed) => self.summary.suppressed += 1,
            EventOutcome::Push(PushOutcome::Skipped) => self.summary.skipped += 1,
            EventOutcome::Push(PushOutcome::Failed(_)) => self.summary.push_failures += 1,
            EventOutcome::Click(ClickOutcome::Focused(_)) => self.summary.focused += 1,
            EventOutcome::Click(ClickOutcome::Opened(_)) => self.summary.opened += 1,
            EventOutcome::SubscriptionRenewed(_) => self.summary.renewed += 1,
            EventOutcome::Click(_) | EventOutcome::Installed | EventOutcome::Activated => {}
        }
        tracing::debug!(event = name, status = "completed", "Completion settled");
    }
}
