mod config;
mod log_buffer;
mod scheduler;
mod script;

use std::sync::Arc;

use anyhow::Context;
use push_agent::memory::MemoryPlatform;
use push_agent::{Capabilities, Permission, PushAgent};
use push_api::PushApiClient;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::HostConfig;
use crate::log_buffer::LogCaptureLayer;
use crate::scheduler::Host;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(LogCaptureLayer::new())
        .init();

    let config = HostConfig::load();
    tracing::info!(
        product = %config.agent.product_name,
        tag_prefix = %config.agent.tag_prefix,
        "Starting push agent host"
    );

    let text = match &config.events_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read event script {}", path.display()))?,
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read event script from stdin")?;
            text
        }
    };
    let steps = script::parse_script(&text)
        .map_err(|e| anyhow::anyhow!("invalid event script: {e}"))?;
    tracing::info!(steps = steps.len(), "Event script loaded");

    let browser = Arc::new(MemoryPlatform::new(Permission::Granted));
    let mut caps = Capabilities::from_platform(browser.clone());
    if let Some(server_url) = &config.server_url {
        let mut client = PushApiClient::new(server_url)?
            .with_subscribe_path(config.agent.subscribe_path.clone());
        if let Some(cookie) = &config.session_cookie {
            client = client.with_session_cookie(cookie.clone());
        }
        tracing::info!(server = %client.base_url(), "Renewed subscriptions go to the site");
        caps = caps.with_registry(Arc::new(client));
    }

    let agent = PushAgent::new(caps, config.agent.clone());
    let summary = Host::new(agent, browser).run(steps).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let problems = log_buffer::problems();
    if !problems.is_empty() {
        tracing::warn!(count = problems.len(), "Replay logged warnings or errors");
    }

    if let Some(path) = &config.log_dump {
        let entries = log_buffer::all();
        tokio::fs::write(path, serde_json::to_vec_pretty(&entries)?)
            .await
            .with_context(|| format!("failed to write log dump {}", path.display()))?;
        tracing::info!(entries = entries.len(), path = %path.display(), "Background log written");
    }

    Ok(())
}
