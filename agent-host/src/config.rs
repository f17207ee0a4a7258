//! Host configuration: `.env` files, then environment overrides.

use std::path::PathBuf;
use std::sync::LazyLock;

use push_agent::AgentConfig;
use regex::Regex;

static RE_TAG_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap());

const MAX_VIBRATE_MS: u32 = 10_000;

/// Everything the host needs to run a replay.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    pub agent: AgentConfig,
    /// Site origin receiving renewed subscriptions. `None` keeps them in memory.
    pub server_url: Option<String>,
    pub session_cookie: Option<String>,
    /// Event script; stdin when unset.
    pub events_file: Option<PathBuf>,
    /// Where to write the captured background log after the replay.
    pub log_dump: Option<PathBuf>,
}

impl HostConfig {
    /// Load `.env` (if any) and apply `MJOLOBID_*` / `AGENT_*` overrides.
    pub fn load() -> Self {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; invalid values are logged and skipped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| -> Option<String> {
            let value = lookup(key)?.trim().to_string();
            if value.is_empty() {
                return None;
            }
            match validate_setting(key, &value) {
                Ok(()) => Some(value),
                Err(reason) => {
                    tracing::warn!(key, value = %value, reason = %reason, "Ignoring invalid setting");
                    None
                }
            }
        };

        let mut agent = AgentConfig::default();
        if let Some(v) = get("MJOLOBID_PRODUCT_NAME") {
            agent.product_name = v;
        }
        if let Some(v) = get("MJOLOBID_TAG_PREFIX") {
            agent.tag_prefix = v;
        }
        if let Some(v) = get("MJOLOBID_FALLBACK_URL") {
            agent.fallback_url = v;
        }
        if let Some(v) = get("MJOLOBID_CONVERSATION_ROUTE") {
            agent.conversation_route = v;
        }
        if let Some(v) = get("MJOLOBID_SUBSCRIBE_PATH") {
            agent.subscribe_path = v;
        }
        if let Some(v) = get("MJOLOBID_VIBRATE") {
            agent.default_vibrate = parse_vibrate(&v).unwrap_or(agent.default_vibrate);
        }

        Self {
            agent,
            server_url: get("MJOLOBID_SERVER_URL"),
            session_cookie: get("MJOLOBID_SESSION_COOKIE"),
            events_file: get("AGENT_EVENTS_FILE").map(PathBuf::from),
            log_dump: get("AGENT_LOG_DUMP").map(PathBuf::from),
        }
    }
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::debug!("No .env file found, using system environment variables");
}

/// Comma-separated vibration pattern, e.g. `100,50,100`. Empty means none.
pub fn parse_vibrate(value: &str) -> Result<Vec<u32>, String> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| {
            let ms: u32 = part
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not an integer", part.trim()))?;
            if ms > MAX_VIBRATE_MS {
                return Err(format!("{ms} exceeds {MAX_VIBRATE_MS} ms"));
            }
            Ok(ms)
        })
        .collect()
}

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "MJOLOBID_FALLBACK_URL" | "MJOLOBID_CONVERSATION_ROUTE" | "MJOLOBID_SUBSCRIBE_PATH" => {
            if !value.starts_with('/') {
                return Err("must be a path starting with '/'".into());
            }
        }
        "MJOLOBID_TAG_PREFIX" => {
            if !RE_TAG_PREFIX.is_match(value) {
                return Err("must be lowercase letters, digits, '-' or '_'".into());
            }
        }
        "MJOLOBID_VIBRATE" => {
            parse_vibrate(value)?;
        }
        "MJOLOBID_SERVER_URL" => {
            let url = url::Url::parse(value).map_err(|e| format!("invalid URL: {e}"))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err("must be an http or https URL".into());
            }
        }
        "MJOLOBID_PRODUCT_NAME" => {
            if value.len() > 100 {
                return Err("must be at most 100 characters".into());
            }
        }
        _ => {}
    }
    Ok(())
}
