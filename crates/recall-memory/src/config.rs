use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MEMU_BASE_URL: &str = "https://api.memu.so";

fn default_base_url() -> String {
    DEFAULT_MEMU_BASE_URL.to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_user_name() -> String {
    "语音用户".to_string()
}

fn default_agent_name() -> String {
    "语音助手".to_string()
}

fn default_status_endpoint() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key for the memory store. An empty key disables the store.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Upper bound for each remote call, in seconds. Default: 10.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Display name submitted alongside the user's messages.
    #[serde(default = "default_user_name")]
    pub user_name: String,
    /// Display name submitted alongside the agent's messages.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Whether the store exposes the task status endpoint.
    #[serde(default = "default_status_endpoint")]
    pub status_endpoint: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            request_timeout_seconds: default_request_timeout_seconds(),
            user_name: default_user_name(),
            agent_name: default_agent_name(),
            status_endpoint: default_status_endpoint(),
        }
    }
}

impl fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("user_name", &self.user_name)
            .field("agent_name", &self.agent_name)
            .field("status_endpoint", &self.status_endpoint)
            .finish()
    }
}

impl MemoryConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = MemoryConfig::new(DEFAULT_MEMU_BASE_URL, "secret-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn empty_key_disables_store() {
        assert!(!MemoryConfig::default().is_enabled());
        assert!(!MemoryConfig::new(DEFAULT_MEMU_BASE_URL, "  ").is_enabled());
        assert!(MemoryConfig::new(DEFAULT_MEMU_BASE_URL, "k").is_enabled());
    }
}
