use recall_memory::DEFAULT_MEMORY_HEADER;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Base instructions for the voice assistant.
pub const DEFAULT_INSTRUCTIONS: &str = "你是一个有用的语音人工智能助手。你热心地帮助用户解答他们的问题，从你广博的知识中提供信息。\
你的回答简洁明了，没有任何复杂的格式或标点符号，包括表情符号、星号或其他符号。你好奇、友善，而且有幽默感。";

/// Instructions for the agent's opening reply.
pub const DEFAULT_GREETING: &str = "对用户打招呼并且表达你的帮助";

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

fn default_stt_model() -> String {
    "deepgram/nova-2".to_string()
}

fn default_stt_language() -> String {
    "zh".to_string()
}

fn default_llm_model() -> String {
    "gpt-5".to_string()
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_tts_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_tts_voice() -> String {
    "ash".to_string()
}

fn default_tts_instructions() -> String {
    "用友好和对话的语气说话".to_string()
}

fn default_vad() -> String {
    "silero".to_string()
}

fn default_turn_detection() -> String {
    "vad".to_string()
}

/// Speech-to-text provider settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SttConfig {
    #[serde(default = "default_stt_model")]
    pub model: String,
    #[serde(default = "default_stt_language")]
    pub language: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: default_stt_model(),
            language: default_stt_language(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for SttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SttConfig")
            .field("model", &self.model)
            .field("language", &self.language)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Language model provider settings. Any OpenAI-compatible endpoint works.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Per-request timeout in seconds. Default: 60.
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_llm_timeout_seconds() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            api_key: String::new(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Text-to-speech provider settings. Credentials are shared with the LLM
/// provider when left empty.
#[derive(Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_model")]
    pub model: String,
    #[serde(default = "default_tts_voice")]
    pub voice: String,
    /// Speaking-style instructions passed to the TTS model.
    #[serde(default = "default_tts_instructions")]
    pub instructions: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            voice: default_tts_voice(),
            instructions: default_tts_instructions(),
            base_url: String::new(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("instructions", &self.instructions)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Provider selection for the external session engine.
///
/// These values are opaque here: they are validated, logged and handed to
/// the engine, which owns the actual audio pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub stt: SttConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    /// Voice-activity detector.
    #[serde(default = "default_vad")]
    pub vad: String,
    /// Turn detection strategy (`vad` or a turn-detector model name).
    #[serde(default = "default_turn_detection")]
    pub turn_detection: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stt: SttConfig::default(),
            llm: LlmConfig::default(),
            tts: TtsConfig::default(),
            vad: default_vad(),
            turn_detection: default_turn_detection(),
        }
    }
}

impl PipelineConfig {
    /// TTS credentials, falling back to the LLM provider's.
    pub fn tts_credentials(&self) -> (&str, &str) {
        let base_url = if self.tts.base_url.is_empty() {
            &self.llm.base_url
        } else {
            &self.tts.base_url
        };
        let api_key = if self.tts.api_key.is_empty() {
            &self.llm.api_key
        } else {
            &self.tts.api_key
        };
        (base_url, api_key)
    }
}

fn default_flush_threshold() -> usize {
    2
}

fn default_poll_attempts() -> u32 {
    10
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_retrieve_attempts() -> u32 {
    5
}

fn default_memory_header() -> String {
    DEFAULT_MEMORY_HEADER.to_string()
}

/// Tunables for the memory refresh coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Buffered messages (two per turn) that trigger a submission.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,
    /// Task status checks before falling back to direct retrieval.
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    /// Direct retrieval attempts before a refresh cycle gives up.
    #[serde(default = "default_retrieve_attempts")]
    pub retrieve_attempts: u32,
    #[serde(default = "default_interval_ms")]
    pub retrieve_interval_ms: u64,
    /// Heading placed above the memory summaries in the system prompt.
    #[serde(default = "default_memory_header")]
    pub memory_header: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_interval_ms(),
            retrieve_attempts: default_retrieve_attempts(),
            retrieve_interval_ms: default_interval_ms(),
            memory_header: default_memory_header(),
        }
    }
}

impl CoordinatorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retrieve_interval(&self) -> Duration {
        Duration::from_millis(self.retrieve_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.flush_threshold, 2);
        assert_eq!(config.poll_attempts, 10);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.retrieve_attempts, 5);
        assert_eq!(config.memory_header, DEFAULT_MEMORY_HEADER);
    }

    #[test]
    fn provider_keys_are_redacted() {
        let mut pipeline = PipelineConfig::default();
        pipeline.llm.api_key = "sk-llm".to_string();
        pipeline.stt.api_key = "dg-key".to_string();
        let debug = format!("{:?}", pipeline);
        assert!(!debug.contains("sk-llm"));
        assert!(!debug.contains("dg-key"));
    }

    #[test]
    fn tts_falls_back_to_llm_credentials() {
        let mut pipeline = PipelineConfig::default();
        pipeline.llm.api_key = "sk-llm".to_string();
        pipeline.llm.base_url = "https://proxy.example/v1".to_string();
        assert_eq!(
            pipeline.tts_credentials(),
            ("https://proxy.example/v1", "sk-llm")
        );

        pipeline.tts.api_key = "sk-tts".to_string();
        assert_eq!(pipeline.tts_credentials().1, "sk-tts");
    }
}
