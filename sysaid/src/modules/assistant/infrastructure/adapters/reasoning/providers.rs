// 具体提供方：DeepSeek 与 Gemini（均为 OpenAI 兼容接口）

use super::openai_compatible::{OpenAICompatibleBackend, ProviderConfig};
use crate::modules::assistant::ports::{GenerationSettings, ReasoningError};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// DeepSeek 连接配置
pub fn deepseek_config(api_key: impl Into<String>, max_steps: usize) -> ProviderConfig {
    ProviderConfig {
        provider_id: "deepseek".to_string(),
        base_url: DEEPSEEK_BASE_URL.to_string(),
        api_key: api_key.into(),
        model: DEEPSEEK_MODEL.to_string(),
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        max_steps,
    }
}

/// Gemini 连接配置
pub fn gemini_config(api_key: impl Into<String>, max_steps: usize) -> ProviderConfig {
    ProviderConfig {
        provider_id: "gemini".to_string(),
        base_url: GEMINI_BASE_URL.to_string(),
        api_key: api_key.into(),
        model: GEMINI_MODEL.to_string(),
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        max_steps,
    }
}

pub fn deepseek_backend(
    api_key: impl Into<String>,
    settings: GenerationSettings,
    max_steps: usize,
) -> Result<OpenAICompatibleBackend, ReasoningError> {
    OpenAICompatibleBackend::new(deepseek_config(api_key, max_steps), settings)
}

pub fn gemini_backend(
    api_key: impl Into<String>,
    settings: GenerationSettings,
    max_steps: usize,
) -> Result<OpenAICompatibleBackend, ReasoningError> {
    OpenAICompatibleBackend::new(gemini_config(api_key, max_steps), settings)
}
