use std::sync::Arc;
use tracing::info;

use super::providers::{deepseek_backend, gemini_backend};
use super::FakeReasoningBackend;
use crate::infrastructure::config::{BackendKind, LlmSettings, Settings};
use crate::modules::assistant::infrastructure::tools::os_tools;
use crate::modules::assistant::ports::{GenerationSettings, ReasoningBackend};
use crate::shared::AppResult;

/// 按配置创建推理后端
///
/// 启用工具时绑定全部操作系统工具；缺少凭据时返回配置错误
pub async fn create_reasoning_backend(
    settings: &Settings,
    llm: &LlmSettings,
) -> AppResult<Arc<dyn ReasoningBackend>> {
    let tools = if llm.enable_tools { os_tools() } else { Vec::new() };
    let generation = GenerationSettings::new(llm.temperature, tools);

    info!(
        "Creating reasoning backend: kind={}, temperature={}, tools={}",
        llm.kind, llm.temperature, llm.enable_tools
    );

    let backend: Arc<dyn ReasoningBackend> = match llm.kind {
        BackendKind::DeepSeek => {
            let key = settings.deepseek_api_key()?;
            Arc::new(deepseek_backend(key, generation, llm.max_steps)?)
        }
        BackendKind::Gemini => {
            let key = settings.gemini_api_key()?;
            Arc::new(gemini_backend(key, generation, llm.max_steps)?)
        }
        BackendKind::Fake => {
            let backend = FakeReasoningBackend::new();
            backend
                .update_settings(Some(generation.temperature), Some(generation.tools))
                .await;
            Arc::new(backend)
        }
    };

    Ok(backend)
}
