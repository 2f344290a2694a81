use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use super::super::domain::{Answer, ConversationId, Message};
use super::Tool;

/// 推理后端错误类型
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {code} - {message}")]
    ApiError { code: String, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Malformed tool call `{name}`: {message}")]
    MalformedToolCall { name: String, message: String },

    #[error("Step limit exceeded: {0}")]
    StepLimitExceeded(usize),
}

/// 推理事件中的消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    User,
    Assistant,
    System,
}

impl EventRole {
    /// 是否可以作为最终回答
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventRole::Assistant | EventRole::System)
    }
}

/// 推理过程中的中间事件
///
/// 每个事件对应提供方一次快照中的最后一条消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReasoningEvent {
    /// 文本内容
    Content { role: EventRole, text: String },
    /// 模型请求调用工具
    ToolCall { name: String, arguments: Value },
    /// 工具执行结果（回灌给模型）
    ToolResult { name: String, output: String },
}

impl ReasoningEvent {
    pub fn content(role: EventRole, text: impl Into<String>) -> Self {
        ReasoningEvent::Content {
            role,
            text: text.into(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        ReasoningEvent::ToolCall {
            name: name.into(),
            arguments,
        }
    }
}

/// 推理事件流
pub type ReasoningEventStream =
    Pin<Box<dyn Stream<Item = Result<ReasoningEvent, ReasoningError>> + Send>>;

/// 进程内生成参数
///
/// 温度和工具集不属于对话数据模型，不会持久化
#[derive(Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl GenerationSettings {
    pub fn new(temperature: f32, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { temperature, tools }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            tools: Vec::new(),
        }
    }
}

impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("temperature", &self.temperature)
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// 推理后端端口 - 核心抽象接口
///
/// 每个实现封装一个上游推理提供方和可选的固定工具集。
/// 后端只读取消息历史，从不修改对话本身。
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// 获取后端 ID
    fn backend_id(&self) -> &str;

    /// 基于完整消息历史生成回答
    async fn chat(
        &self,
        conversation_id: &ConversationId,
        messages: &[Message],
    ) -> Result<Answer, ReasoningError>;

    /// 当前生成参数
    async fn settings(&self) -> GenerationSettings;

    /// 重新配置运行中的实例
    ///
    /// 无论传入哪个参数，都会重建提供方绑定
    async fn update_settings(&self, temperature: Option<f32>, tools: Option<Vec<Arc<dyn Tool>>>);

    /// 移除全部工具
    async fn remove_tools(&self) {
        self.update_settings(None, Some(Vec::new())).await;
    }
}
