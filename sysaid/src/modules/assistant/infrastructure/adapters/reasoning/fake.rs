use async_trait::async_trait;
use futures::stream;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::ResponseReducer;
use crate::modules::assistant::domain::{Answer, ConversationId, Message};
use crate::modules::assistant::ports::{
    EventRole, GenerationSettings, ReasoningBackend, ReasoningError, ReasoningEvent,
    ReasoningEventStream, Tool,
};

/// 固定回复
pub const FAKE_REPLY: &str = "I'm LLM";

/// 确定性推理后端（用于测试和离线运行）
///
/// 每次调用都回放同一段事件脚本，不访问网络
pub struct FakeReasoningBackend {
    script: Vec<ReasoningEvent>,
    settings: RwLock<GenerationSettings>,
    received: RwLock<Vec<Vec<Message>>>,
}

impl FakeReasoningBackend {
    pub fn new() -> Self {
        Self::with_content(FAKE_REPLY)
    }

    /// 总是回答给定内容
    pub fn with_content(content: impl Into<String>) -> Self {
        Self::scripted(vec![ReasoningEvent::content(EventRole::Assistant, content)])
    }

    /// 回放给定事件脚本
    pub fn scripted(script: Vec<ReasoningEvent>) -> Self {
        Self {
            script,
            settings: RwLock::new(GenerationSettings::default()),
            received: RwLock::new(Vec::new()),
        }
    }

    /// 每次调用收到的消息历史
    pub async fn received(&self) -> Vec<Vec<Message>> {
        self.received.read().await.clone()
    }

    fn stream(&self, messages: &[Message]) -> ReasoningEventStream {
        let echo = messages
            .last()
            .map(|message| ReasoningEvent::content(EventRole::User, message.content()));

        let events: Vec<Result<ReasoningEvent, ReasoningError>> = echo
            .into_iter()
            .chain(self.script.iter().cloned())
            .map(Ok)
            .collect();

        Box::pin(stream::iter(events))
    }
}

impl Default for FakeReasoningBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningBackend for FakeReasoningBackend {
    fn backend_id(&self) -> &str {
        "fake"
    }

    async fn chat(
        &self,
        conversation_id: &ConversationId,
        messages: &[Message],
    ) -> Result<Answer, ReasoningError> {
        debug!(
            "Fake backend called: conversation={}, messages={}",
            conversation_id,
            messages.len()
        );
        self.received.write().await.push(messages.to_vec());

        let content = ResponseReducer::reduce(self.stream(messages)).await?;
        Ok(Answer::success(conversation_id.clone(), content))
    }

    async fn settings(&self) -> GenerationSettings {
        self.settings.read().await.clone()
    }

    async fn update_settings(&self, temperature: Option<f32>, tools: Option<Vec<Arc<dyn Tool>>>) {
        let mut settings = self.settings.write().await;
        if let Some(temperature) = temperature {
            settings.temperature = temperature;
        }
        if let Some(tools) = tools {
            settings.tools = tools;
        }
    }
}
