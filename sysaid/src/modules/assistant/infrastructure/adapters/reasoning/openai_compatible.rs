// OpenAI 兼容推理后端
//
// 以 chat/completions 协议驱动工具调用循环：
// 每一步把完整历史发给模型，模型请求工具时在本地执行并把结果回灌，
// 直到模型给出不带工具调用的回复或达到步数上限。

use async_trait::async_trait;
use futures::stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::ResponseReducer;
use crate::modules::assistant::domain::{Answer, ConversationId, Message, Sender};
use crate::modules::assistant::ports::{
    parameters_schema, EventRole, GenerationSettings, ReasoningBackend, ReasoningError,
    ReasoningEvent, ReasoningEventStream, Tool,
};

/// 默认最大推理步数
pub const DEFAULT_MAX_STEPS: usize = 25;

/// chat/completions 请求
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

/// 协议消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// 工具结果消息
    pub fn tool_output(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::text("tool", output)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON 编码的参数字符串
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// 单次补全传输层
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, ReasoningError>;
}

/// 提供方连接配置
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_steps: usize,
}

/// HTTP 传输实现
pub struct HttpChatTransport {
    provider_id: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpChatTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self, ReasoningError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReasoningError::NetworkError(e.to_string()))?;

        Ok(Self {
            provider_id: config.provider_id.clone(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, ReasoningError> {
        debug!(
            "Sending request to {}: model={}, messages={}",
            self.provider_id,
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ReasoningError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("{} API error: {} - {}", self.provider_id, status, error_text);
            return Err(ReasoningError::ApiError {
                code: status.as_str().to_string(),
                message: error_text,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::InvalidResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ReasoningError::InvalidResponse("No choices in response".to_string()))
    }
}

/// 提供方绑定：当前温度、工具集以及发给模型的工具声明
pub struct ProviderBinding {
    temperature: f32,
    tools: Vec<Arc<dyn Tool>>,
    tool_schemas: Vec<Value>,
}

impl ProviderBinding {
    pub fn new(temperature: f32, tools: Vec<Arc<dyn Tool>>) -> Self {
        let tool_schemas = tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": parameters_schema(&tool.parameters()),
                    }
                })
            })
            .collect();

        Self {
            temperature,
            tools,
            tool_schemas,
        }
    }

    pub fn tool_schemas(&self) -> &[Value] {
        &self.tool_schemas
    }

    /// 执行工具，失败信息以文本形式返回给模型
    fn run_tool(&self, name: &str, arguments: &Value) -> String {
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == name) else {
            warn!("Model requested unknown tool: {}", name);
            return format!("Error: unknown tool `{}`", name);
        };

        match tool.invoke(arguments) {
            Ok(Value::String(output)) => output,
            Ok(output) => output.to_string(),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                format!("Error: {}", e)
            }
        }
    }
}

fn event_role(index: usize, message: &Message) -> EventRole {
    match message.sender() {
        Sender::User => EventRole::User,
        Sender::Assistant if index == 0 => EventRole::System,
        Sender::Assistant => EventRole::Assistant,
    }
}

fn wire_role(role: EventRole) -> &'static str {
    match role {
        EventRole::User => "user",
        EventRole::Assistant => "assistant",
        EventRole::System => "system",
    }
}

/// 对话历史转换为协议消息，首条助手消息（种子）作为 system 发送
pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            ChatMessage::text(wire_role(event_role(index, message)), message.content())
        })
        .collect()
}

fn parse_arguments(call: &FunctionCall) -> Result<Value, ReasoningError> {
    if call.arguments.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&call.arguments).map_err(|e| ReasoningError::MalformedToolCall {
        name: call.name.clone(),
        message: e.to_string(),
    })
}

/// 工具调用循环状态
struct AgentLoop {
    model: String,
    max_steps: usize,
    transport: Arc<dyn ChatTransport>,
    binding: Arc<ProviderBinding>,
    history: Vec<ChatMessage>,
    pending: VecDeque<ReasoningEvent>,
    steps: usize,
    done: bool,
}

impl AgentLoop {
    async fn next_event(&mut self) -> Option<Result<ReasoningEvent, ReasoningError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }
            if self.steps >= self.max_steps {
                self.done = true;
                warn!("Reasoning stopped after {} steps", self.max_steps);
                return Some(Err(ReasoningError::StepLimitExceeded(self.max_steps)));
            }

            self.steps += 1;
            if let Err(e) = self.step().await {
                self.done = true;
                return Some(Err(e));
            }
        }
    }

    async fn step(&mut self) -> Result<(), ReasoningError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.history.clone(),
            temperature: self.binding.temperature,
            tools: self.binding.tool_schemas.clone(),
        };

        let reply = self.transport.complete(&request).await?;
        let text = reply.content.clone().unwrap_or_default();
        let calls = reply
            .tool_calls
            .iter()
            .map(|call| parse_arguments(&call.function).map(|arguments| (call.clone(), arguments)))
            .collect::<Result<Vec<_>, _>>()?;
        self.history.push(reply);

        if calls.is_empty() {
            self.pending
                .push_back(ReasoningEvent::content(EventRole::Assistant, text));
            self.done = true;
            return Ok(());
        }

        if !text.trim().is_empty() {
            self.pending
                .push_back(ReasoningEvent::content(EventRole::Assistant, text));
        }

        for (call, arguments) in calls {
            let name = call.function.name;
            debug!("Invoking tool: {} (step {})", name, self.steps);

            let output = self.run_tool_blocking(&name, &arguments).await;
            self.pending
                .push_back(ReasoningEvent::tool_call(name.clone(), arguments));
            self.history
                .push(ChatMessage::tool_output(call.id, output.clone()));
            self.pending
                .push_back(ReasoningEvent::ToolResult { name, output });
        }

        Ok(())
    }

    /// 工具执行同步文件系统操作，放到阻塞线程池运行
    async fn run_tool_blocking(&self, name: &str, arguments: &Value) -> String {
        let binding = self.binding.clone();
        let tool_name = name.to_string();
        let tool_arguments = arguments.clone();

        tokio::task::spawn_blocking(move || binding.run_tool(&tool_name, &tool_arguments))
            .await
            .unwrap_or_else(|e| {
                error!("Tool {} panicked: {}", name, e);
                format!("Error: tool `{}` panicked", name)
            })
    }
}

/// OpenAI 兼容推理后端
pub struct OpenAICompatibleBackend {
    provider_id: String,
    model: String,
    max_steps: usize,
    transport: Arc<dyn ChatTransport>,
    binding: RwLock<Arc<ProviderBinding>>,
}

impl OpenAICompatibleBackend {
    /// 使用 HTTP 传输创建后端
    pub fn new(config: ProviderConfig, settings: GenerationSettings) -> Result<Self, ReasoningError> {
        let transport = Arc::new(HttpChatTransport::new(&config)?);
        Ok(Self::with_transport(
            config.provider_id,
            config.model,
            config.max_steps,
            transport,
            settings,
        ))
    }

    /// 使用自定义传输创建后端
    pub fn with_transport(
        provider_id: impl Into<String>,
        model: impl Into<String>,
        max_steps: usize,
        transport: Arc<dyn ChatTransport>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model: model.into(),
            max_steps,
            transport,
            binding: RwLock::new(Arc::new(ProviderBinding::new(
                settings.temperature,
                settings.tools,
            ))),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 当前提供方绑定
    pub async fn binding(&self) -> Arc<ProviderBinding> {
        self.binding.read().await.clone()
    }

    /// 推理事件流
    ///
    /// 第一个事件是输入中的最后一条消息，随后是模型回复和工具往返
    pub async fn stream(&self, messages: &[Message]) -> ReasoningEventStream {
        let binding = self.binding().await;

        let mut pending = VecDeque::new();
        if let Some((index, last)) = messages.iter().enumerate().last() {
            pending.push_back(ReasoningEvent::content(
                event_role(index, last),
                last.content(),
            ));
        }

        let state = AgentLoop {
            model: self.model.clone(),
            max_steps: self.max_steps,
            transport: self.transport.clone(),
            binding,
            history: to_chat_messages(messages),
            pending,
            steps: 0,
            done: false,
        };

        Box::pin(stream::unfold(state, |mut state| async move {
            let event = state.next_event().await?;
            Some((event, state))
        }))
    }
}

#[async_trait]
impl ReasoningBackend for OpenAICompatibleBackend {
    fn backend_id(&self) -> &str {
        &self.provider_id
    }

    async fn chat(
        &self,
        conversation_id: &ConversationId,
        messages: &[Message],
    ) -> Result<Answer, ReasoningError> {
        let events = self.stream(messages).await;
        let content = ResponseReducer::reduce(events).await?;

        debug!(
            "{} answered conversation {}: {} chars",
            self.provider_id,
            conversation_id,
            content.len()
        );
        Ok(Answer::success(conversation_id.clone(), content))
    }

    async fn settings(&self) -> GenerationSettings {
        let binding = self.binding().await;
        GenerationSettings::new(binding.temperature, binding.tools.clone())
    }

    async fn update_settings(&self, temperature: Option<f32>, tools: Option<Vec<Arc<dyn Tool>>>) {
        let mut binding = self.binding.write().await;
        let temperature = temperature.unwrap_or(binding.temperature);
        let tools = tools.unwrap_or_else(|| binding.tools.clone());

        info!(
            "Rebinding {}: temperature={}, tools={}",
            self.provider_id,
            temperature,
            tools.len()
        );
        *binding = Arc::new(ProviderBinding::new(temperature, tools));
    }
}
