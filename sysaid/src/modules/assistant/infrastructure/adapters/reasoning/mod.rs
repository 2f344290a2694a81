// 推理后端适配器

mod factory;
mod fake;
mod openai_compatible;
mod providers;
mod reducer;

pub use factory::create_reasoning_backend;
pub use fake::{FakeReasoningBackend, FAKE_REPLY};
pub use openai_compatible::{
    to_chat_messages, ChatMessage, ChatRequest, ChatTransport, FunctionCall, HttpChatTransport,
    OpenAICompatibleBackend, ProviderBinding, ProviderConfig, ToolCallPayload, DEFAULT_MAX_STEPS,
};
pub use providers::*;
pub use reducer::ResponseReducer;
