use super::super::entities::{Conversation, Message};
use super::super::value_objects::{ConversationId, SystemContext};
use super::build_system_prompt;

/// 对话工厂
///
/// 领域服务：决定新对话的 ID、标题和种子消息
#[derive(Debug, Clone, Default)]
pub struct ConversationFactory;

impl ConversationFactory {
    pub fn new() -> Self {
        Self
    }

    /// 创建新对话
    ///
    /// 优先使用调用方提供的 ID，否则生成新 ID
    pub fn create(
        &self,
        requested_id: Option<ConversationId>,
        user_text: &str,
        context: &SystemContext,
    ) -> Conversation {
        let id = requested_id.unwrap_or_default();
        let seed = Message::new_assistant(build_system_prompt(context));
        Conversation::start(id, derive_title(user_text), seed)
    }
}

/// 根据第一条用户消息生成标题
///
/// 标题保留完整的消息文本，不截断也不追加省略号
pub fn derive_title(user_text: &str) -> String {
    user_text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::assistant::domain::Sender;

    fn context() -> SystemContext {
        SystemContext::new("Linux", "Ubuntu", "/home/u", vec!["a".to_string()])
    }

    #[test]
    fn test_short_title_is_verbatim() {
        assert_eq!(derive_title("what OS am I on?"), "what OS am I on?");
        let text = "x".repeat(199);
        assert_eq!(derive_title(&text), text);
    }

    #[test]
    fn test_long_title_keeps_full_text() {
        let text = "x".repeat(250);
        assert_eq!(derive_title(&text), text);

        let text = "é".repeat(200);
        assert_eq!(derive_title(&text), text);
    }

    #[test]
    fn test_create_uses_requested_id() {
        let factory = ConversationFactory::new();
        let conversation =
            factory.create(Some(ConversationId::from("given")), "hello", &context());

        assert_eq!(conversation.id().as_str(), "given");
        assert_eq!(conversation.title(), "hello");
        assert_eq!(conversation.message_count(), 1);
        assert_eq!(conversation.messages()[0].sender(), Sender::Assistant);
        assert!(conversation.messages()[0].content().contains("OS: Linux"));
    }

    #[test]
    fn test_create_generates_id() {
        let factory = ConversationFactory::new();
        let first = factory.create(None, "hello", &context());
        let second = factory.create(None, "hello", &context());
        assert_ne!(first.id(), second.id());
    }
}
