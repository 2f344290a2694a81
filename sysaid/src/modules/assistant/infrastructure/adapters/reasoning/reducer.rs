// 推理事件归约器
//
// 消费推理事件流，返回最后一条由助手（或系统）产生的文本内容。

use futures::StreamExt;
use tracing::debug;

use crate::modules::assistant::ports::{ReasoningError, ReasoningEvent, ReasoningEventStream};

/// 事件流归约器
pub struct ResponseReducer;

impl ResponseReducer {
    /// 将事件流归约为最终回答
    ///
    /// 没有任何助手/系统内容时返回空字符串；流中出现错误立即中止
    pub async fn reduce(mut events: ReasoningEventStream) -> Result<String, ReasoningError> {
        let mut answer = String::new();

        while let Some(event) = events.next().await {
            match event? {
                ReasoningEvent::Content { role, text } if role.is_terminal() => {
                    answer = text;
                }
                ReasoningEvent::Content { .. } => {}
                ReasoningEvent::ToolCall { name, .. } => {
                    debug!("Tool call observed: {}", name);
                }
                ReasoningEvent::ToolResult { name, .. } => {
                    debug!("Tool result observed: {}", name);
                }
            }
        }

        Ok(answer)
    }
}
