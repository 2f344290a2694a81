// Dgraph 对话存储实现
//
// 通过 Dgraph HTTP 接口读写：/alter 设置 schema，/query 读取，
// /mutate?commitNow=true 以 upsert block 整体替换对话。
// 消息节点带 message.seq 序号，读取时按序号升序返回。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::modules::assistant::domain::{Conversation, ConversationId, Message, Sender};
use crate::modules::assistant::ports::{ConversationStore, RepositoryError};

/// Dgraph schema
pub const SCHEMA: &str = r#"
conversation.id: string @index(exact) @upsert .
conversation.title: string .
conversation.messages: [uid] .
message.sender: string .
message.content: string .
message.seq: int .

type Conversation {
    conversation.id
    conversation.title
    conversation.messages
}

type Message {
    message.sender
    message.content
    message.seq
}
"#;

const GET_CONVERSATION_QUERY: &str = r#"
query conversation($id: string) {
    conversation(func: eq(conversation.id, $id)) @filter(type(Conversation)) {
        conversation.title
        conversation.messages (orderasc: message.seq) {
            message.sender
            message.content
        }
    }
}
"#;

#[derive(Debug, Deserialize)]
struct DgraphResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<DgraphError>,
}

#[derive(Debug, Deserialize)]
struct DgraphError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ConversationData {
    #[serde(default)]
    conversation: Vec<ConversationNode>,
}

#[derive(Debug, Deserialize)]
struct ConversationNode {
    #[serde(rename = "conversation.title")]
    title: String,
    #[serde(rename = "conversation.messages", default)]
    messages: Vec<MessageNode>,
}

#[derive(Debug, Deserialize)]
struct MessageNode {
    #[serde(rename = "message.sender")]
    sender: String,
    #[serde(rename = "message.content")]
    content: String,
}

/// Dgraph 对话存储
pub struct DgraphConversationStore {
    base_url: String,
    client: Client,
}

impl DgraphConversationStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// 创建存储并写入 schema
    pub async fn connect(base_url: impl Into<String>) -> Result<Self, RepositoryError> {
        let store = Self::new(base_url)?;
        store.ensure_schema().await?;
        info!("Connected to Dgraph: url={}", store.base_url);
        Ok(store)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// 写入 schema（幂等）
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        let response = self
            .client
            .post(self.endpoint("alter"))
            .body(SCHEMA)
            .send()
            .await
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        let body: DgraphResponse<Value> = Self::read_response(response).await?;
        Self::check_errors(&body.errors)
    }

    async fn read_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<DgraphResponse<T>, RepositoryError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Dgraph error: {} - {}", status, error_text);
            return Err(RepositoryError::DatabaseError(format!(
                "{}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    fn check_errors(errors: &[DgraphError]) -> Result<(), RepositoryError> {
        if errors.is_empty() {
            return Ok(());
        }
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(RepositoryError::DatabaseError(message))
    }

    /// 读取请求体
    fn query_body(id: &ConversationId) -> Value {
        json!({
            "query": GET_CONVERSATION_QUERY,
            "variables": { "$id": id.as_str() },
        })
    }

    /// 构建 upsert 请求体
    ///
    /// 先删除旧的消息节点及其边，再写入完整的新消息列表；
    /// 对话不存在时 uid(c) 为空，Dgraph 会创建新节点。
    fn upsert_body(conversation: &Conversation) -> Value {
        // JSON 字符串转义同样适用于 DQL 字符串字面量
        let id_literal = Value::String(conversation.id().as_str().to_string()).to_string();
        let query = format!(
            "{{ c as var(func: eq(conversation.id, {})) {{ m as conversation.messages }} }}",
            id_literal
        );

        let messages: Vec<Value> = conversation
            .messages()
            .iter()
            .enumerate()
            .map(|(seq, message)| {
                json!({
                    "dgraph.type": "Message",
                    "message.sender": message.sender().as_str(),
                    "message.content": message.content(),
                    "message.seq": seq,
                })
            })
            .collect();

        json!({
            "query": query,
            "mutations": [
                {
                    "delNquads": "uid(m) * * .\nuid(c) <conversation.messages> uid(m) ."
                },
                {
                    "set": {
                        "uid": "uid(c)",
                        "dgraph.type": "Conversation",
                        "conversation.id": conversation.id().as_str(),
                        "conversation.title": conversation.title(),
                        "conversation.messages": messages,
                    }
                }
            ]
        })
    }

    fn into_conversation(
        id: &ConversationId,
        data: Option<ConversationData>,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let Some(node) = data.and_then(|d| d.conversation.into_iter().next()) else {
            return Ok(None);
        };

        let messages = node
            .messages
            .into_iter()
            .map(|m| {
                m.sender
                    .parse::<Sender>()
                    .map(|sender| Message::new(sender, m.content))
                    .map_err(|e| RepositoryError::SerializationError(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Conversation::restore(id.clone(), node.title, messages)))
    }
}

#[async_trait]
impl ConversationStore for DgraphConversationStore {
    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        debug!("Get conversation by id: id={}", id);

        let response = self
            .client
            .post(self.endpoint("query"))
            .header("Content-Type", "application/json")
            .json(&Self::query_body(id))
            .send()
            .await
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        let body: DgraphResponse<ConversationData> = Self::read_response(response).await?;
        Self::check_errors(&body.errors)?;
        Self::into_conversation(id, body.data)
    }

    async fn save(&self, conversation: &Conversation) -> Result<ConversationId, RepositoryError> {
        debug!(
            "Save conversation: id={}, messages={}",
            conversation.id(),
            conversation.message_count()
        );

        let response = self
            .client
            .post(self.endpoint("mutate?commitNow=true"))
            .header("Content-Type", "application/json")
            .json(&Self::upsert_body(conversation))
            .send()
            .await
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        let body: DgraphResponse<Value> = Self::read_response(response).await?;
        Self::check_errors(&body.errors)?;
        Ok(conversation.id().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Conversation {
        let mut conversation = Conversation::start(
            ConversationId::from("c\"1"),
            "Title",
            Message::new_assistant("seed"),
        );
        conversation.add_message(Message::new_user("question"));
        conversation
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let store = DgraphConversationStore::new("http://localhost:8080/").unwrap();
        assert_eq!(store.endpoint("query"), "http://localhost:8080/query");
    }

    #[test]
    fn test_query_body_binds_id_variable() {
        let body = DgraphConversationStore::query_body(&ConversationId::from("abc"));
        assert_eq!(body["variables"]["$id"], "abc");
        assert!(body["query"]
            .as_str()
            .unwrap()
            .contains("orderasc: message.seq"));
    }

    #[test]
    fn test_upsert_body_escapes_id_and_numbers_messages() {
        let body = DgraphConversationStore::upsert_body(&sample());

        let query = body["query"].as_str().unwrap();
        assert!(query.contains(r#"eq(conversation.id, "c\"1")"#));

        let set = &body["mutations"][1]["set"];
        assert_eq!(set["uid"], "uid(c)");
        assert_eq!(set["conversation.title"], "Title");

        let messages = set["conversation.messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["message.sender"], "assistant");
        assert_eq!(messages[0]["message.seq"], 0);
        assert_eq!(messages[1]["message.sender"], "user");
        assert_eq!(messages[1]["message.content"], "question");
        assert_eq!(messages[1]["message.seq"], 1);
    }

    #[test]
    fn test_parse_query_response() {
        let raw = r#"{
            "data": {
                "conversation": [{
                    "conversation.title": "Title",
                    "conversation.messages": [
                        {"message.sender": "assistant", "message.content": "seed"},
                        {"message.sender": "user", "message.content": "question"}
                    ]
                }]
            }
        }"#;
        let body: DgraphResponse<ConversationData> = serde_json::from_str(raw).unwrap();
        let id = ConversationId::from("c\"1");

        let conversation = DgraphConversationStore::into_conversation(&id, body.data)
            .unwrap()
            .unwrap();

        assert_eq!(conversation, sample());
    }

    #[test]
    fn test_parse_empty_response_is_none() {
        let body: DgraphResponse<ConversationData> =
            serde_json::from_str(r#"{"data": {"conversation": []}}"#).unwrap();
        let result =
            DgraphConversationStore::into_conversation(&ConversationId::from("x"), body.data)
                .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_errors_are_reported() {
        let body: DgraphResponse<Value> =
            serde_json::from_str(r#"{"errors": [{"message": "boom"}]}"#).unwrap();
        let result = DgraphConversationStore::check_errors(&body.errors);
        assert!(matches!(result, Err(RepositoryError::DatabaseError(m)) if m == "boom"));
    }
}
