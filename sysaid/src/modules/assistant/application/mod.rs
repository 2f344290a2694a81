// Assistant Application Layer - 应用层
// 实现 CQRS 模式的命令和查询处理器

pub mod commands;
pub mod queries;

// 导出命令和查询
pub use commands::*;
pub use queries::*;

use async_trait::async_trait;
use thiserror::Error;

use super::ports::{ReasoningError, RepositoryError};

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("No handler registered for {0}")]
    NoHandlerRegistered(&'static str),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] RepositoryError),

    #[error("Reasoning failure: {0}")]
    ReasoningFailure(#[from] ReasoningError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}

/// 命令标记 trait
///
/// 命令可以被分发给多个处理器，因此需要可克隆
pub trait Command: Clone + Send + Sync + 'static {
    type Response: Send + 'static;
}

/// 查询标记 trait
///
/// 查询只有一个处理器，结果直接返回
pub trait Query: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// 命令处理器 trait
///
/// 遵循 CQRS 模式，命令处理器负责执行有副作用的操作
#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Command,
{
    /// 执行命令
    async fn handle(&self, command: C) -> Result<C::Response, ApplicationError>;
}

/// 查询处理器 trait
///
/// 遵循 CQRS 模式，查询处理器负责只读操作
#[async_trait]
pub trait QueryHandler<Q>: Send + Sync
where
    Q: Query,
{
    /// 执行查询
    async fn handle(&self, query: Q) -> Result<Q::Response, ApplicationError>;
}
