// 命令分发总线
//
// 进程内、按类型路由：命令可注册多个处理器并发执行，查询只有一个处理器。
// 处理器在启动阶段注册，运行时只读。

use futures::future::join_all;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::modules::assistant::application::{
    ApplicationError, Command, CommandHandler, Query, QueryHandler,
};

type CommandHandlers<C> = Vec<Arc<dyn CommandHandler<C>>>;
type QueryHandlerSlot<Q> = Arc<dyn QueryHandler<Q>>;

/// 命令分发总线
#[derive(Default)]
pub struct DispatchBus {
    command_handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    query_handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl DispatchBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为命令类型追加一个处理器，按注册顺序返回结果
    pub fn register_command_handler<C: Command>(&mut self, handler: Arc<dyn CommandHandler<C>>) {
        let slot = self
            .command_handlers
            .entry(TypeId::of::<C>())
            .or_insert_with(|| Box::new(CommandHandlers::<C>::new()));

        if let Some(handlers) = slot.downcast_mut::<CommandHandlers<C>>() {
            handlers.push(handler);
            debug!(
                "[DispatchBus] Registered handler #{} for {}",
                handlers.len(),
                type_name::<C>()
            );
        }
    }

    /// 替换命令类型的全部处理器
    pub fn register_command_handlers<C, I>(&mut self, handlers: I)
    where
        C: Command,
        I: IntoIterator<Item = Arc<dyn CommandHandler<C>>>,
    {
        let handlers: CommandHandlers<C> = handlers.into_iter().collect();
        debug!(
            "[DispatchBus] Registered {} handler(s) for {}",
            handlers.len(),
            type_name::<C>()
        );
        self.command_handlers
            .insert(TypeId::of::<C>(), Box::new(handlers));
    }

    /// 注册查询处理器（同一类型只保留最后一次注册）
    pub fn register_query_handler<Q: Query>(&mut self, handler: Arc<dyn QueryHandler<Q>>) {
        let slot: QueryHandlerSlot<Q> = handler;
        if self
            .query_handlers
            .insert(TypeId::of::<Q>(), Box::new(slot))
            .is_some()
        {
            warn!("[DispatchBus] Replaced query handler for {}", type_name::<Q>());
        }
    }

    /// 已注册的命令处理器数量
    pub fn command_handler_count<C: Command>(&self) -> usize {
        self.command_handlers_for::<C>().map_or(0, Vec::len)
    }

    fn command_handlers_for<C: Command>(&self) -> Option<&CommandHandlers<C>> {
        self.command_handlers
            .get(&TypeId::of::<C>())
            .and_then(|slot| slot.downcast_ref::<CommandHandlers<C>>())
    }

    /// 分发命令
    ///
    /// 每个处理器在独立任务中执行，全部结束后才返回。
    /// 任一处理器失败时返回注册顺序中的第一个错误。
    pub async fn dispatch_command<C: Command>(
        &self,
        command: C,
    ) -> Result<Vec<C::Response>, ApplicationError> {
        let handlers = self
            .command_handlers_for::<C>()
            .filter(|handlers| !handlers.is_empty())
            .ok_or_else(|| ApplicationError::NoHandlerRegistered(type_name::<C>()))?;

        debug!(
            "[DispatchBus] Dispatching {} to {} handler(s)",
            type_name::<C>(),
            handlers.len()
        );

        let tasks = handlers.iter().map(|handler| {
            let handler = handler.clone();
            let command = command.clone();
            tokio::spawn(async move { handler.handle(command).await })
        });

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    error!("[DispatchBus] Handler for {} panicked: {}", type_name::<C>(), e);
                    Err(ApplicationError::HandlerPanicked(e.to_string()))
                })
            })
            .collect()
    }

    /// 分发查询
    pub async fn dispatch_query<Q: Query>(&self, query: Q) -> Result<Q::Response, ApplicationError> {
        let handler = self
            .query_handlers
            .get(&TypeId::of::<Q>())
            .and_then(|slot| slot.downcast_ref::<QueryHandlerSlot<Q>>())
            .ok_or_else(|| ApplicationError::NoHandlerRegistered(type_name::<Q>()))?;

        debug!("[DispatchBus] Dispatching query {}", type_name::<Q>());
        handler.handle(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct Ping(u64);

    impl Command for Ping {
        type Response = String;
    }

    struct Lookup;

    impl Query for Lookup {
        type Response = u32;
    }

    /// 延迟后返回标签，并记录执行次数
    struct LabelHandler {
        label: &'static str,
        delay_ms: u64,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandHandler<Ping> for LabelHandler {
        async fn handle(&self, command: Ping) -> Result<String, ApplicationError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}:{}", self.label, command.0))
        }
    }

    struct FailingHandler {
        message: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandHandler<Ping> for FailingHandler {
        async fn handle(&self, _command: Ping) -> Result<String, ApplicationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ApplicationError::ValidationError(self.message.to_string()))
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl CommandHandler<Ping> for PanickingHandler {
        async fn handle(&self, _command: Ping) -> Result<String, ApplicationError> {
            panic!("handler exploded");
        }
    }

    struct FixedLookup(u32);

    #[async_trait]
    impl QueryHandler<Lookup> for FixedLookup {
        async fn handle(&self, _query: Lookup) -> Result<u32, ApplicationError> {
            Ok(self.0)
        }
    }

    fn label(
        label: &'static str,
        delay_ms: u64,
        calls: &Arc<AtomicUsize>,
    ) -> Arc<dyn CommandHandler<Ping>> {
        Arc::new(LabelHandler {
            label,
            delay_ms,
            calls: calls.clone(),
        })
    }

    #[tokio::test]
    async fn test_no_handler() {
        let bus = DispatchBus::new();

        let result = bus.dispatch_command(Ping(1)).await;
        assert!(matches!(result, Err(ApplicationError::NoHandlerRegistered(_))));

        let result = bus.dispatch_query(Lookup).await;
        assert!(matches!(result, Err(ApplicationError::NoHandlerRegistered(_))));
    }

    #[tokio::test]
    async fn test_results_follow_registration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bus = DispatchBus::new();
        bus.register_command_handlers(vec![
            label("slow", 50, &calls),
            label("fast", 0, &calls),
            label("medium", 10, &calls),
        ]);

        let results = bus.dispatch_command(Ping(7)).await.unwrap();

        assert_eq!(results, vec!["slow:7", "fast:7", "medium:7"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(bus.command_handler_count::<Ping>(), 3);
    }

    #[tokio::test]
    async fn test_first_error_in_registration_order_after_all_finish() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bus = DispatchBus::new();
        bus.register_command_handler(label("ok", 0, &calls));
        bus.register_command_handler(Arc::new(FailingHandler {
            message: "first",
            calls: calls.clone(),
        }));
        bus.register_command_handler(label("late", 30, &calls));
        bus.register_command_handler(Arc::new(FailingHandler {
            message: "second",
            calls: calls.clone(),
        }));

        let result = bus.dispatch_command(Ping(1)).await;

        assert!(matches!(
            result,
            Err(ApplicationError::ValidationError(message)) if message == "first"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bus = DispatchBus::new();
        bus.register_command_handler(Arc::new(PanickingHandler));
        bus.register_command_handler(label("survivor", 10, &calls));

        let result = bus.dispatch_command(Ping(1)).await;

        assert!(matches!(result, Err(ApplicationError::HandlerPanicked(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_handlers_replaces_list() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bus = DispatchBus::new();
        bus.register_command_handler(label("old", 0, &calls));
        bus.register_command_handlers(vec![label("a", 0, &calls), label("b", 0, &calls)]);

        let results = bus.dispatch_command(Ping(2)).await.unwrap();
        assert_eq!(results, vec!["a:2", "b:2"]);

        bus.register_command_handlers(Vec::<Arc<dyn CommandHandler<Ping>>>::new());
        let result = bus.dispatch_command(Ping(3)).await;
        assert!(matches!(result, Err(ApplicationError::NoHandlerRegistered(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_dispatch() {
        let mut bus = DispatchBus::new();
        bus.register_query_handler::<Lookup>(Arc::new(FixedLookup(1)));
        bus.register_query_handler::<Lookup>(Arc::new(FixedLookup(42)));

        assert_eq!(bus.dispatch_query(Lookup).await.unwrap(), 42);
        assert_eq!(bus.command_handler_count::<Ping>(), 0);
    }
}
