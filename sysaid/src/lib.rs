pub mod infrastructure;
pub mod modules;
pub mod shared;

use tracing_subscriber::EnvFilter;

pub use infrastructure::{BackendKind, DispatchBus, LlmSettings, Settings, StorageKind};
pub use modules::AssistantModule;
pub use shared::{AppError, AppResult};

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 info，调试模式下为 debug。重复调用时忽略。
pub fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
