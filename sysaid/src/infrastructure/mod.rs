pub mod config;
pub mod dispatch_bus;

pub use config::{BackendKind, ConfigError, LlmSettings, Settings, StorageKind};
pub use dispatch_bus::DispatchBus;
