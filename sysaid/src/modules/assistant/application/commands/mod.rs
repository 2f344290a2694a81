// Assistant Commands - 命令定义和处理器

mod request_system_help;

pub use request_system_help::*;
