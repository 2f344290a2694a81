// Assistant Ports Layer
// 端口定义了模块与外部世界的接口

mod conversation_store;
mod reasoning_backend;
mod tool;

pub use conversation_store::*;
pub use reasoning_backend::*;
pub use tool::*;
