// Assistant Domain - Entities
// 实体通过唯一标识符来识别

mod conversation;
mod message;

pub use conversation::*;
pub use message::*;
