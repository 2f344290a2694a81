// Assistant Domain - Value Objects
// 值对象是不可变的，通过值而非标识来比较

mod answer;
mod conversation_id;
mod sender;
mod system_context;

pub use answer::*;
pub use conversation_id::*;
pub use sender::*;
pub use system_context::*;
