// Assistant Queries - 查询定义和处理器

mod get_conversation;

pub use get_conversation::*;
