// Assistant Tools - 推理后端可调用的本地工具

mod os;

pub use os::*;
