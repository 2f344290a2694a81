// Modules Layer - 业务模块
//
// 按照六边形架构组织的业务模块：
// - assistant: 系统助手模块，处理对话、推理和工具调用

pub mod assistant;

pub use assistant::AssistantModule;
