// 应用配置
//
// 凭据和存储位置从环境变量读取（可选 .env 文件），
// 生成参数由调用方显式构造。

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SQLITE_URL: &str = "sqlite://sysaid.db";
pub const DEFAULT_DGRAPH_URL: &str = "http://localhost:8080";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_MAX_STEPS: usize = 25;

/// 配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No value for setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// 推理后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    #[default]
    DeepSeek,
    Gemini,
    Fake,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(BackendKind::DeepSeek),
            "gemini" => Ok(BackendKind::Gemini),
            "fake" => Ok(BackendKind::Fake),
            _ => Err(ConfigError::InvalidValue {
                name: "llm",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::DeepSeek => "deepseek",
            BackendKind::Gemini => "gemini",
            BackendKind::Fake => "fake",
        };
        write!(f, "{}", name)
    }
}

/// 对话存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
    Dgraph,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            "dgraph" => Ok(StorageKind::Dgraph),
            _ => Err(ConfigError::InvalidValue {
                name: "storage",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Memory => "memory",
            StorageKind::Sqlite => "sqlite",
            StorageKind::Dgraph => "dgraph",
        };
        write!(f, "{}", name)
    }
}

/// 提供方凭据和存储位置
#[derive(Clone)]
pub struct Settings {
    deepseek_api_key: String,
    gemini_api_key: String,
    pub sqlite_url: String,
    pub dgraph_url: String,
}

impl Settings {
    /// 从环境变量加载，先读取可选的 .env 文件
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从键值表加载（测试或嵌入场景）
    pub fn from_map(values: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            deepseek_api_key: non_empty("DEEPSEEK_API_KEY").unwrap_or_default(),
            gemini_api_key: non_empty("GEMINI_API_KEY").unwrap_or_default(),
            sqlite_url: non_empty("SQLITE_URL").unwrap_or_else(|| DEFAULT_SQLITE_URL.to_string()),
            dgraph_url: non_empty("DGRAPH_URL").unwrap_or_else(|| DEFAULT_DGRAPH_URL.to_string()),
        }
    }

    pub fn with_deepseek_api_key(mut self, key: impl Into<String>) -> Self {
        self.deepseek_api_key = key.into();
        self
    }

    pub fn with_gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = key.into();
        self
    }

    pub fn deepseek_api_key(&self) -> Result<&str, ConfigError> {
        Self::required(&self.deepseek_api_key, "deepseek_api_key")
    }

    pub fn gemini_api_key(&self) -> Result<&str, ConfigError> {
        Self::required(&self.gemini_api_key, "gemini_api_key")
    }

    fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, ConfigError> {
        if value.trim().is_empty() {
            Err(ConfigError::MissingSetting(name))
        } else {
            Ok(value)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &str| if key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Settings")
            .field("deepseek_api_key", &redact(&self.deepseek_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("sqlite_url", &self.sqlite_url)
            .field("dgraph_url", &self.dgraph_url)
            .finish()
    }
}

/// 生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub kind: BackendKind,
    pub temperature: f32,
    pub enable_tools: bool,
    pub max_steps: usize,
}

impl LlmSettings {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_tools(mut self, enable_tools: bool) -> Self {
        self.enable_tools = enable_tools;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            temperature: DEFAULT_TEMPERATURE,
            enable_tools: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}
