use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 系统环境上下文
///
/// 由外部环境探测方提供，原样插入种子系统消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemContext {
    pub operating_system: String,
    pub distribution: String,
    pub cwd: PathBuf,
    pub directory_list: Vec<String>,
}

impl SystemContext {
    pub fn new(
        operating_system: impl Into<String>,
        distribution: impl Into<String>,
        cwd: impl Into<PathBuf>,
        directory_list: Vec<String>,
    ) -> Self {
        Self {
            operating_system: operating_system.into(),
            distribution: distribution.into(),
            cwd: cwd.into(),
            directory_list,
        }
    }

    /// 探测当前主机环境
    ///
    /// 读取失败的字段回退为空值，不会报错
    pub fn detect(cwd: &Path) -> Self {
        let mut directory_list: Vec<String> = std::fs::read_dir(cwd)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        directory_list.sort();

        Self {
            operating_system: operating_system_name().to_string(),
            distribution: detect_distribution().unwrap_or_default(),
            cwd: cwd.to_path_buf(),
            directory_list,
        }
    }
}

fn operating_system_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        other => other,
    }
}

/// 从 os-release 中读取发行版名称
fn detect_distribution() -> Option<String> {
    let content = std::fs::read_to_string("/etc/os-release")
        .or_else(|_| std::fs::read_to_string("/usr/lib/os-release"))
        .ok()?;
    parse_os_release_name(&content)
}

fn parse_os_release_name(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.strip_prefix("NAME=")
            .map(|value| value.trim_matches('"').to_string())
    })
}
