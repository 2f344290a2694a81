// 操作系统工具
//
// 文件和目录操作，供推理后端在工具调用循环中使用。
// 权限以整数形式传入（例如 438 即 0o666），非 Unix 平台忽略权限参数。

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::modules::assistant::ports::{
    optional_bool, optional_u32, required_str, ParameterType, Tool, ToolError, ToolParameter,
};

pub const DEFAULT_FILE_MODE: u32 = 438;
pub const DEFAULT_FOLDER_MODE: u32 = 511;

/// 全部操作系统工具
pub fn os_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateFileTool),
        Arc::new(CreateFolderTool),
        Arc::new(ChangePermissionsTool),
        Arc::new(DeleteFileTool),
        Arc::new(DeleteFolderTool),
        Arc::new(IsValidPathTool),
    ]
}

#[cfg(unix)]
fn create_file_with_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .mode(mode)
        .open(path)
        .map(|_| ())
}

#[cfg(not(unix))]
fn create_file_with_mode(path: &Path, _mode: u32) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
}

#[cfg(unix)]
fn create_dir_with_mode(path: &Path, parents: bool, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(parents).mode(mode).create(path)
}

#[cfg(not(unix))]
fn create_dir_with_mode(path: &Path, parents: bool, _mode: u32) -> std::io::Result<()> {
    fs::DirBuilder::new().recursive(parents).create(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

fn set_mode_recursive(path: &Path, mode: u32) -> std::io::Result<()> {
    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            set_mode_recursive(&entry?.path(), mode)?;
        }
    }
    set_mode(path, mode)
}

/// 创建文件（已存在时保持不变）
pub struct CreateFileTool;

impl Tool for CreateFileTool {
    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Create a file by path."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "file_path",
                ParameterType::String,
                "absolute path of the new file (e.g. /home/user/new_file.txt).",
            ),
            ToolParameter::optional(
                "permission_level",
                ParameterType::Integer,
                "UNIX permissions level represented as number, default is 438.",
            ),
        ]
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let path = required_str(arguments, "file_path")?;
        let mode = optional_u32(arguments, "permission_level")?.unwrap_or(DEFAULT_FILE_MODE);

        create_file_with_mode(Path::new(path), mode)?;
        info!("Created file: {}", path);
        Ok(json!(format!("Created file {}", path)))
    }
}

/// 创建目录
pub struct CreateFolderTool;

impl Tool for CreateFolderTool {
    fn name(&self) -> &str {
        "create_folder"
    }

    fn description(&self) -> &str {
        "Create folder by path."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "folder_path",
                ParameterType::String,
                "absolute path to the new folder (e.g. /home/user/my_new_folder).",
            ),
            ToolParameter::optional(
                "parents",
                ParameterType::Boolean,
                "if true create folders that don't exist on the path to the new folder.",
            ),
            ToolParameter::optional(
                "permission_level",
                ParameterType::Integer,
                "UNIX permissions level represented as number, default is 511.",
            ),
        ]
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let path = required_str(arguments, "folder_path")?;
        let parents = optional_bool(arguments, "parents")?.unwrap_or(false);
        let mode = optional_u32(arguments, "permission_level")?.unwrap_or(DEFAULT_FOLDER_MODE);

        create_dir_with_mode(Path::new(path), parents, mode)?;
        info!("Created folder: {}", path);
        Ok(json!(format!("Created folder {}", path)))
    }
}

/// 修改权限
pub struct ChangePermissionsTool;

impl Tool for ChangePermissionsTool {
    fn name(&self) -> &str {
        "change_permissions"
    }

    fn description(&self) -> &str {
        "Change permission of the file or folder."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "path",
                ParameterType::String,
                "absolute path to the file or folder (e.g. /home/user/my_folder/my_file.pdf).",
            ),
            ToolParameter::required(
                "permission_level",
                ParameterType::Integer,
                "UNIX permission level represented as number (e.g. 511).",
            ),
            ToolParameter::optional(
                "recursive",
                ParameterType::Boolean,
                "if path target is folder - changes permissions recursively.",
            ),
        ]
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let path = required_str(arguments, "path")?;
        let mode = optional_u32(arguments, "permission_level")?.ok_or_else(|| {
            ToolError::InvalidArguments("missing integer argument `permission_level`".to_string())
        })?;
        let recursive = optional_bool(arguments, "recursive")?.unwrap_or(false);

        let target = Path::new(path);
        if !target.exists() {
            return Err(ToolError::ExecutionFailed(format!("{} does not exist", path)));
        }

        if recursive {
            set_mode_recursive(target, mode)?;
        } else {
            set_mode(target, mode)?;
        }
        info!("Changed permissions: path={}, mode={:o}", path, mode);
        Ok(json!(format!("Changed permissions of {} to {:o}", path, mode)))
    }
}

/// 删除文件
pub struct DeleteFileTool;

impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file by path."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "file_path",
            ParameterType::String,
            "absolute path of the file to delete.",
        )]
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let path = required_str(arguments, "file_path")?;

        fs::remove_file(path)?;
        info!("Deleted file: {}", path);
        Ok(json!(format!("Deleted file {}", path)))
    }
}

/// 删除目录
pub struct DeleteFolderTool;

impl Tool for DeleteFolderTool {
    fn name(&self) -> &str {
        "delete_folder"
    }

    fn description(&self) -> &str {
        "Delete a folder by path."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "folder_path",
                ParameterType::String,
                "absolute path of the folder to delete.",
            ),
            ToolParameter::optional(
                "recursive",
                ParameterType::Boolean,
                "if true delete the folder together with everything inside it.",
            ),
        ]
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let path = required_str(arguments, "folder_path")?;
        let recursive = optional_bool(arguments, "recursive")?.unwrap_or(false);

        if recursive {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_dir(path)?;
        }
        info!("Deleted folder: {}", path);
        Ok(json!(format!("Deleted folder {}", path)))
    }
}

/// 检查路径是否存在
pub struct IsValidPathTool;

impl Tool for IsValidPathTool {
    fn name(&self) -> &str {
        "is_valid_path"
    }

    fn description(&self) -> &str {
        "Check whether a file or folder exists at the given path."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required(
            "path",
            ParameterType::String,
            "absolute path to check.",
        )]
    }

    fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let path = required_str(arguments, "path")?;
        Ok(json!(Path::new(path).exists()))
    }
}
