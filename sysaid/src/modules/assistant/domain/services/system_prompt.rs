use super::super::value_objects::SystemContext;

/// 构建种子系统指令
///
/// 环境字段原样插入模板；目录列表渲染为 `['a', 'b']` 形式
pub fn build_system_prompt(context: &SystemContext) -> String {
    let directory_list = format!(
        "[{}]",
        context
            .directory_list
            .iter()
            .map(|name| format!("'{}'", name))
            .collect::<Vec<_>>()
            .join(", ")
    );

    format!(
        "
You are built-in OS assistant that helps user with usage of his OS

Context:

OS: {os}
Distribution: {distribution}
Current working directory: {current_dir}
Directory list: {directory_list}

Important:

1. If you are using provided tools that require path in their parameters - always pass this path.
2. Give short and precise answers.
3. Do not use Markdown or HTML for formatting, answer in plain text.
4. Answer like a human and do not read code exactly.
",
        os = context.operating_system,
        distribution = context.distribution,
        current_dir = context.cwd.display(),
    )
}
