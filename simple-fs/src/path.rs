//! 绝对路径的辅助函数。路径以 `/` 分隔，空分量一律忽略。

/// 依次产出路径的各个分量
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// 路径的层级数：`/` 为 0，`/a/b/c` 为 3
pub fn level(path: &str) -> usize {
    segments(path).count()
}

/// 路径的最后一个分量；根路径没有
pub fn file_name(path: &str) -> Option<&str> {
    path.rsplit('/').find(|s| !s.is_empty())
}
