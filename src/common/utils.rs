use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 连续的非字母数字字符
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

/// 把标题转换为可用作文件/目录名的形式，如 "My Playlist: Part 1!" -> "My-Playlist-Part-1"
pub fn sanitize_name(title: &str) -> String {
    NON_ALNUM
        .replace_all(title, "-")
        .trim_matches('-')
        .to_string()
}

/// 播放列表中的文件名，序号从 1 开始并补零，保证按播放列表顺序排列
pub fn ordinal_filename(index: usize, count: usize, title: &str, ext: &str) -> String {
    let width = count.to_string().len().max(2);
    let name = sanitize_name(title);
    let name = if name.is_empty() { "video".to_string() } else { name };
    format!("{:0width$} - {}.{}", index, name, ext, width = width)
}

pub struct FormatTool;

impl FormatTool {
    // 以 MB 为单位显示
    pub fn format_mb(size: u64) -> String {
        format!("{:.2} MB", size as f64 / 1024.0 / 1024.0)
    }

    // 格式化文件大小
    pub fn format_size(size: u64) -> String {
        if size == 0 {
            "0 MB".to_string()
        } else if size > 1024 * 1024 * 1024 {
            format!("{:.2} GB", size as f64 / 1024.0 / 1024.0 / 1024.0)
        } else if size > 1024 * 1024 {
            format!("{:.1} MB", size as f64 / 1024.0 / 1024.0)
        } else {
            format!("{:.1} KB", size as f64 / 1024.0)
        }
    }
}
