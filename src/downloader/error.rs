use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    // 请求或读取响应体时的网络错误
    #[error("网络传输错误: {0}")]
    Transport(String),

    // 创建目录、打开或写入文件时的错误
    #[error("存储错误: {0}")]
    Storage(#[from] std::io::Error),

    #[error("目标文件已存在: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("目标文件正在被其他任务写入: {}", .0.display())]
    DestinationBusy(PathBuf),

    #[error("无效的下载任务: {0}")]
    InvalidTask(String),

    #[error("下载线程异常退出: {0}")]
    Worker(String),
}

impl From<reqwest::Error> for DownloadError {
    fn from(error: reqwest::Error) -> Self {
        DownloadError::Transport(error.to_string())
    }
}

impl From<tokio::task::JoinError> for DownloadError {
    fn from(error: tokio::task::JoinError) -> Self {
        DownloadError::Worker(error.to_string())
    }
}
