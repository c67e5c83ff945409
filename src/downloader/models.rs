use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};

/// 默认分块大小（字节）
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// 已存在目标文件时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverwritePolicy {
    #[default]
    Overwrite, // 截断重写
    Reject,    // 拒绝写入，保留原文件
}

/// 一个下载任务，提交之后不再修改
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub task_id: String,
    pub url: String,
    pub title: String,
    pub output_path: PathBuf,
    pub expected_size: Option<u64>,
    pub chunk_size: usize,
    pub overwrite: OverwritePolicy,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            title: String::new(),
            output_path: output_path.into(),
            expected_size: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overwrite: OverwritePolicy::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_expected_size(mut self, size: Option<u64>) -> Self {
        self.expected_size = size;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }
}

// --------------------------------------------------------------------

/// 下载进度快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    pub fn new(downloaded: u64, total: Option<u64>) -> Self {
        Self { downloaded, total }
    }

    /// 总大小未知或为 0 时返回 None，不做除法
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => {
                let percent = self.downloaded as f64 / total as f64 * 100.0;
                Some(percent.clamp(0.0, 100.0))
            }
            _ => None,
        }
    }

    pub fn remaining(&self) -> Option<u64> {
        match self.total {
            Some(total) if total > 0 => Some(total.saturating_sub(self.downloaded)),
            _ => None,
        }
    }
}

/// 一次下载的结果；暂停不是错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed { bytes: u64 },
    PausedIncomplete { bytes: u64 },
}

impl DownloadOutcome {
    pub fn bytes(&self) -> u64 {
        match self {
            DownloadOutcome::Completed { bytes } | DownloadOutcome::PausedIncomplete { bytes } => {
                *bytes
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    Queued,
    Downloading,
    Paused,
    Completed,
    Failed(String),
}

// --------------------------------------------------------------------

/// 协作式暂停标志，控制端写入，下载线程在每次写入前读取
#[derive(Debug, Clone, Default)]
pub struct PauseSignal(Arc<AtomicBool>);

impl PauseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// 切换状态，返回切换后是否处于暂停
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
