use std::{
    path::{Component, Path, PathBuf},
    sync::{Arc, Mutex},
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info};

use super::{
    core::ChunkedDownloader,
    error::DownloadError,
    models::{DownloadOutcome, DownloadProgress, DownloadTask, PauseSignal, TaskStatus},
};

/// 下载控制器：持有暂停标志、进度和任务状态，同时注入到界面层和下载线程。
///
/// 每个活动下载只有一个后台任务；进度通过 watch 通道发送给界面，
/// 下载线程不直接修改界面状态。
#[derive(Clone)]
pub struct DownloadController {
    downloader: ChunkedDownloader,
    pause: PauseSignal,
    progress_tx: Arc<watch::Sender<DownloadProgress>>,
    status: Arc<Mutex<TaskStatus>>,
    active: Arc<DashMap<PathBuf, String>>, // 正在写入的目标路径 -> task_id
}

// 任务结束（包括 panic）时释放目标路径
struct ActiveGuard {
    active: Arc<DashMap<PathBuf, String>>,
    path: PathBuf,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.remove(&self.path);
    }
}

impl DownloadController {
    pub fn new(downloader: ChunkedDownloader) -> Self {
        let (progress_tx, _) = watch::channel(DownloadProgress::default());
        Self {
            downloader,
            pause: PauseSignal::new(),
            progress_tx: Arc::new(progress_tx),
            status: Arc::new(Mutex::new(TaskStatus::Idle)),
            active: Arc::new(DashMap::new()),
        }
    }

    pub fn pause_signal(&self) -> PauseSignal {
        self.pause.clone()
    }

    pub fn pause(&self) {
        self.pause.pause();
    }

    /// 只清除暂停标志，已经停止的下载不会继续
    pub fn resume(&self) {
        self.pause.resume();
    }

    pub fn toggle_pause(&self) -> bool {
        self.pause.toggle()
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadProgress> {
        self.progress_tx.subscribe()
    }

    pub fn progress(&self) -> DownloadProgress {
        *self.progress_tx.borrow()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_status(status: &Mutex<TaskStatus>, value: TaskStatus) {
        *status.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }

    /// 启动后台下载任务。同一路径已有任务在写入时返回 `DestinationBusy`。
    pub fn start(
        &self,
        task: DownloadTask,
    ) -> Result<JoinHandle<Result<DownloadOutcome, DownloadError>>, DownloadError> {
        let path = destination_key(&task.output_path);
        match self.active.entry(path.clone()) {
            Entry::Occupied(_) => {
                return Err(DownloadError::DestinationBusy(task.output_path.clone()));
            }
            Entry::Vacant(entry) => {
                entry.insert(task.task_id.clone());
            }
        }
        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            path,
        };

        // 新任务进度归零；暂停标志由调用方管理
        self.progress_tx
            .send_replace(DownloadProgress::new(0, task.expected_size));
        Self::set_status(&self.status, TaskStatus::Queued);

        let downloader = self.downloader.clone();
        let pause = self.pause.clone();
        let progress_tx = Arc::clone(&self.progress_tx);
        let status = Arc::clone(&self.status);

        debug!("启动下载任务: {} -> {:?}", task.task_id, task.output_path);

        Ok(tokio::spawn(async move {
            let _guard = guard;
            Self::set_status(&status, TaskStatus::Downloading);
            let result = downloader
                .run_download(
                    &task,
                    |downloaded, total| {
                        progress_tx.send_replace(DownloadProgress::new(downloaded, total));
                    },
                    || pause.is_paused(),
                )
                .await;

            match &result {
                Ok(DownloadOutcome::Completed { .. }) => {
                    Self::set_status(&status, TaskStatus::Completed);
                }
                Ok(DownloadOutcome::PausedIncomplete { bytes }) => {
                    info!("任务 {} 已暂停，部分文件保留 ({} 字节)", task.task_id, bytes);
                    Self::set_status(&status, TaskStatus::Paused);
                }
                Err(e) => {
                    error!("❌ 下载任务失败: {}, 错误: {}", task.task_id, e);
                    Self::set_status(&status, TaskStatus::Failed(e.to_string()));
                }
            }

            result
        }))
    }

    /// 启动并等待下载结束
    pub async fn run(&self, task: DownloadTask) -> Result<DownloadOutcome, DownloadError> {
        let handle = self.start(task)?;
        handle.await?
    }
}

// 同一个文件的不同写法（如 `dir/./a.mp4`）映射到同一个键
fn destination_key(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return path.to_path_buf(),
    };

    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(parent), Some(name)) => parent.join(name),
        // 目录还不存在时只去掉 `.`
        _ => path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect(),
    }
}
