use std::sync::Arc;

use futures::StreamExt;
use tokio::{
    fs::OpenOptions,
    io::{AsyncWriteExt, BufWriter},
};
use tracing::{debug, info};

use super::{
    error::DownloadError,
    models::{DownloadOutcome, DownloadTask, OverwritePolicy},
    source::{ByteSource, fixed_chunks},
};

/// 分块下载器：按固定大小逐块写入磁盘，每次写入前检查暂停标志
#[derive(Clone)]
pub struct ChunkedDownloader {
    source: Arc<dyn ByteSource>,
}

impl ChunkedDownloader {
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self { source }
    }

    /// 执行一次下载。
    ///
    /// `on_chunk(已下载字节, 总大小)` 在每块写入成功后调用；
    /// `is_paused()` 在每块写入之前调用，返回 true 时保留已写入的部分文件，
    /// 返回 `DownloadOutcome::PausedIncomplete`。
    pub async fn run_download<F, P>(
        &self,
        task: &DownloadTask,
        mut on_chunk: F,
        is_paused: P,
    ) -> Result<DownloadOutcome, DownloadError>
    where
        F: FnMut(u64, Option<u64>) + Send,
        P: Fn() -> bool + Send,
    {
        if task.chunk_size == 0 {
            return Err(DownloadError::InvalidTask("分块大小必须大于 0".to_string()));
        }
        if task.output_path.as_os_str().is_empty() {
            return Err(DownloadError::InvalidTask("目标路径为空".to_string()));
        }

        let output_path = task.get_output_path();
        if task.overwrite == OverwritePolicy::Reject
            && tokio::fs::try_exists(output_path).await?
        {
            return Err(DownloadError::AlreadyExists(output_path.to_path_buf()));
        }

        // 请求成功后才创建或截断目标文件
        let response = self.source.open(&task.url).await?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut options = OpenOptions::new();
        options.write(true);
        match task.overwrite {
            OverwritePolicy::Overwrite => options.create(true).truncate(true),
            OverwritePolicy::Reject => options.create_new(true),
        };
        let file = options.open(output_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                DownloadError::AlreadyExists(output_path.to_path_buf())
            } else {
                DownloadError::Storage(e)
            }
        })?;
        let mut writer = BufWriter::new(file);

        // 服务器没有返回长度时使用解析阶段得到的大小，两者都没有则未知
        let total = response.content_length.or(task.expected_size);
        debug!(
            "开始分块下载: {} -> {:?}, 总大小: {:?}, 分块: {}",
            task.task_id, output_path, total, task.chunk_size
        );

        let mut chunks = fixed_chunks(response.body, task.chunk_size);
        let mut downloaded = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;

            if is_paused() {
                writer.flush().await?;
                info!("⏸️ 下载已暂停: {}，已写入 {} 字节", task.task_id, downloaded);
                return Ok(DownloadOutcome::PausedIncomplete { bytes: downloaded });
            }

            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            on_chunk(downloaded, total);
        }

        writer.flush().await?;
        info!("✅ 下载完成: {}，共 {} 字节", task.task_id, downloaded);

        Ok(DownloadOutcome::Completed { bytes: downloaded })
    }
}
