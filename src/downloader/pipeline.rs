use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    auth::{AuthError, CredentialPrompt, Credentials},
    common::{
        logger::PrettyLogger,
        utils::{ordinal_filename, sanitize_name},
    },
    parser::{
        errors::ResolutionError,
        models::{ResolvedStream, VideoQuality},
        resolver::StreamResolver,
        url_parser::UrlParser,
    },
};

use super::{
    controller::DownloadController,
    error::DownloadError,
    models::{DEFAULT_CHUNK_SIZE, DownloadOutcome, DownloadTask, OverwritePolicy},
    progress::TerminalProgress,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// 下载目标：自动识别，或强制按视频/播放列表处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Auto,
    Video,
    Playlist,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target: Target,
    pub quality: VideoQuality,
    pub destination_dir: PathBuf,
    pub interactive: bool,
    pub chunk_size: usize,
    pub overwrite: OverwritePolicy,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: Target::Auto,
            quality: VideoQuality::default(),
            destination_dir: PathBuf::from("."),
            interactive: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overwrite: OverwritePolicy::default(),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoReport {
    pub title: String,
    pub path: PathBuf,
    pub outcome: DownloadOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Downloaded(VideoReport),
    Failed(String),
    Skipped, // 暂停后未开始
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub index: usize, // 从 1 开始
    pub url: String,
    pub result: EntryResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistReport {
    pub title: String,
    pub directory: PathBuf,
    pub entries: Vec<PlaylistEntry>,
}

impl PlaylistReport {
    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.result, EntryResult::Downloaded(r) if r.outcome.is_complete()))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, EntryResult::Failed(_)))
            .count()
    }

    pub fn was_paused(&self) -> bool {
        self.entries.iter().any(|e| match &e.result {
            EntryResult::Downloaded(r) => !r.outcome.is_complete(),
            EntryResult::Skipped => true,
            EntryResult::Failed(_) => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineReport {
    Video(VideoReport),
    Playlist(PlaylistReport),
}

/// 解析 -> 创建目录 -> 分块下载
pub struct DownloadPipeline {
    resolver: Arc<dyn StreamResolver>,
    controller: DownloadController,
    prompt: Option<Arc<dyn CredentialPrompt>>,
    credentials: Mutex<Option<Credentials>>, // 登录成功后复用
    config: PipelineConfig,
}

impl DownloadPipeline {
    pub fn new(
        resolver: Arc<dyn StreamResolver>,
        controller: DownloadController,
        config: PipelineConfig,
    ) -> Self {
        Self {
            resolver,
            controller,
            prompt: None,
            credentials: Mutex::new(None),
            config,
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn CredentialPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn controller(&self) -> &DownloadController {
        &self.controller
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, url: &str) -> Result<PipelineReport, PipelineError> {
        // 新的会话，清除上一次留下的暂停
        self.controller.resume();

        let is_playlist = match self.config.target {
            Target::Video => false,
            Target::Playlist => true,
            Target::Auto => {
                let url_type = UrlParser::parse(url)?;
                debug!("链接类型: {}", url_type);
                url_type.is_playlist()
            }
        };

        if is_playlist {
            let report = self.download_playlist(url).await?;
            Ok(PipelineReport::Playlist(report))
        } else {
            let report = self.download_video(url).await?;
            Ok(PipelineReport::Video(report))
        }
    }

    /// 下载单个视频到目标目录，文件名使用解析得到的默认名称
    pub async fn download_video(&self, url: &str) -> Result<VideoReport, PipelineError> {
        let resolved = self.resolve_with_recovery(url).await?;
        let dir = self.config.destination_dir.clone();
        create_dir(&dir).await?;

        let path = dir.join(&resolved.default_filename);
        self.download_resolved(&resolved, path).await
    }

    /// 按顺序下载播放列表中的所有视频；单个视频失败不影响其余视频
    pub async fn download_playlist(&self, url: &str) -> Result<PlaylistReport, PipelineError> {
        let playlist = self.resolver.resolve_playlist(url).await?;
        PrettyLogger::playlist_info(&playlist.title, playlist.video_urls.len());

        let mut name = sanitize_name(&playlist.title);
        if name.is_empty() {
            name = "playlist".to_string();
        }
        let directory = self.config.destination_dir.join(name);
        create_dir(&directory).await?;
        info!("播放列表目录: {:?}", directory);

        let count = playlist.video_urls.len();
        let mut entries = Vec::with_capacity(count);
        let mut stopped = false;

        for (i, video_url) in playlist.video_urls.into_iter().enumerate() {
            let index = i + 1;

            if stopped || self.controller.is_paused() {
                stopped = true;
                entries.push(PlaylistEntry {
                    index,
                    url: video_url,
                    result: EntryResult::Skipped,
                });
                continue;
            }

            let result = match self.download_member(&video_url, &directory, index, count).await {
                Ok(report) => {
                    if !report.outcome.is_complete() {
                        warn!("下载已暂停，跳过剩余的 {} 个视频", count - index);
                        stopped = true;
                    }
                    EntryResult::Downloaded(report)
                }
                Err(e) => {
                    error!("第 {} 个视频下载失败: {}, 错误: {}", index, video_url, e);
                    EntryResult::Failed(e.to_string())
                }
            };

            entries.push(PlaylistEntry {
                index,
                url: video_url,
                result,
            });
        }

        Ok(PlaylistReport {
            title: playlist.title,
            directory,
            entries,
        })
    }

    async fn download_member(
        &self,
        url: &str,
        directory: &Path,
        index: usize,
        count: usize,
    ) -> Result<VideoReport, PipelineError> {
        let resolved = self.resolve_with_recovery(url).await?;
        let filename = ordinal_filename(index, count, &resolved.title, &resolved.ext);
        self.download_resolved(&resolved, directory.join(filename))
            .await
    }

    async fn download_resolved(
        &self,
        resolved: &ResolvedStream,
        path: PathBuf,
    ) -> Result<VideoReport, PipelineError> {
        let quality = resolved
            .height
            .map(|h| format!("{}p", h))
            .unwrap_or_else(|| "未知清晰度".to_string());
        PrettyLogger::video_info(&resolved.title, quality);

        let task = DownloadTask::new(&resolved.url, &path)
            .with_title(&resolved.title)
            .with_expected_size(resolved.filesize)
            .with_chunk_size(self.config.chunk_size)
            .with_overwrite(self.config.overwrite);

        let progress = self
            .config
            .show_progress
            .then(|| TerminalProgress::attach(self.controller.subscribe(), &resolved.title));

        let result = self.controller.run(task).await;

        if let Some(progress) = progress {
            let message = match &result {
                Ok(DownloadOutcome::Completed { .. }) => "下载完成",
                Ok(DownloadOutcome::PausedIncomplete { .. }) => "已暂停",
                Err(_) => "下载失败",
            };
            progress.finish(message);
        }

        let outcome = result?;
        Ok(VideoReport {
            title: resolved.title.clone(),
            path,
            outcome,
        })
    }

    /// 解析视频；遇到年龄限制且处于交互模式时询问登录信息并重试一次
    async fn resolve_with_recovery(&self, url: &str) -> Result<ResolvedStream, PipelineError> {
        let quality = self.config.quality;
        let err = match self.resolver.resolve_video(url, quality, None).await {
            Ok(resolved) => return Ok(resolved),
            Err(e) => e,
        };

        let prompt = match &self.prompt {
            Some(prompt) if err.needs_login() && self.config.interactive => prompt,
            _ => return Err(err.into()),
        };
        warn!("{}", err);

        let cached = self
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let credentials = match cached {
            Some(credentials) => credentials,
            None => prompt.prompt(url).await?,
        };

        info!("使用账号 {} 重新解析", credentials.username);
        let resolved = self
            .resolver
            .resolve_video(url, quality, Some(&credentials))
            .await?;

        *self
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credentials);
        Ok(resolved)
    }
}

async fn create_dir(dir: &Path) -> Result<(), DownloadError> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}
