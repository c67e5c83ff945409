use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{auth::Credentials, common::utils::sanitize_name};

use super::{
    errors::ResolutionError,
    models::{PlaylistInfo, ResolvedStream, StreamInfo, VideoQuality},
    resolver::StreamResolver,
    stream_selector::select_stream,
};

#[derive(Debug, Deserialize)]
pub struct YtDlpVideo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
pub struct YtDlpFormat {
    pub format_id: String,
    pub url: Option<String>,
    pub height: Option<u32>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    // 有时是浮点数
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
    pub ext: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YtDlpPlaylist {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<YtDlpEntry>,
}

#[derive(Debug, Deserialize)]
pub struct YtDlpEntry {
    pub id: Option<String>,
    pub url: Option<String>,
}

impl YtDlpFormat {
    fn has_codec(codec: &Option<String>) -> bool {
        codec.as_deref().is_some_and(|c| c != "none")
    }

    // 只保留可以直接用 HTTP 拉取的格式
    fn into_stream(self) -> Option<StreamInfo> {
        let direct = matches!(self.protocol.as_deref(), None | Some("http") | Some("https"));
        let url = self.url.filter(|_| direct)?;

        let progressive = Self::has_codec(&self.vcodec) && Self::has_codec(&self.acodec);
        let filesize = self
            .filesize
            .or(self.filesize_approx)
            .filter(|size| *size > 0.0)
            .map(|size| size as u64);

        Some(StreamInfo {
            format_id: self.format_id,
            url,
            height: self.height,
            progressive,
            filesize,
            ext: self.ext.unwrap_or_else(|| "mp4".to_string()),
        })
    }
}

impl YtDlpVideo {
    /// 按清晰度策略选出要下载的流
    pub fn into_resolved(self, quality: VideoQuality) -> Result<ResolvedStream, ResolutionError> {
        let title = self.title.unwrap_or_else(|| self.id.clone());
        let streams: Vec<StreamInfo> = self
            .formats
            .into_iter()
            .filter_map(YtDlpFormat::into_stream)
            .collect();

        let stream = select_stream(&streams, quality)?;

        let base = sanitize_name(&title);
        let base = if base.is_empty() { sanitize_name(&self.id) } else { base };

        Ok(ResolvedStream {
            url: stream.url.clone(),
            default_filename: format!("{}.{}", base, stream.ext),
            title,
            filesize: stream.filesize,
            height: stream.height,
            ext: stream.ext.clone(),
        })
    }
}

impl YtDlpPlaylist {
    pub fn into_info(self) -> PlaylistInfo {
        let video_urls = self
            .entries
            .into_iter()
            .filter_map(|entry| match (entry.url, entry.id) {
                (Some(url), _) if url.starts_with("http") => Some(url),
                (_, Some(id)) => Some(format!("https://www.youtube.com/watch?v={}", id)),
                (Some(url), None) => Some(format!("https://www.youtube.com/watch?v={}", url)),
                (None, None) => None,
            })
            .collect();

        PlaylistInfo {
            title: self.title.unwrap_or_else(|| "playlist".to_string()),
            video_urls,
        }
    }
}

/// 根据 yt-dlp 的错误输出判断错误类型
pub fn classify_stderr(stderr: &str) -> ResolutionError {
    let lower = stderr.to_lowercase();
    let message = stderr
        .lines()
        .rev()
        .find(|line| line.contains("ERROR"))
        .unwrap_or(stderr)
        .trim()
        .to_string();

    if lower.contains("confirm your age")
        || lower.contains("age-restricted")
        || lower.contains("age restricted")
        || lower.contains("inappropriate for some users")
        || lower.contains("sign in to confirm")
        || lower.contains("login required")
    {
        ResolutionError::AgeRestricted(message)
    } else if lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("has been removed")
        || lower.contains("does not exist")
    {
        ResolutionError::Unavailable(message)
    } else if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        ResolutionError::InvalidUrl(message)
    } else {
        ResolutionError::Tool(message)
    }
}

/// 通过 yt-dlp 可执行文件解析视频
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlpResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn dump_json(
        &self,
        url: &str,
        extra: &[&str],
        credentials: Option<&Credentials>,
    ) -> Result<Vec<u8>, ResolutionError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .args(extra);

        if let Some(credentials) = credentials {
            command
                .arg("--username")
                .arg(&credentials.username)
                .arg("--password")
                .arg(&credentials.password);
        }
        command.arg("--").arg(url);

        debug!("执行解析命令: {:?} {}", self.program, url);

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResolutionError::ToolMissing(self.program.display().to_string())
            } else {
                ResolutionError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("解析失败: {}", stderr);
            return Err(classify_stderr(&stderr));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    async fn resolve_video(
        &self,
        url: &str,
        quality: VideoQuality,
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedStream, ResolutionError> {
        let stdout = self.dump_json(url, &["--no-playlist"], credentials).await?;
        let video: YtDlpVideo = serde_json::from_slice(&stdout)?;

        let resolved = video.into_resolved(quality)?;
        info!(
            "解析完成: << {} >> ({}p)",
            resolved.title,
            resolved.height.unwrap_or(0)
        );
        Ok(resolved)
    }

    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo, ResolutionError> {
        let stdout = self
            .dump_json(url, &["--flat-playlist", "--yes-playlist"], None)
            .await?;
        let playlist: YtDlpPlaylist = serde_json::from_slice(&stdout)?;

        let info = playlist.into_info();
        info!("播放列表: << {} >>，共 {} 个视频", info.title, info.video_urls.len());
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_JSON: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Never Gonna: Give You Up!",
        "formats": [
            {"format_id": "18", "url": "https://cdn/18", "height": 360, "vcodec": "avc1", "acodec": "mp4a", "filesize": 1000, "ext": "mp4", "protocol": "https"},
            {"format_id": "22", "url": "https://cdn/22", "height": 720, "vcodec": "avc1", "acodec": "mp4a", "filesize_approx": 5000.5, "ext": "mp4", "protocol": "https"},
            {"format_id": "137", "url": "https://cdn/137", "height": 1080, "vcodec": "avc1", "acodec": "none", "ext": "mp4", "protocol": "https"},
            {"format_id": "hls-1080", "url": "https://cdn/hls", "height": 1080, "vcodec": "avc1", "acodec": "mp4a", "ext": "mp4", "protocol": "m3u8_native"},
            {"format_id": "sb0", "height": 90, "vcodec": "none", "acodec": "none", "ext": "mhtml", "protocol": "mhtml"}
        ]
    }"#;

    #[test]
    fn resolves_exact_quality() {
        let video: YtDlpVideo = serde_json::from_str(VIDEO_JSON).unwrap();
        let resolved = video.into_resolved(VideoQuality::Q360P).unwrap();

        assert_eq!(resolved.url, "https://cdn/18");
        assert_eq!(resolved.filesize, Some(1000));
        assert_eq!(resolved.default_filename, "Never-Gonna-Give-You-Up.mp4");
    }

    #[test]
    fn skips_non_direct_formats_when_falling_back() {
        let video: YtDlpVideo = serde_json::from_str(VIDEO_JSON).unwrap();
        let resolved = video.into_resolved(VideoQuality::Q1080P).unwrap();

        // hls 的 1080p 不能分块直接下载
        assert_eq!(resolved.url, "https://cdn/22");
        assert_eq!(resolved.height, Some(720));
        assert_eq!(resolved.filesize, Some(5000));
    }

    #[test]
    fn no_formats_is_no_streams() {
        let video: YtDlpVideo = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert!(matches!(
            video.into_resolved(VideoQuality::Q720P),
            Err(ResolutionError::NoStreams)
        ));
    }

    #[test]
    fn playlist_entries_keep_order() {
        let json = r#"{
            "title": "My Playlist: Part 1!",
            "entries": [
                {"id": "aaaaaaaaaaa", "url": "https://www.youtube.com/watch?v=aaaaaaaaaaa"},
                {"id": "bbbbbbbbbbb", "url": "bbbbbbbbbbb"},
                {"id": "ccccccccccc"}
            ]
        }"#;
        let info = serde_json::from_str::<YtDlpPlaylist>(json).unwrap().into_info();

        assert_eq!(info.title, "My Playlist: Part 1!");
        assert_eq!(
            info.video_urls,
            vec![
                "https://www.youtube.com/watch?v=aaaaaaaaaaa",
                "https://www.youtube.com/watch?v=bbbbbbbbbbb",
                "https://www.youtube.com/watch?v=ccccccccccc",
            ]
        );
    }

    #[test]
    fn classifies_tool_errors() {
        assert!(matches!(
            classify_stderr("ERROR: [youtube] xyz: Sign in to confirm your age. This video may be inappropriate for some users."),
            ResolutionError::AgeRestricted(_)
        ));
        assert!(matches!(
            classify_stderr("ERROR: [youtube] xyz: Video unavailable"),
            ResolutionError::Unavailable(_)
        ));
        assert!(matches!(
            classify_stderr("ERROR: Unsupported URL: https://example.com"),
            ResolutionError::InvalidUrl(_)
        ));
        assert!(matches!(
            classify_stderr("ERROR: unable to download webpage: HTTP Error 500"),
            ResolutionError::Tool(_)
        ));
    }

    #[tokio::test]
    async fn missing_executable_is_reported() {
        let resolver = YtDlpResolver::new("/nonexistent/yt-dlp-binary");
        let result = resolver
            .resolve_video("https://youtu.be/dQw4w9WgXcQ", VideoQuality::Q720P, None)
            .await;

        assert!(matches!(result, Err(ResolutionError::ToolMissing(_))));
    }
}
