use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::ResolutionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlType {
    Video(String),    // 视频ID
    Playlist(String), // 播放列表ID
}

impl UrlType {
    pub fn canonical_url(&self) -> String {
        match self {
            Self::Video(id) => format!("https://www.youtube.com/watch?v={}", id),
            Self::Playlist(id) => format!("https://www.youtube.com/playlist?list={}", id),
        }
    }

    pub fn is_playlist(&self) -> bool {
        matches!(self, Self::Playlist(_))
    }
}

impl fmt::Display for UrlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(id) => write!(f, "视频 {}", id),
            Self::Playlist(id) => write!(f, "播放列表 {}", id),
        }
    }
}

// 可选的清晰度，取值为垂直分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum VideoQuality {
    Q144P = 144,
    Q240P = 240,
    Q360P = 360,
    Q480P = 480,
    #[default]
    Q720P = 720,
    Q1080P = 1080,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 6] = [
        Self::Q144P,
        Self::Q240P,
        Self::Q360P,
        Self::Q480P,
        Self::Q720P,
        Self::Q1080P,
    ];

    pub fn height(&self) -> u32 {
        *self as u32
    }

    pub fn label(&self) -> String {
        format!("{}p", self.height())
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

impl FromStr for VideoQuality {
    type Err = ResolutionError;

    // 接受 "720p"、"720P" 或 "720"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);

        let height: u32 = digits
            .parse()
            .map_err(|_| ResolutionError::UnsupportedQuality(s.to_string()))?;

        Self::ALL
            .into_iter()
            .find(|q| q.height() == height)
            .ok_or_else(|| ResolutionError::UnsupportedQuality(s.to_string()))
    }
}

// --------------------------------------------------------

/// 解析工具返回的一种可下载格式
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub format_id: String,
    pub url: String,
    pub height: Option<u32>,
    pub progressive: bool, // 同时包含音频和视频
    pub filesize: Option<u64>,
    pub ext: String,
}

/// 选定的视频流，可以直接下载
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStream {
    pub url: String,
    pub title: String,
    pub filesize: Option<u64>,
    pub default_filename: String,
    pub height: Option<u32>,
    pub ext: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistInfo {
    pub title: String,
    pub video_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quality_labels() {
        assert_eq!("720p".parse::<VideoQuality>().unwrap(), VideoQuality::Q720P);
        assert_eq!("1080P".parse::<VideoQuality>().unwrap(), VideoQuality::Q1080P);
        assert_eq!(" 144 ".parse::<VideoQuality>().unwrap(), VideoQuality::Q144P);
        assert!("4k".parse::<VideoQuality>().is_err());
        assert!("2160p".parse::<VideoQuality>().is_err());
    }

    #[test]
    fn quality_label_round_trips_through_display() {
        for quality in VideoQuality::ALL {
            assert_eq!(quality.label().parse::<VideoQuality>().unwrap(), quality);
        }
        assert!(VideoQuality::Q1080P > VideoQuality::Q720P);
    }
}
