use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::errors::ResolutionError;
use super::models::UrlType;

lazy_static! {
    static ref LIST_PATTERN: Regex = Regex::new(r"[?&]list=([0-9A-Za-z_-]+)").unwrap();
    static ref VIDEO_PATTERN: Regex =
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})(?:[^0-9A-Za-z_-]|$)").unwrap();
    static ref RAW_VIDEO_ID: Regex = Regex::new(r"^[0-9A-Za-z_-]{11}$").unwrap();
    static ref RAW_PLAYLIST_ID: Regex =
        Regex::new(r"^(?:PL|UU|LL|FL|OL|RD)[0-9A-Za-z_-]{10,}$").unwrap();
}

/// 区分视频链接和播放列表链接
pub struct UrlParser;

impl UrlParser {
    pub fn parse(input: &str) -> Result<UrlType, ResolutionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResolutionError::InvalidUrl("链接为空".to_string()));
        }

        // 不是URL时按裸ID处理
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(_) => return Self::handle_raw_id(input),
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ResolutionError::InvalidUrl(input.to_string()));
        }

        // 播放列表页面优先
        if url.path().contains("playlist") {
            if let Some(caps) = LIST_PATTERN.captures(input) {
                return Ok(UrlType::Playlist(caps[1].to_string()));
            }
        }

        if let Some(caps) = VIDEO_PATTERN.captures(input) {
            return Ok(UrlType::Video(caps[1].to_string()));
        }

        if let Some(caps) = LIST_PATTERN.captures(input) {
            return Ok(UrlType::Playlist(caps[1].to_string()));
        }

        Err(ResolutionError::InvalidUrl(input.to_string()))
    }

    fn handle_raw_id(id: &str) -> Result<UrlType, ResolutionError> {
        if RAW_PLAYLIST_ID.is_match(id) {
            Ok(UrlType::Playlist(id.to_string()))
        } else if RAW_VIDEO_ID.is_match(id) {
            Ok(UrlType::Video(id.to_string()))
        } else {
            Err(ResolutionError::InvalidUrl(id.to_string()))
        }
    }
}
