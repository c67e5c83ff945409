use async_trait::async_trait;

use crate::auth::Credentials;

use super::errors::ResolutionError;
use super::models::{PlaylistInfo, ResolvedStream, VideoQuality};

/// 外部解析服务：把视频/播放列表链接解析成可直接下载的地址
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve_video(
        &self,
        url: &str,
        quality: VideoQuality,
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedStream, ResolutionError>;

    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo, ResolutionError>;
}
