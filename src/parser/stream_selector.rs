use tracing::{debug, warn};

use super::errors::ResolutionError;
use super::models::{StreamInfo, VideoQuality};

/// 选择要下载的视频流。
///
/// 优先选择目标清晰度的音视频合一流；没有时退回到最高清晰度的合一流；
/// 完全没有合一流时选择清晰度最高的任意流。
pub fn select_stream(
    streams: &[StreamInfo],
    quality: VideoQuality,
) -> Result<&StreamInfo, ResolutionError> {
    if streams.is_empty() {
        return Err(ResolutionError::NoStreams);
    }

    debug!("可用的视频流数量: {}", streams.len());
    let target = quality.height();

    let progressive: Vec<&StreamInfo> = streams.iter().filter(|s| s.progressive).collect();

    // 精确匹配，同清晰度时选文件更大的
    if let Some(stream) = progressive
        .iter()
        .copied()
        .filter(|s| s.height == Some(target))
        .max_by_key(|s| s.filesize.unwrap_or(0))
    {
        debug!("找到精确匹配的清晰度: {} ({})", target, stream.format_id);
        return Ok(stream);
    }

    if let Some(stream) = highest(&progressive) {
        warn!(
            "没有 {} 的视频流，降级到最高可用清晰度: {:?}",
            quality, stream.height
        );
        return Ok(stream);
    }

    let all: Vec<&StreamInfo> = streams.iter().collect();
    let stream = highest(&all).ok_or(ResolutionError::NoStreams)?;
    warn!("没有音视频合一的流，选择: {} ({:?})", stream.format_id, stream.height);
    Ok(stream)
}

// 清晰度最高的流；同清晰度时取靠后的（解析工具按质量升序排列）
fn highest<'a>(streams: &[&'a StreamInfo]) -> Option<&'a StreamInfo> {
    streams
        .iter()
        .copied()
        .max_by_key(|s| (s.height.unwrap_or(0), s.filesize.unwrap_or(0)))
}
