use clap::Parser;
use std::path::PathBuf;

use crate::{
    downloader::{
        models::{DEFAULT_CHUNK_SIZE, OverwritePolicy},
        pipeline::{PipelineConfig, Target},
    },
    parser::models::VideoQuality,
};

/// 视频/播放列表下载器
#[derive(Parser, Debug)]
#[command(name = "tubedl")]
#[command(version = "1.0")]
#[command(about = "一个简单的视频/播放列表下载工具", long_about = None)]
pub struct Cli {
    /// 视频或播放列表链接 (交互模式下可省略)
    #[arg(long, value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// 视频保存目录
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// 视频质量
    #[arg(long, value_name = "QUALITY")]
    #[arg(help = "视频质量: 144p, 240p, 360p, 480p, 720p, 1080p (默认 720p)")]
    pub quality: Option<VideoQuality>,

    /// 按播放列表下载 (默认根据链接自动判断)
    #[arg(long)]
    pub playlist: bool,

    /// 交互模式：缺少的参数从终端读取，可以暂停下载
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// 每次写入的块大小 (字节)
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    #[arg(value_parser = clap::value_parser!(usize))]
    pub chunk_size: usize,

    /// 目标文件已存在时报错而不是覆盖
    #[arg(long)]
    pub no_overwrite: bool,

    /// yt-dlp 可执行文件路径
    #[arg(long = "yt-dlp", value_name = "PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// 输出调试日志
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// 转换为下载配置；缺少的目录和清晰度使用默认值
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            target: if self.playlist {
                Target::Playlist
            } else {
                Target::Auto
            },
            quality: self.quality.unwrap_or_default(),
            destination_dir: self
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            interactive: self.interactive,
            chunk_size: self.chunk_size,
            overwrite: if self.no_overwrite {
                OverwritePolicy::Reject
            } else {
                OverwritePolicy::Overwrite
            },
            show_progress: true,
        }
    }
}
