use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("视频不可用: {0}")]
    Unavailable(String),

    #[error("视频有年龄限制或需要登录: {0}")]
    AgeRestricted(String),

    #[error("没有可下载的视频流")]
    NoStreams,

    #[error("不支持的清晰度: {0}")]
    UnsupportedQuality(String),

    #[error("未找到解析工具: {0}")]
    ToolMissing(String),

    #[error("解析工具出错: {0}")]
    Tool(String),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ResolutionError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

impl ResolutionError {
    // 需要登录后重试的错误
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::AgeRestricted(_))
    }
}
