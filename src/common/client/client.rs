use std::time::Duration;

use reqwest::{
    Client, ClientBuilder, Response,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::{debug, warn};

use crate::downloader::error::DownloadError;

// 只限制建连时间；响应体读取不设超时，卡住的连接会一直等待
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

// 下载媒体文件使用的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct TubeClient {
    pub inner: Client,
}

impl TubeClient {
    pub fn new() -> Result<Self, DownloadError> {
        let inner = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(Self::get_default_headers())
            .build()?;

        Ok(Self { inner })
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    // 以流的方式请求媒体文件
    pub async fn get_stream_response(&self, url: &str) -> Result<Response, DownloadError> {
        debug!("🎬 正在请求: {}", url);

        let resp = self.inner.get(url).send().await?;
        Self::check_response_status(&resp, url)?;

        Ok(resp)
    }

    // 读取响应头中的 Content-Length，缺失或无法解析时返回 None
    pub fn content_length(response: &Response) -> Option<u64> {
        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|ct_len| ct_len.to_str().ok())
            .and_then(|ct_len| ct_len.parse().ok())
    }

    fn check_response_status(response: &Response, url: &str) -> Result<(), DownloadError> {
        let status = response.status();
        debug!("Response Status: {}", status);

        match status {
            reqwest::StatusCode::FORBIDDEN => {
                warn!("🚫 403 Forbidden，下载地址可能已过期");
                Err(DownloadError::Transport(format!(
                    "访问被拒绝 (403 Forbidden)，URL: {}",
                    url
                )))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                warn!("⚠️ 429 Too Many Requests，请求过于频繁");
                Err(DownloadError::Transport(format!(
                    "请求过于频繁 (429 Too Many Requests)，URL: {}",
                    url
                )))
            }
            status if status.is_success() => Ok(()),
            _ => {
                warn!("❌ 非成功状态码: {}", status);
                Err(DownloadError::Transport(format!(
                    "HTTP 请求失败，状态码: {}，URL: {}",
                    status, url
                )))
            }
        }
    }
}
