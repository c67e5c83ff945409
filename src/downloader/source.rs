use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};

use crate::common::client::client::TubeClient;

use super::error::DownloadError;

pub type ChunkStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// 流式响应：声明的长度（可能没有）加上响应体
pub struct ByteResponse {
    pub content_length: Option<u64>,
    pub body: ChunkStream,
}

/// 能以流的方式读取远程资源的客户端
#[async_trait]
pub trait ByteSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<ByteResponse, DownloadError>;
}

#[async_trait]
impl ByteSource for TubeClient {
    async fn open(&self, url: &str) -> Result<ByteResponse, DownloadError> {
        let response = self.get_stream_response(url).await?;
        let content_length = TubeClient::content_length(&response);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DownloadError::from))
            .boxed();

        Ok(ByteResponse {
            content_length,
            body,
        })
    }
}

struct ChunkState {
    inner: ChunkStream,
    buffer: BytesMut,
    finished: bool,
}

/// 把任意大小的数据块重新切分成固定大小，最后一块可能更短
pub fn fixed_chunks(inner: ChunkStream, chunk_size: usize) -> ChunkStream {
    let state = ChunkState {
        inner,
        buffer: BytesMut::with_capacity(chunk_size),
        finished: false,
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            if state.buffer.len() >= chunk_size {
                let chunk = state.buffer.split_to(chunk_size).freeze();
                return Some((Ok(chunk), state));
            }

            if state.finished {
                if state.buffer.is_empty() {
                    return None;
                }
                let rest = state.buffer.split().freeze();
                return Some((Ok(rest), state));
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    // 出错后丢弃缓冲区，流随之结束
                    state.finished = true;
                    state.buffer.clear();
                    return Some((Err(e), state));
                }
                None => state.finished = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(parts: Vec<&'static [u8]>) -> ChunkStream {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p)))).boxed()
    }

    #[tokio::test]
    async fn rechunks_to_fixed_size() {
        let chunks: Vec<_> = fixed_chunks(stream_of(vec![b"abcde", b"fg", b"hijklmn"]), 4)
            .collect()
            .await;

        let lens: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(lens, vec![4, 4, 4, 2]);

        let joined: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(joined, b"abcdefghijklmn");
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        let chunks: Vec<_> = fixed_chunks(stream_of(vec![]), 1024).collect().await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let inner = stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(DownloadError::Transport("connection reset".to_string())),
            Ok(Bytes::from_static(b"cd")),
        ])
        .boxed();

        let chunks: Vec<_> = fixed_chunks(inner, 4).collect().await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], Err(DownloadError::Transport(_))));
    }
}
