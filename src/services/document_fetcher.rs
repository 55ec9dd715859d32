//! 问卷页面获取 - 业务能力层
//!
//! 用普通 HTTP 请求拉取问卷页面 HTML，供结构解析使用。

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::debug;

use crate::error::{AppError, AppResult, FetchError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 问卷页面获取器
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    pub fn new() -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::fetch_failed("<client>", e))?;

        Ok(Self { client })
    }

    /// 获取页面 HTML
    pub async fn fetch(&self, url: &str) -> AppResult<String> {
        debug!("正在获取问卷页面: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        // 空页面交给解析器，得到空题目列表
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch_failed(url, e))?;

        debug!("页面获取成功，{} 字节", body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 本地起一个只响应一次的 HTTP 服务，返回其地址
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/vm/test.aspx", addr)
    }

    #[tokio::test]
    async fn test_empty_body_is_not_an_error() {
        let url =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;

        let body = DocumentFetcher::new().unwrap().fetch(&url).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_bad_status() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let result = DocumentFetcher::new().unwrap().fetch(&url).await;
        assert!(matches!(
            result,
            Err(AppError::Fetch(FetchError::BadStatus { status: 404, .. }))
        ));
    }
}
