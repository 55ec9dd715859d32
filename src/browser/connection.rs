use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::AppError;

/// 连接到已开启远程调试的浏览器并获取页面
///
/// 优先复用 URL 包含 `target_url` 的已打开页面，否则新建空白页面。
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await.context("获取页面列表失败")?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(target) = target_url {
        for p in pages.iter() {
            if let Ok(Some(url)) = p.url().await {
                if url.contains(target) {
                    info!("✓ 找到已打开的问卷页面: {}", url);
                    return Ok((browser, p.clone()));
                }
            }
        }
        debug!("未找到匹配的页面，将创建新页面");
    }

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        e
    })?;

    Ok((browser, page))
}
