use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

/// 启动浏览器（无头或有界面）
///
/// `chrome_executable` 为空时由 chromiumoxide 自动查找本机的 Chrome/Edge。
pub async fn launch_browser(headless: bool, chrome_executable: Option<&str>) -> Result<Browser> {
    info!(
        "🚀 启动{}浏览器...",
        if headless { "无头" } else { "" }
    );

    let mut builder = BrowserConfig::builder().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--remote-debugging-port=0",
    ]);
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = chrome_executable {
        debug!("浏览器路径: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder.build().map_err(|reason| {
        error!("配置浏览器失败: {}", reason);
        AppError::Browser(BrowserError::ConfigurationFailed { reason })
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(browser)
}
