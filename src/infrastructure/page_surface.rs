//! 页面能力抽象 - 基础设施层
//!
//! 上层只依赖"导航 + 执行脚本返回字符串"这一最小契约，
//! 不依赖具体的浏览器实现。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::js_executor::JsExecutor;

/// 可导航、可执行脚本的页面
///
/// 同一个页面上的调用不会重叠：调用方等待上一次返回后才发起下一次。
#[async_trait]
pub trait PageSurface: Send + Sync {
    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> AppResult<()>;

    /// 执行脚本并返回字符串结果
    async fn evaluate(&self, script: &str) -> AppResult<String>;
}

/// 页面提供者
///
/// 每个并发槽位拿到属于自己的页面，同一槽位多次获取返回同一页面。
#[async_trait]
pub trait SurfaceProvider: Send + Sync {
    async fn acquire(&self, slot: usize) -> AppResult<Arc<dyn PageSurface>>;
}

/// 基于 chromiumoxide 的页面提供者
pub struct ChromiumSurfaceProvider {
    browser: Browser,
    pages: Mutex<HashMap<usize, Arc<JsExecutor>>>,
}

impl ChromiumSurfaceProvider {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// 槽位 0 复用已经打开的页面
    pub fn with_initial_page(browser: Browser, page: Page) -> Self {
        let mut pages = HashMap::new();
        pages.insert(0, Arc::new(JsExecutor::new(page)));
        Self {
            browser,
            pages: Mutex::new(pages),
        }
    }
}

#[async_trait]
impl SurfaceProvider for ChromiumSurfaceProvider {
    async fn acquire(&self, slot: usize) -> AppResult<Arc<dyn PageSurface>> {
        let mut pages = self.pages.lock().await;
        if let Some(executor) = pages.get(&slot) {
            let surface: Arc<dyn PageSurface> = executor.clone();
            return Ok(surface);
        }

        debug!("为槽位 {} 创建新页面", slot);
        let page = self.browser.new_page("about:blank").await.map_err(|e| {
            AppError::Browser(BrowserError::PageCreationFailed {
                source: Box::new(e),
            })
        })?;

        let executor = Arc::new(JsExecutor::new(page));
        pages.insert(slot, executor.clone());
        let surface: Arc<dyn PageSurface> = executor;
        Ok(surface)
    }
}
